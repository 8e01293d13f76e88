//! `SQLite` storage implementation.
//!
//! Provides the index database: documents, chunks and their embeddings,
//! with read-only access for the chat pipeline and transactional writes for
//! the index builder.

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative values that fit in usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

use crate::core::chunk::current_timestamp;
use crate::core::{Chunk, Document};
use crate::error::{Result, StorageError};
use crate::storage::schema::{
    CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, EMBEDDED_CHUNKS_SQL, GET_VERSION_SQL, SCHEMA_SQL,
    SET_VERSION_SQL,
};
use crate::storage::traits::{Storage, StorageStats};
use rusqlite::{Connection, OpenFlags, OptionalExtension, params};
use std::path::{Path, PathBuf};

/// A stored chunk joined with its document name and embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedChunk {
    /// Chunk ID.
    pub chunk_id: i64,
    /// Chunk text.
    pub content: String,
    /// Name of the owning document.
    pub source: Option<String>,
    /// Stored embedding vector.
    pub embedding: Vec<f32>,
}

/// SQLite-based index storage.
///
/// # Examples
///
/// ```no_run
/// use transcript_qa::storage::{SqliteStorage, Storage};
///
/// let storage = SqliteStorage::open_read_only(".transcript-qa/index/index.db").unwrap();
/// assert!(storage.is_initialized().unwrap());
/// ```
pub struct SqliteStorage {
    /// `SQLite` connection.
    conn: Connection,
    /// Path to the database file (None for in-memory).
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens or creates a writable `SQLite` database at the given path.
    ///
    /// Creates the parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;

        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        // journal_mode returns a row, so it goes through query_row
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Opens an existing database for reading only.
    ///
    /// Never creates the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be opened.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if !path.is_file() {
            return Err(StorageError::Database(format!(
                "index database not found: {}",
                path.display()
            ))
            .into());
        }

        let conn = Connection::open_with_flags(&path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// Useful for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Gets the recorded schema version.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn schema_version(&self) -> Result<Option<u32>> {
        let version: Option<String> = self
            .conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        Ok(version.and_then(|v| v.parse().ok()))
    }

    /// Fails unless the database has a schema this build can read.
    ///
    /// # Errors
    ///
    /// Returns `NotInitialized` for a database without schema and
    /// `UnsupportedSchema` for one written by a newer version.
    pub fn ensure_readable(&self) -> Result<()> {
        if !self.is_initialized()? {
            return Err(StorageError::NotInitialized {
                path: self
                    .path
                    .as_ref()
                    .map_or_else(|| ":memory:".to_string(), |p| p.display().to_string()),
            }
            .into());
        }

        if let Some(found) = self.schema_version()?
            && found > CURRENT_SCHEMA_VERSION
        {
            return Err(StorageError::UnsupportedSchema {
                found,
                supported: CURRENT_SCHEMA_VERSION,
            }
            .into());
        }

        Ok(())
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute(SET_VERSION_SQL, params![version.to_string()])
            .map_err(StorageError::from)?;
        Ok(())
    }
}

fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

impl Storage for SqliteStorage {
    fn init(&mut self) -> Result<()> {
        if self.is_initialized()? {
            return self.ensure_readable();
        }

        self.conn
            .execute_batch(SCHEMA_SQL)
            .map_err(StorageError::from)?;
        self.set_schema_version(CURRENT_SCHEMA_VERSION)
    }

    fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    // ==================== Document Operations ====================

    fn add_document(&mut self, document: &Document) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO documents (name, source_path, created_at) VALUES (?, ?, ?)",
                params![
                    document.name,
                    document
                        .source_path
                        .as_ref()
                        .map(|p| p.to_string_lossy().to_string()),
                    document.created_at,
                ],
            )
            .map_err(StorageError::from)?;

        Ok(self.conn.last_insert_rowid())
    }

    fn get_document(&self, id: i64) -> Result<Option<Document>> {
        let result = self
            .conn
            .query_row(
                "SELECT id, name, source_path, created_at FROM documents WHERE id = ?",
                params![id],
                |row| {
                    Ok(Document {
                        id: Some(row.get(0)?),
                        name: row.get(1)?,
                        source_path: row.get::<_, Option<String>>(2)?.map(PathBuf::from),
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
            .map_err(StorageError::from)?;

        Ok(result)
    }

    fn document_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM documents", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }

    // ==================== Chunk Operations ====================

    #[allow(clippy::cast_possible_wrap)]
    fn add_chunks(&mut self, document_id: i64, chunks: &[Chunk]) -> Result<()> {
        if self.get_document(document_id)?.is_none() {
            return Err(StorageError::DocumentNotFound { id: document_id }.into());
        }

        let tx = self.conn.transaction().map_err(StorageError::from)?;

        {
            let mut stmt = tx
                .prepare(
                    r"
                INSERT INTO chunks (document_id, content, chunk_index, created_at)
                VALUES (?, ?, ?, ?)
            ",
                )
                .map_err(StorageError::from)?;

            for chunk in chunks {
                stmt.execute(params![
                    document_id,
                    chunk.content,
                    chunk.index as i64,
                    chunk.created_at,
                ])
                .map_err(StorageError::from)?;
            }
        }

        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    fn get_chunks(&self, document_id: i64) -> Result<Vec<Chunk>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT id, document_id, content, chunk_index, created_at
            FROM chunks WHERE document_id = ? ORDER BY chunk_index
        ",
            )
            .map_err(StorageError::from)?;

        let chunks = stmt
            .query_map(params![document_id], |row| {
                Ok(Chunk {
                    id: Some(row.get(0)?),
                    document_id: row.get(1)?,
                    content: row.get(2)?,
                    index: row.get::<_, i64>(3)? as usize,
                    created_at: row.get(4)?,
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(chunks)
    }

    fn chunk_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }

    // ==================== Utility Operations ====================

    fn stats(&self) -> Result<StorageStats> {
        let dimensions: Option<i64> = self
            .conn
            .query_row(
                "SELECT dimensions FROM chunk_embeddings LIMIT 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(StorageError::from)?;

        let db_size = self
            .path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok().map(|m| m.len()));

        Ok(StorageStats {
            document_count: self.document_count()?,
            chunk_count: self.chunk_count()?,
            embedding_count: self.embedding_count()?,
            embedding_models: self.embedding_models()?,
            dimensions: dimensions.map(|d| d as usize),
            schema_version: self.schema_version()?.unwrap_or(0),
            db_size,
        })
    }
}

// ==================== Embedding Operations ====================

impl SqliteStorage {
    /// Stores embeddings for multiple chunks in one transaction.
    ///
    /// Existing embeddings for the same chunks are replaced.
    ///
    /// # Errors
    ///
    /// Returns an error if any embedding cannot be stored.
    #[allow(clippy::cast_possible_wrap)]
    pub fn store_embeddings_batch(
        &mut self,
        embeddings: &[(i64, Vec<f32>)],
        model_name: Option<&str>,
    ) -> Result<()> {
        let tx = self.conn.transaction().map_err(StorageError::from)?;
        let now = current_timestamp();

        {
            let mut stmt = tx
                .prepare(
                    r"
                    INSERT OR REPLACE INTO chunk_embeddings (chunk_id, embedding, dimensions, model_name, created_at)
                    VALUES (?, ?, ?, ?, ?)
                ",
                )
                .map_err(StorageError::from)?;

            for (chunk_id, embedding) in embeddings {
                stmt.execute(params![
                    chunk_id,
                    encode_embedding(embedding),
                    embedding.len() as i64,
                    model_name,
                    now
                ])
                .map_err(StorageError::from)?;
            }
        }

        tx.commit().map_err(StorageError::from)?;
        Ok(())
    }

    /// Returns every embedded chunk with its text and document name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn embedded_chunks(&self) -> Result<Vec<EmbeddedChunk>> {
        let mut stmt = self
            .conn
            .prepare(EMBEDDED_CHUNKS_SQL)
            .map_err(StorageError::from)?;

        let results = stmt
            .query_map([], |row| {
                let bytes: Vec<u8> = row.get(3)?;
                Ok(EmbeddedChunk {
                    chunk_id: row.get(0)?,
                    content: row.get(1)?,
                    source: row.get(2)?,
                    embedding: decode_embedding(&bytes),
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(results)
    }

    /// Counts chunks with embeddings.
    ///
    /// # Errors
    ///
    /// Returns an error if the count fails.
    pub fn embedding_count(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM chunk_embeddings", [], |row| {
                row.get(0)
            })
            .map_err(StorageError::from)?;
        Ok(count as usize)
    }

    /// Distinct embedding model names recorded in the index.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub fn embedding_models(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT DISTINCT model_name FROM chunk_embeddings WHERE model_name IS NOT NULL ORDER BY model_name",
            )
            .map_err(StorageError::from)?;

        let models = stmt
            .query_map([], |row| row.get(0))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StorageError::from)?;

        Ok(models)
    }
}
