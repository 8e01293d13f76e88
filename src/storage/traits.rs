//! Storage trait definition.
//!
//! Defines the interface for index storage backends. The index is built by
//! an external tool; the write operations exist for that builder and for
//! tests, the chat pipeline only reads.

use crate::core::{Chunk, Document};
use crate::error::Result;
use serde::Serialize;

/// Trait for index storage backends.
pub trait Storage: Send {
    /// Initializes storage (creates schema).
    ///
    /// Should be idempotent - safe to call multiple times.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails or the existing schema is
    /// newer than this build supports.
    fn init(&mut self) -> Result<()>;

    /// Checks if storage is initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot be performed.
    fn is_initialized(&self) -> Result<bool>;

    // ==================== Document Operations ====================

    /// Adds a document and returns its assigned ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the document cannot be inserted.
    fn add_document(&mut self, document: &Document) -> Result<i64>;

    /// Retrieves a document by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_document(&self, id: i64) -> Result<Option<Document>>;

    /// Returns the count of documents.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    fn document_count(&self) -> Result<usize>;

    // ==================== Chunk Operations ====================

    /// Adds chunks for a document in one transaction.
    ///
    /// # Errors
    ///
    /// Returns an error if chunk insertion fails.
    fn add_chunks(&mut self, document_id: i64, chunks: &[Chunk]) -> Result<()>;

    /// Retrieves all chunks for a document, ordered by index.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_chunks(&self, document_id: i64) -> Result<Vec<Chunk>>;

    /// Returns the total count of chunks.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    fn chunk_count(&self) -> Result<usize>;

    // ==================== Utility Operations ====================

    /// Gets storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    fn stats(&self) -> Result<StorageStats>;
}

/// Index statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Number of documents indexed.
    pub document_count: usize,
    /// Total number of chunks.
    pub chunk_count: usize,
    /// Number of chunks with an embedding.
    pub embedding_count: usize,
    /// Distinct embedding model names recorded in the index.
    pub embedding_models: Vec<String>,
    /// Embedding dimensions, if any embedding is stored.
    pub dimensions: Option<usize>,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}
