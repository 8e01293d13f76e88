//! Vector index backed by the `SQLite` index database.

use crate::core::RetrievedChunk;
use crate::embedding::{Embedder, cosine_similarity};
use crate::error::{Result, RetrievalError};
use crate::retrieval::{VectorIndex, mmr_select};
use crate::storage::{EmbeddedChunk, INDEX_DB_NAME, SqliteStorage, Storage, StorageStats};
use std::path::Path;

/// Default number of nearest candidates considered before MMR.
pub const DEFAULT_FETCH_K: usize = 20;

/// Brute-force cosine search over the stored chunk embeddings, followed by
/// MMR re-ranking.
///
/// Transcript indexes are small enough that a linear scan is fast; the
/// scan happens on every query so the file can be rebuilt between sessions.
pub struct SqliteVectorIndex {
    storage: SqliteStorage,
    embedder: Box<dyn Embedder>,
    fetch_k: usize,
}

impl SqliteVectorIndex {
    /// Opens the index database inside `index_dir` read-only.
    ///
    /// Logs a warning when the index was embedded with a different model than
    /// `embedder`; similarities are then meaningless but the session still
    /// runs.
    ///
    /// # Errors
    ///
    /// Returns an error if the database is missing, has no schema, or was
    /// written by a newer schema version.
    pub fn open(index_dir: &Path, embedder: Box<dyn Embedder>, fetch_k: usize) -> Result<Self> {
        let db_path = index_dir.join(INDEX_DB_NAME);
        let storage = SqliteStorage::open_read_only(&db_path)?;
        storage.ensure_readable()?;

        tracing::debug!(path = %db_path.display(), "opened index");
        Ok(Self::from_storage(storage, embedder, fetch_k))
    }

    /// Wraps an already opened storage.
    #[must_use]
    pub fn from_storage(storage: SqliteStorage, embedder: Box<dyn Embedder>, fetch_k: usize) -> Self {
        let index = Self {
            storage,
            embedder,
            fetch_k,
        };
        index.check_model();
        index
    }

    /// Index statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if the statistics queries fail.
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage.stats()
    }

    fn check_model(&self) {
        match self.storage.embedding_models() {
            Ok(models) => {
                let ours = self.embedder.model_name();
                if !models.is_empty() && !models.iter().any(|m| m == ours) {
                    tracing::warn!(
                        query_model = ours,
                        index_models = ?models,
                        "query embedder differs from the model the index was built with"
                    );
                }
            }
            Err(e) => tracing::warn!(error = %e, "could not read index embedding models"),
        }
    }

    fn candidates(&self, query_embedding: &[f32], limit: usize) -> Result<Vec<(EmbeddedChunk, f32)>> {
        let stored = self.storage.embedded_chunks()?;

        if let Some(mismatch) = stored
            .iter()
            .find(|c| c.embedding.len() != query_embedding.len())
        {
            return Err(RetrievalError::DimensionMismatch {
                query: query_embedding.len(),
                index: mismatch.embedding.len(),
            }
            .into());
        }

        let mut scored: Vec<(EmbeddedChunk, f32)> = stored
            .into_iter()
            .map(|chunk| {
                let sim = cosine_similarity(query_embedding, &chunk.embedding);
                (chunk, sim)
            })
            .collect();

        // Stable sort keeps chunk-id order among equal scores.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(limit);
        Ok(scored)
    }
}

impl VectorIndex for SqliteVectorIndex {
    fn search(&self, query: &str, k: usize, diversity: f32) -> Result<Vec<RetrievedChunk>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let query_embedding = self.embedder.embed(query)?;
        let candidates = self.candidates(&query_embedding, self.fetch_k.max(k))?;
        if candidates.is_empty() {
            tracing::debug!("index holds no embedded chunks");
            return Ok(Vec::new());
        }

        let relevance: Vec<f32> = candidates.iter().map(|(_, s)| *s).collect();
        let vectors: Vec<Vec<f32>> = candidates
            .iter()
            .map(|(c, _)| c.embedding.clone())
            .collect();

        let picked = mmr_select(&relevance, &vectors, k, diversity);
        tracing::debug!(
            candidates = candidates.len(),
            selected = picked.len(),
            diversity,
            "mmr selection complete"
        );

        Ok(picked
            .into_iter()
            .map(|i| {
                let (chunk, score) = &candidates[i];
                RetrievedChunk {
                    chunk_id: chunk.chunk_id,
                    text: chunk.content.clone(),
                    source: chunk.source.clone(),
                    score: *score,
                }
            })
            .collect())
    }

    fn describe(&self) -> String {
        self.storage.path().map_or_else(
            || "in-memory index".to_string(),
            |p| p.display().to_string(),
        )
    }
}
