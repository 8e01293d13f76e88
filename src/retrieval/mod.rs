//! Context retrieval for a question.
//!
//! A [`VectorIndex`] returns the chunks most relevant to a query under
//! Maximal Marginal Relevance. The [`Retriever`] wraps an index with the
//! session's `top_k`/`diversity` settings and turns index failures into an
//! empty context, so a broken index never aborts a turn.

mod mmr;
mod sqlite_index;

pub use mmr::mmr_select;
pub use sqlite_index::{DEFAULT_FETCH_K, SqliteVectorIndex};

use crate::core::RetrievedChunk;
use crate::embedding::{EmbedderKind, create_embedder};
use crate::error::{Result, RetrievalError};
use std::path::Path;

/// Default number of chunks supplied as context.
pub const DEFAULT_TOP_K: usize = 3;

/// Default MMR lambda; 1.0 ranks by relevance alone.
pub const DEFAULT_DIVERSITY: f32 = 1.0;

/// A searchable index of embedded transcript chunks.
pub trait VectorIndex: Send {
    /// Returns at most `k` chunks for `query`, selected by MMR with lambda
    /// `diversity`, in selection order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query cannot be embedded or the index cannot
    /// be read.
    fn search(&self, query: &str, k: usize, diversity: f32) -> Result<Vec<RetrievedChunk>>;

    /// Human-readable description for logs and status output.
    fn describe(&self) -> String {
        "vector index".to_string()
    }
}

/// Stand-in used when the index could not be opened.
///
/// Every search fails with [`RetrievalError::Unavailable`], which the
/// [`Retriever`] turns into an empty context.
#[derive(Debug, Clone)]
pub struct UnavailableIndex {
    reason: String,
}

impl UnavailableIndex {
    /// Creates a stand-in carrying the reason the real index is missing.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl VectorIndex for UnavailableIndex {
    fn search(&self, _query: &str, _k: usize, _diversity: f32) -> Result<Vec<RetrievedChunk>> {
        Err(RetrievalError::Unavailable {
            reason: self.reason.clone(),
        }
        .into())
    }

    fn describe(&self) -> String {
        format!("unavailable ({})", self.reason)
    }
}

/// Opens the index in `index_dir`, degrading to [`UnavailableIndex`] when
/// it cannot be read.
///
/// # Errors
///
/// Only embedder construction errors are returned; they indicate a
/// misconfigured build rather than a missing index.
pub fn open_index(
    index_dir: &Path,
    embedder: EmbedderKind,
    fetch_k: usize,
) -> Result<Box<dyn VectorIndex>> {
    let embedder = create_embedder(embedder)?;

    match SqliteVectorIndex::open(index_dir, embedder, fetch_k) {
        Ok(index) => Ok(Box::new(index)),
        Err(e) => {
            tracing::warn!(
                index_dir = %index_dir.display(),
                error = %e,
                "index unavailable; answers will have no transcript context"
            );
            Ok(Box::new(UnavailableIndex::new(e.to_string())))
        }
    }
}

/// Retrieval step of the pipeline.
pub struct Retriever {
    index: Box<dyn VectorIndex>,
    top_k: usize,
    diversity: f32,
}

impl Retriever {
    /// Creates a retriever over `index`.
    #[must_use]
    pub fn new(index: Box<dyn VectorIndex>, top_k: usize, diversity: f32) -> Self {
        Self {
            index,
            top_k,
            diversity,
        }
    }

    /// Description of the underlying index.
    #[must_use]
    pub fn describe(&self) -> String {
        self.index.describe()
    }

    /// Searches the index, propagating failures.
    ///
    /// # Errors
    ///
    /// Returns the index error unchanged.
    pub fn try_retrieve(&self, question: &str) -> Result<Vec<RetrievedChunk>> {
        self.index.search(question, self.top_k, self.diversity)
    }

    /// Searches the index, returning an empty context on failure.
    #[must_use]
    pub fn retrieve(&self, question: &str) -> Vec<RetrievedChunk> {
        match self.try_retrieve(question) {
            Ok(chunks) => {
                tracing::debug!(count = chunks.len(), "retrieved context");
                chunks
            }
            Err(e) => {
                tracing::warn!(error = %e, "retrieval failed; continuing without context");
                Vec::new()
            }
        }
    }
}
