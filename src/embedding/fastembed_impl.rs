//! `FastEmbed`-based semantic embedder.
//!
//! Provides real semantic embeddings using the all-MiniLM-L6-v2 model via
//! fastembed-rs, the model transcript indexes are usually built with.
//! Only available when the `fastembed-embeddings` feature is enabled.

use crate::Result;
use crate::embedding::{DEFAULT_DIMENSIONS, Embedder};
use crate::error::RetrievalError;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::{Mutex, OnceLock};

/// Lazily loaded embedding model shared by all embedder instances.
static EMBEDDING_MODEL: OnceLock<Mutex<fastembed::TextEmbedding>> = OnceLock::new();

/// Model name recorded for all-MiniLM-L6-v2 embeddings.
pub const FASTEMBED_MODEL_NAME: &str = "all-MiniLM-L6-v2";

/// `FastEmbed` embedder using all-MiniLM-L6-v2.
///
/// The model is loaded on the first embed call so that commands which
/// never retrieve stay fast.
pub struct FastEmbedEmbedder {
    model_name: &'static str,
}

impl FastEmbedEmbedder {
    /// Creates a new `FastEmbed` embedder.
    ///
    /// # Errors
    ///
    /// Infallible today; kept fallible so eager loading can be added
    /// without changing callers.
    #[allow(clippy::missing_const_for_fn, clippy::unnecessary_wraps)]
    pub fn new() -> Result<Self> {
        Ok(Self {
            model_name: FASTEMBED_MODEL_NAME,
        })
    }

    fn get_model() -> Result<&'static Mutex<fastembed::TextEmbedding>> {
        if let Some(model) = EMBEDDING_MODEL.get() {
            return Ok(model);
        }

        tracing::info!(model = FASTEMBED_MODEL_NAME, "loading embedding model");

        let options = fastembed::InitOptions::new(fastembed::EmbeddingModel::AllMiniLML6V2)
            .with_show_download_progress(false);

        let model = fastembed::TextEmbedding::try_new(options).map_err(|e| {
            RetrievalError::Embedding(format!("failed to load embedding model: {e}"))
        })?;

        // Another thread may have won the race; either instance is fine.
        let _ = EMBEDDING_MODEL.set(Mutex::new(model));

        EMBEDDING_MODEL.get().ok_or_else(|| {
            RetrievalError::Embedding("embedding model initialization race".to_string()).into()
        })
    }

    fn run(texts: Vec<&str>) -> Result<Vec<Vec<f32>>> {
        let model = Self::get_model()?;
        let mut model = model.lock().map_err(|e| {
            RetrievalError::Embedding(format!("failed to lock embedding model: {e}"))
        })?;

        // ONNX runtime can panic on malformed inputs or internal errors.
        let result = catch_unwind(AssertUnwindSafe(|| model.embed(texts, None)));

        result
            .map_err(|panic_info| {
                let panic_msg = panic_info
                    .downcast_ref::<&str>()
                    .map(|s| (*s).to_string())
                    .or_else(|| panic_info.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                RetrievalError::Embedding(format!("ONNX runtime panic: {panic_msg}"))
            })?
            .map_err(|e| RetrievalError::Embedding(format!("embedding failed: {e}")).into())
    }
}

impl Embedder for FastEmbedEmbedder {
    fn dimensions(&self) -> usize {
        DEFAULT_DIMENSIONS
    }

    fn model_name(&self) -> &str {
        self.model_name
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if text.trim().is_empty() {
            return Err(RetrievalError::Embedding("cannot embed empty text".to_string()).into());
        }

        Self::run(vec![text])?.into_iter().next().ok_or_else(|| {
            RetrievalError::Embedding("no embedding returned from model".to_string()).into()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedder_creation() {
        let embedder = FastEmbedEmbedder::new().unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
        assert_eq!(embedder.model_name(), "all-MiniLM-L6-v2");
    }

    // Tests that require the model download are marked #[ignore]
    // Run with: cargo test -- --ignored

    #[test]
    #[ignore = "requires fastembed model download"]
    fn test_embed_success() {
        let embedder = FastEmbedEmbedder::new().unwrap();
        let embedding = embedder.embed("What was FY23 revenue?").unwrap();
        assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
    }

    #[test]
    fn test_embed_empty_fails() {
        let embedder = FastEmbedEmbedder::new().unwrap();
        assert!(embedder.embed("   ").is_err());
    }
}
