//! Query embedding for similarity search.
//!
//! The index is embedded by an external builder; this module embeds the
//! user's question with the same model so it can be compared against the
//! stored vectors. Uses fastembed (when available) or a hash-based fallback
//! for deterministic pseudo-embeddings.
//!
//! # Feature Flags
//!
//! - `fastembed-embeddings`: Enables `FastEmbed` with all-MiniLM-L6-v2 (384 dimensions)
//! - Without the feature: Uses hash-based fallback (deterministic but not semantic)

mod fallback;

#[cfg(feature = "fastembed-embeddings")]
mod fastembed_impl;

pub use fallback::{FALLBACK_MODEL_NAME, FallbackEmbedder};

#[cfg(feature = "fastembed-embeddings")]
pub use fastembed_impl::{FASTEMBED_MODEL_NAME, FastEmbedEmbedder};

use crate::Result;
use clap::ValueEnum;
use serde::Serialize;

/// Default embedding dimensions for the all-MiniLM-L6-v2 model.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Trait for embedding generators.
///
/// # Examples
///
/// ```
/// use transcript_qa::embedding::{Embedder, FallbackEmbedder, DEFAULT_DIMENSIONS};
///
/// let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
/// let embedding = embedder.embed("What was FY23 revenue?").unwrap();
/// assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
/// ```
pub trait Embedder: Send + Sync {
    /// Returns the embedding dimensions.
    fn dimensions(&self) -> usize;

    /// Name of the model, as recorded next to stored embeddings.
    fn model_name(&self) -> &str;

    /// Generates an embedding for the given text.
    ///
    /// # Errors
    ///
    /// Returns an error if embedding generation fails.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Which embedder to use for queries.
///
/// Must match the model the index was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderKind {
    /// all-MiniLM-L6-v2 via fastembed.
    Fastembed,
    /// Deterministic hash-based pseudo-embeddings.
    Hash,
}

impl Default for EmbedderKind {
    fn default() -> Self {
        if cfg!(feature = "fastembed-embeddings") {
            Self::Fastembed
        } else {
            Self::Hash
        }
    }
}

/// Creates an embedder of the requested kind.
///
/// # Errors
///
/// Returns a configuration error if `fastembed` is requested in a build
/// without the `fastembed-embeddings` feature, or if initialization fails.
pub fn create_embedder(kind: EmbedderKind) -> Result<Box<dyn Embedder>> {
    match kind {
        EmbedderKind::Hash => Ok(Box::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS))),
        #[cfg(feature = "fastembed-embeddings")]
        EmbedderKind::Fastembed => Ok(Box::new(FastEmbedEmbedder::new()?)),
        #[cfg(not(feature = "fastembed-embeddings"))]
        EmbedderKind::Fastembed => Err(crate::Error::config(
            "fastembed embedder requested but this build lacks the `fastembed-embeddings` feature",
        )),
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical).
/// Returns 0.0 if vectors have different lengths or zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity_identical() {
        let a = vec![1.0, 0.0, 0.0];
        let sim = cosine_similarity(&a, &a);
        assert!((sim - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_orthogonal() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![0.0, 1.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_opposite() {
        let a = vec![1.0, 0.0, 0.0];
        let b = vec![-1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &b) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_different_lengths() {
        let a = vec![1.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_zero_vector() {
        let a = vec![0.0, 0.0, 0.0];
        let b = vec![1.0, 0.0, 0.0];
        assert!(cosine_similarity(&a, &b).abs() < 1e-6);
    }

    #[test]
    fn test_create_hash_embedder() {
        let embedder = create_embedder(EmbedderKind::Hash).unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
        assert_eq!(embedder.model_name(), FALLBACK_MODEL_NAME);
    }

    #[test]
    fn test_create_default_embedder() {
        let embedder = create_embedder(EmbedderKind::default()).unwrap();
        assert_eq!(embedder.dimensions(), DEFAULT_DIMENSIONS);
    }
}
