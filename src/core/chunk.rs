//! Chunk representations.
//!
//! [`Chunk`] is a segment of transcript text as stored in the index.
//! [`RetrievedChunk`] is what a search hands to the prompt assembler and the
//! presentation layer: the text, where it came from, and how well it matched.

use serde::{Deserialize, Serialize};

/// A segment of document text stored in the index.
///
/// # Examples
///
/// ```
/// use transcript_qa::core::Chunk;
///
/// let chunk = Chunk::new(1, "FY23 revenue: ₹70,000 Cr".to_string(), 0);
/// assert_eq!(chunk.document_id, 1);
/// assert!(chunk.id.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier (assigned by storage layer).
    pub id: Option<i64>,

    /// ID of the document this chunk belongs to.
    pub document_id: i64,

    /// Chunk content.
    pub content: String,

    /// Sequential index within the document (0-based).
    pub index: usize,

    /// Unix timestamp when the chunk was created.
    pub created_at: i64,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub fn new(document_id: i64, content: String, index: usize) -> Self {
        Self {
            id: None,
            document_id,
            content,
            index,
            created_at: current_timestamp(),
        }
    }
}

/// A chunk selected for one query.
///
/// Produced fresh per query and dropped once the turn is rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    /// Chunk ID in the index.
    pub chunk_id: i64,
    /// Chunk text, verbatim.
    pub text: String,
    /// Originating document name, if the index recorded one.
    pub source: Option<String>,
    /// Cosine similarity to the query.
    pub score: f32,
}

impl RetrievedChunk {
    /// Label used when citing this chunk.
    ///
    /// Falls back to `Document {position}` (1-based) when the index has no
    /// source name.
    #[must_use]
    pub fn source_label(&self, position: usize) -> String {
        self.source
            .clone()
            .unwrap_or_else(|| format!("Document {position}"))
    }
}

#[allow(clippy::cast_possible_wrap)]
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}
