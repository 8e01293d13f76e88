//! Source documents recorded in the index.

use crate::core::chunk::current_timestamp;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A source document whose chunks live in the index.
///
/// The index only records the document's identity; its text lives in its
/// chunks.
///
/// # Examples
///
/// ```
/// use transcript_qa::core::Document;
///
/// let doc = Document::new("ITC Q4 FY23 earnings call");
/// assert_eq!(doc.name, "ITC Q4 FY23 earnings call");
/// assert!(doc.source_path.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (assigned by storage layer).
    pub id: Option<i64>,

    /// Display name, used as the citation label.
    pub name: String,

    /// Path of the file the document was built from.
    pub source_path: Option<PathBuf>,

    /// Unix timestamp when the document was indexed.
    pub created_at: i64,
}

impl Document {
    /// Creates a document with a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            source_path: None,
            created_at: current_timestamp(),
        }
    }
}
