//! Per-turn request and response types.

use crate::core::chunk::RetrievedChunk;
use crate::core::turn::Turn;
use serde::Serialize;

/// A question together with a read-only snapshot of prior turns.
#[derive(Debug, Clone, Copy)]
pub struct QueryRequest<'a> {
    /// The question being asked.
    pub question: &'a str,
    /// History at the moment of submission.
    pub history: &'a [Turn],
}

/// The outcome of one successful turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    /// Generated answer text.
    pub answer: String,
    /// Chunks that were supplied as context, in retrieval order.
    pub sources: Vec<RetrievedChunk>,
}
