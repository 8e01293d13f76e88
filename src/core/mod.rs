//! Core domain models for transcript-qa.
//!
//! This module contains the data structures shared across the pipeline:
//! documents and chunks from the index, conversation turns, session history,
//! and per-turn responses. These are pure domain models with no I/O
//! dependencies.

pub mod chunk;
pub mod document;
pub mod history;
pub mod response;
pub mod turn;

pub use chunk::{Chunk, RetrievedChunk};
pub use document::Document;
pub use history::SessionHistory;
pub use response::{QueryRequest, Response};
pub use turn::{Message, Role, Turn};
