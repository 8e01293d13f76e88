//! I/O utilities for transcript-qa.
//!
//! Small text-file helpers for prompt templates and Unicode-aware
//! truncation for terminal output.

pub mod reader;
pub mod unicode;

pub use reader::{read_text_file, write_file, write_new_file};
pub use unicode::{preview, truncate_graphemes};
