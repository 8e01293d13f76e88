//! Storage layer for transcript-qa.
//!
//! Reads the pre-built `SQLite` index of transcript chunks and their
//! embeddings. Write operations exist for the external index builder and
//! for tests.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::{EmbeddedChunk, SqliteStorage};
pub use traits::{Storage, StorageStats};

/// Index database file name inside the index directory.
pub const INDEX_DB_NAME: &str = "index.db";

/// Default index directory relative to the working directory.
pub const DEFAULT_INDEX_DIR: &str = ".transcript-qa/index";
