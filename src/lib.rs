//! # transcript-qa
//!
//! Retrieval-augmented chat over financial call transcripts.
//!
//! Each question is answered in three steps: the most relevant chunks of a
//! pre-built transcript index are selected by Maximal Marginal Relevance,
//! they are placed into an analyst system prompt together with the session
//! history, and a hosted model generates the answer. The answer is shown
//! with the source documents it was grounded on.
//!
//! ## Features
//!
//! - **MMR Retrieval**: Top-k context selection over a `SQLite` index
//! - **Grounded Prompts**: Configurable analyst template with verbatim context
//! - **Hosted Completion**: Any OpenAI-compatible endpoint, with timeout and retries
//! - **Session History**: In-memory multi-turn chat with a clear operation
//!
//! ## Example
//!
//! ```no_run
//! use transcript_qa::{ChatSession, Settings};
//!
//! # async fn run() -> transcript_qa::Result<()> {
//! let settings = Settings {
//!     api_key: Some("key".to_string()),
//!     ..Settings::default()
//! };
//! let mut session = ChatSession::from_settings(&settings)?;
//! let response = session.submit("What was FY23 revenue?").await?;
//! println!("{}", response.answer);
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod cli;
pub mod completion;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod io;
pub mod logging;
pub mod prompt;
pub mod retrieval;
pub mod session;
pub mod storage;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export core domain types
pub use core::{Chunk, Document, Message, Response, RetrievedChunk, Role, SessionHistory, Turn};

// Re-export pipeline types
pub use completion::{CompletionService, OpenAiCompatibleClient, RetryPolicy, RetryingService};
pub use config::Settings;
pub use prompt::{PromptAssembler, PromptTemplate, format_context};
pub use retrieval::{Retriever, SqliteVectorIndex, VectorIndex, mmr_select, open_index};
pub use session::{ChatSession, SessionOptions};

// Re-export storage types
pub use storage::{DEFAULT_INDEX_DIR, INDEX_DB_NAME, SqliteStorage, Storage};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export embedding types
#[cfg(feature = "fastembed-embeddings")]
pub use embedding::FastEmbedEmbedder;
pub use embedding::{
    DEFAULT_DIMENSIONS, Embedder, EmbedderKind, FallbackEmbedder, cosine_similarity,
    create_embedder,
};
