//! Error types for transcript-qa operations.
//!
//! This module provides the error hierarchy using `thiserror` for index
//! storage, retrieval, completion calls, I/O, and CLI commands.

use thiserror::Error;

/// Result type alias for transcript-qa operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Index storage errors (database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Retrieval errors (query embedding, index search).
    #[error("retrieval error: {0}")]
    Retrieval(#[from] RetrievalError),

    /// Completion service errors (hosted model call).
    #[error("completion error: {0}")]
    Completion(#[from] CompletionError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),

    /// Rejected user input (empty or oversized question).
    #[error("invalid input: {message}")]
    InvalidInput {
        /// Why the input was rejected.
        message: String,
    },

    /// Configuration errors.
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },
}

impl Error {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an invalid-input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Whether the error is scoped to a single turn.
    ///
    /// Turn-scoped errors are shown to the user and the session continues.
    #[must_use]
    pub const fn is_turn_scoped(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. } | Self::Completion(_) | Self::Retrieval(_)
        )
    }
}

/// Storage-specific errors for the index database.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Index database has no schema.
    #[error("index not initialized: {path}")]
    NotInitialized {
        /// Path of the database that lacks a schema.
        path: String,
    },

    /// Document not found by ID.
    #[error("document not found: {id}")]
    DocumentNotFound {
        /// Document ID that was not found.
        id: i64,
    },

    /// Index was written by a newer schema than this build understands.
    #[error("unsupported schema version {found} (supported up to {supported})")]
    UnsupportedSchema {
        /// Version recorded in the database.
        found: u32,
        /// Highest version this build can read.
        supported: u32,
    },
}

/// Retrieval-specific errors.
///
/// These never abort a turn; the retriever degrades to an empty context.
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// The index directory or database could not be opened.
    #[error("index unavailable: {reason}")]
    Unavailable {
        /// Why the index could not be used.
        reason: String,
    },

    /// Query embedding failed.
    #[error("embedding failed: {0}")]
    Embedding(String),

    /// Stored embeddings do not match the query embedding.
    #[error("dimension mismatch: query has {query}, index has {index}")]
    DimensionMismatch {
        /// Query embedding dimensions.
        query: usize,
        /// Stored embedding dimensions.
        index: usize,
    },
}

/// Completion-service errors.
#[derive(Error, Debug)]
pub enum CompletionError {
    /// Network or transport failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The endpoint rejected the credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Rate limit or quota exhausted.
    #[error("quota or rate limit exceeded: {0}")]
    RateLimited(String),

    /// The endpoint returned an error response.
    #[error("service error: {0}")]
    Service(String),

    /// The request could not be built or was rejected as invalid.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The call did not finish within the configured timeout.
    #[error("timed out after {secs}s")]
    Timeout {
        /// Timeout that elapsed, in seconds.
        secs: u64,
    },

    /// The response carried no generated text.
    #[error("empty response from model")]
    EmptyResponse,
}

impl CompletionError {
    /// Whether a retry may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::RateLimited(_) | Self::Service(_) | Self::Timeout { .. }
        )
    }
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Failed to write file.
    #[error("failed to write file: {path}: {reason}")]
    WriteFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),

    /// Terminal line editor failure.
    #[error("line editor error: {0}")]
    Readline(String),
}

// Implement From traits for external errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for CompletionError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;

        match err {
            OpenAIError::Reqwest(e) => Self::Transport(e.to_string()),
            OpenAIError::ApiError(api) => classify_api_error(&api),
            OpenAIError::InvalidArgument(msg) => Self::InvalidRequest(msg),
            other => Self::Service(other.to_string()),
        }
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Completion(err.into())
    }
}

impl From<rustyline::error::ReadlineError> for CommandError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Self::Readline(err.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for Error {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        Self::Command(err.into())
    }
}

/// Maps an API error body onto the completion error taxonomy.
fn classify_api_error(api: &async_openai::error::ApiError) -> CompletionError {
    let kind = api.r#type.as_deref().unwrap_or_default().to_lowercase();
    let code = api
        .code
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let message = api.message.clone();

    if kind.contains("auth")
        || code.contains("invalid_api_key")
        || code.contains("401")
        || code.contains("403")
        || code.contains("permission")
    {
        CompletionError::Auth(message)
    } else if kind.contains("rate") || code.contains("429") || code.contains("quota") {
        CompletionError::RateLimited(message)
    } else if kind.contains("invalid_request") || code.contains("400") {
        CompletionError::InvalidRequest(message)
    } else {
        CompletionError::Service(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::invalid_input("question is empty");
        assert_eq!(err.to_string(), "invalid input: question is empty");
    }

    #[test]
    fn test_config_error_display() {
        let err = Error::config("missing API key");
        assert_eq!(err.to_string(), "configuration error: missing API key");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::NotInitialized {
            path: "/tmp/index.db".to_string(),
        };
        assert_eq!(err.to_string(), "index not initialized: /tmp/index.db");

        let err = StorageError::UnsupportedSchema {
            found: 9,
            supported: 1,
        };
        assert!(err.to_string().contains('9'));
    }

    #[test]
    fn test_retrieval_error_display() {
        let err = RetrievalError::DimensionMismatch {
            query: 384,
            index: 768,
        };
        assert_eq!(
            err.to_string(),
            "dimension mismatch: query has 384, index has 768"
        );
    }

    #[test]
    fn test_completion_error_transient() {
        assert!(CompletionError::Transport("reset".to_string()).is_transient());
        assert!(CompletionError::RateLimited("slow down".to_string()).is_transient());
        assert!(CompletionError::Timeout { secs: 30 }.is_transient());
        assert!(!CompletionError::Auth("bad key".to_string()).is_transient());
        assert!(!CompletionError::InvalidRequest("bad".to_string()).is_transient());
        assert!(!CompletionError::EmptyResponse.is_transient());
    }

    #[test]
    fn test_turn_scoped() {
        assert!(Error::invalid_input("empty").is_turn_scoped());
        assert!(Error::from(CompletionError::EmptyResponse).is_turn_scoped());
        assert!(!Error::config("bad").is_turn_scoped());
        assert!(!Error::from(StorageError::Database("x".to_string())).is_turn_scoped());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_from_rusqlite_error_to_error() {
        let rusqlite_err = rusqlite::Error::InvalidQuery;
        let err: Error = rusqlite_err.into();
        assert!(matches!(err, Error::Storage(StorageError::Database(_))));
    }

    #[test]
    fn test_from_openai_invalid_argument() {
        let err: CompletionError =
            async_openai::error::OpenAIError::InvalidArgument("no model".to_string()).into();
        assert!(matches!(err, CompletionError::InvalidRequest(_)));
    }

    #[test]
    fn test_classify_api_errors() {
        let api = |kind: Option<&str>, code: Option<&str>| async_openai::error::ApiError {
            message: "boom".to_string(),
            r#type: kind.map(str::to_string),
            param: None,
            code: code.map(str::to_string),
        };

        assert!(matches!(
            classify_api_error(&api(Some("authentication_error"), None)),
            CompletionError::Auth(_)
        ));
        assert!(matches!(
            classify_api_error(&api(None, Some("429"))),
            CompletionError::RateLimited(_)
        ));
        assert!(matches!(
            classify_api_error(&api(Some("invalid_request_error"), None)),
            CompletionError::InvalidRequest(_)
        ));
        assert!(matches!(
            classify_api_error(&api(None, None)),
            CompletionError::Service(_)
        ));
    }
}
