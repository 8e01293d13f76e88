//! Validated runtime settings.
//!
//! [`Settings`] is assembled from the parsed command line (which already
//! merged `TRANSCRIPT_QA_*` environment variables) and validated once at
//! startup. An invalid setting is the only error that stops the process
//! before a session begins.

use crate::completion::{DEFAULT_BASE_URL, DEFAULT_MODEL, DEFAULT_TEMPERATURE, DEFAULT_TIMEOUT, RetryPolicy};
use crate::embedding::EmbedderKind;
use crate::error::{Error, Result};
use crate::prompt::DEFAULT_COMPANY;
use crate::retrieval::{DEFAULT_DIVERSITY, DEFAULT_FETCH_K, DEFAULT_TOP_K};
use crate::storage::DEFAULT_INDEX_DIR;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the completion API key.
pub const API_KEY_ENV: &str = "TRANSCRIPT_QA_API_KEY";

/// Default maximum question length, in characters.
pub const DEFAULT_MAX_QUESTION_CHARS: usize = 4000;

/// Highest temperature accepted by OpenAI-compatible endpoints.
const MAX_TEMPERATURE: f32 = 2.0;

/// Runtime settings for a session.
#[derive(Clone)]
pub struct Settings {
    /// Directory holding `index.db`.
    pub index_dir: PathBuf,
    /// Completion API key.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible endpoint.
    pub base_url: String,
    /// Model identifier.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Chunks supplied as context per question.
    pub top_k: usize,
    /// Nearest candidates considered before MMR.
    pub fetch_k: usize,
    /// MMR lambda (1.0 = relevance only, 0.0 = diversity only).
    pub diversity: f32,
    /// Bound on one completion attempt.
    pub timeout: Duration,
    /// Retries for transient completion failures.
    pub max_retries: u32,
    /// Longest accepted question, in characters.
    pub max_question_chars: usize,
    /// Query embedder; must match the index.
    pub embedder: EmbedderKind,
    /// Explicit system template file.
    pub prompt_file: Option<PathBuf>,
    /// Company the analyst focuses on.
    pub company: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from(DEFAULT_INDEX_DIR),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            top_k: DEFAULT_TOP_K,
            fetch_k: DEFAULT_FETCH_K,
            diversity: DEFAULT_DIVERSITY,
            timeout: DEFAULT_TIMEOUT,
            max_retries: RetryPolicy::DEFAULT_MAX_RETRIES,
            max_question_chars: DEFAULT_MAX_QUESTION_CHARS,
            embedder: EmbedderKind::default(),
            prompt_file: None,
            company: DEFAULT_COMPANY.to_string(),
        }
    }
}

// The API key never reaches logs.
impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("index_dir", &self.index_dir)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("top_k", &self.top_k)
            .field("fetch_k", &self.fetch_k)
            .field("diversity", &self.diversity)
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("max_question_chars", &self.max_question_chars)
            .field("embedder", &self.embedder)
            .field("prompt_file", &self.prompt_file)
            .field("company", &self.company)
            .finish()
    }
}

impl Settings {
    /// Checks value ranges shared by every command.
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first invalid setting.
    pub fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::config("top-k must be at least 1"));
        }
        if self.fetch_k < self.top_k {
            return Err(Error::config(format!(
                "fetch-k ({}) must be at least top-k ({})",
                self.fetch_k, self.top_k
            )));
        }
        if !(0.0..=1.0).contains(&self.diversity) {
            return Err(Error::config(format!(
                "diversity must be between 0 and 1, got {}",
                self.diversity
            )));
        }
        if !(0.0..=MAX_TEMPERATURE).contains(&self.temperature) {
            return Err(Error::config(format!(
                "temperature must be between 0 and {MAX_TEMPERATURE}, got {}",
                self.temperature
            )));
        }
        if self.timeout.is_zero() {
            return Err(Error::config("timeout must be greater than zero"));
        }
        if self.max_question_chars == 0 {
            return Err(Error::config("max question length must be at least 1"));
        }
        if self.model.trim().is_empty() {
            return Err(Error::config("model must not be empty"));
        }
        if self.base_url.trim().is_empty() {
            return Err(Error::config("base URL must not be empty"));
        }
        Ok(())
    }

    /// Validates everything needed to call the model, including the key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if a setting is invalid or no
    /// non-blank API key is configured.
    pub fn validate_for_completion(&self) -> Result<()> {
        self.validate()?;
        self.api_key().map(|_| ())
    }

    /// Returns the API key.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the key is missing or blank.
    pub fn api_key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "no API key configured; set {API_KEY_ENV} or pass --api-key"
                ))
            })
    }

    /// Retry policy for completion calls.
    #[must_use]
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            ..RetryPolicy::default()
        }
    }
}
