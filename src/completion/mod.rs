//! Hosted model completion.
//!
//! [`CompletionService`] is the seam to the external text-generation
//! endpoint. [`OpenAiCompatibleClient`] talks to any OpenAI-compatible
//! chat-completions API (Gemini's by default) and [`RetryingService`] bounds
//! any service with a timeout and retries transient failures.

mod openai;
mod retry;

pub use openai::{DEFAULT_BASE_URL, OpenAiCompatibleClient};
pub use retry::{RetryPolicy, RetryingService};

use crate::core::Message;
use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Default model identifier.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash-exp";

/// Default sampling temperature.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Default bound on a single completion call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// A text-generation endpoint.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// Short name for logs (e.g. "openai-compatible").
    fn name(&self) -> &str;

    /// Generates the assistant reply to `conversation`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::CompletionError`] if the endpoint fails or
    /// returns no text.
    async fn generate(
        &self,
        conversation: &[Message],
        model_id: &str,
        temperature: f32,
    ) -> Result<String>;
}
