//! OpenAI-compatible chat-completions client.

use crate::completion::CompletionService;
use crate::core::{Message, Role};
use crate::error::{CompletionError, Result};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use backoff::ExponentialBackoffBuilder;
use std::time::Duration;

/// Gemini's OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Client for an OpenAI-compatible chat-completions endpoint.
///
/// # Examples
///
/// ```no_run
/// use transcript_qa::completion::{OpenAiCompatibleClient, DEFAULT_BASE_URL};
///
/// let client = OpenAiCompatibleClient::new("api-key", DEFAULT_BASE_URL);
/// ```
pub struct OpenAiCompatibleClient {
    client: Client<OpenAIConfig>,
    base_url: String,
}

impl OpenAiCompatibleClient {
    /// Creates a client for `base_url` authenticating with `api_key`.
    ///
    /// The client's built-in rate-limit backoff is disabled: a 429 comes
    /// back as [`CompletionError::RateLimited`] on the first response and
    /// retries are left to [`RetryingService`](crate::completion::RetryingService).
    #[must_use]
    pub fn new(api_key: &str, base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(&base_url);

        Self {
            client: Client::with_config(config).with_backoff(
                ExponentialBackoffBuilder::new()
                    .with_max_elapsed_time(Some(Duration::ZERO))
                    .build(),
            ),
            base_url,
        }
    }

    /// Endpoint base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

fn to_request_message(
    message: &Message,
) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    Ok(match message.role {
        Role::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        Role::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

fn to_request_messages(
    conversation: &[Message],
) -> std::result::Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
    conversation.iter().map(to_request_message).collect()
}

#[async_trait]
impl CompletionService for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai-compatible"
    }

    async fn generate(
        &self,
        conversation: &[Message],
        model_id: &str,
        temperature: f32,
    ) -> Result<String> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(model_id)
            .temperature(temperature)
            .messages(to_request_messages(conversation)?)
            .build()?;

        tracing::debug!(
            model = model_id,
            messages = conversation.len(),
            base_url = %self.base_url,
            "sending completion request"
        );

        let response = self.client.chat().create(request).await?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| CompletionError::EmptyResponse.into())
    }
}
