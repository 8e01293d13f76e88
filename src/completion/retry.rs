//! Timeout and retry around a completion service.

use crate::completion::CompletionService;
use crate::core::Message;
use crate::error::{CompletionError, Error, Result};
use async_trait::async_trait;
use std::time::Duration;

/// How transient completion failures are retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Default number of retries.
    pub const DEFAULT_MAX_RETRIES: u32 = 2;

    /// Default delay before the first retry.
    pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(500);

    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    /// Delay before retry number `retry` (0-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Self::DEFAULT_MAX_RETRIES,
            base_delay: Self::DEFAULT_BASE_DELAY,
        }
    }
}

/// Wraps a service so every attempt is bounded by `timeout` and transient
/// failures are retried with exponential backoff.
///
/// Authentication and invalid-request errors fail immediately.
pub struct RetryingService {
    inner: Box<dyn CompletionService>,
    timeout: Duration,
    policy: RetryPolicy,
}

impl RetryingService {
    /// Wraps `inner`.
    #[must_use]
    pub fn new(inner: Box<dyn CompletionService>, timeout: Duration, policy: RetryPolicy) -> Self {
        Self {
            inner,
            timeout,
            policy,
        }
    }

    async fn attempt(
        &self,
        conversation: &[Message],
        model_id: &str,
        temperature: f32,
    ) -> Result<String> {
        tokio::time::timeout(
            self.timeout,
            self.inner.generate(conversation, model_id, temperature),
        )
        .await
        .unwrap_or_else(|_| {
            Err(CompletionError::Timeout {
                secs: self.timeout.as_secs(),
            }
            .into())
        })
    }
}

fn is_transient(err: &Error) -> bool {
    matches!(err, Error::Completion(e) if e.is_transient())
}

#[async_trait]
impl CompletionService for RetryingService {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(
        &self,
        conversation: &[Message],
        model_id: &str,
        temperature: f32,
    ) -> Result<String> {
        let mut retry = 0;
        loop {
            match self.attempt(conversation, model_id, temperature).await {
                Ok(text) => return Ok(text),
                Err(e) if is_transient(&e) && retry < self.policy.max_retries => {
                    let delay = self.policy.delay_for(retry);
                    tracing::warn!(
                        service = self.inner.name(),
                        error = %e,
                        retry = retry + 1,
                        max_retries = self.policy.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        "completion failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
