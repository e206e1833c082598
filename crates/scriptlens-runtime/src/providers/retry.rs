//! Retry with exponential backoff around any provider.
//!
//! Each attempt is bounded by [`CompletionConfig::timeout`]; an attempt that
//! overruns surfaces as [`ProviderError::Timeout`]. Only transient failures
//! ([`ProviderError::is_retryable`]) are retried.
//! Callers see a single call: one request log entry per logical request,
//! whatever the number of attempts.

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use std::sync::Arc;
use std::time::Duration;

use super::{ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError};

/// Provider wrapper that retries transient errors.
pub struct RetryingProvider {
    inner: Arc<dyn LlmProvider>,
    max_retries: usize,
    min_delay: Duration,
}

impl RetryingProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, max_retries: usize) -> Self {
        Self {
            inner,
            max_retries,
            min_delay: Duration::from_millis(500),
        }
    }

    /// Set the first backoff delay.
    pub fn with_min_delay(mut self, delay: Duration) -> Self {
        self.min_delay = delay;
        self
    }
}

#[async_trait]
impl LlmProvider for RetryingProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let inner = &self.inner;
        let messages = &messages;
        let backoff = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_times(self.max_retries);

        (|| async move {
            match tokio::time::timeout(config.timeout, inner.complete(messages.clone(), config))
                .await
            {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(config.timeout)),
            }
        })
            .retry(backoff)
            .when(ProviderError::is_retryable)
            .notify(|err: &ProviderError, delay: Duration| {
                tracing::warn!(
                    provider = inner.name(),
                    error = %err,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying model request"
                );
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
