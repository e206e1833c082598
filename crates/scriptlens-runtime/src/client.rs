//! The single path from evaluator and consolidator to the provider.
//!
//! A request goes through the verdict cache (if any), waits for a
//! concurrency permit (if limited), calls the provider and appends exactly
//! one entry to the run's request log. Cache hits make no provider call
//! and therefore append nothing.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::cache::{CacheKey, VerdictCache};
use crate::log::{RequestLog, RequestLogEntry, RequestStage};
use crate::providers::{ChatMessage, CompletionConfig, LlmProvider, ProviderError};

/// Provider handle shared by every task of a run.
#[derive(Clone)]
pub struct ModelClient {
    provider: Arc<dyn LlmProvider>,
    limiter: Option<Arc<Semaphore>>,
    cache: Option<Arc<VerdictCache>>,
}

impl ModelClient {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            limiter: None,
            cache: None,
        }
    }

    /// Bound the number of in-flight provider calls.
    pub fn with_concurrency_limit(mut self, permits: usize) -> Self {
        self.limiter = Some(Arc::new(Semaphore::new(permits.max(1))));
        self
    }

    pub fn with_cache(mut self, cache: Arc<VerdictCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send one system + user prompt pair and return the response text.
    pub async fn request(
        &self,
        stage: RequestStage,
        system_prompt: &str,
        prompt: &str,
        config: &CompletionConfig,
        log: &RequestLog,
    ) -> Result<String, ProviderError> {
        let key = self
            .cache
            .as_ref()
            .map(|_| CacheKey::new(stage, &config.model, prompt));

        if let (Some(cache), Some(key)) = (&self.cache, &key) {
            if let Some(hit) = cache.get(key).await {
                tracing::debug!(%stage, "Verdict cache hit");
                return Ok(hit);
            }
        }

        let _permit = match &self.limiter {
            Some(limiter) => limiter.acquire().await.ok(),
            None => None,
        };

        let messages = vec![ChatMessage::system(system_prompt), ChatMessage::user(prompt)];
        let started = Instant::now();
        let outcome = self.provider.complete(messages, config).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match outcome {
            Ok(response) => {
                tracing::debug!(
                    %stage,
                    model = %config.model,
                    tokens = response.usage.total(),
                    elapsed_ms,
                    "Model request completed"
                );
                log.append(RequestLogEntry::success(
                    stage,
                    &config.model,
                    prompt,
                    &response.content,
                    response.usage,
                    elapsed_ms,
                ));
                if let (Some(cache), Some(key)) = (&self.cache, key) {
                    cache.insert(key, response.content.clone()).await;
                }
                Ok(response.content)
            }
            Err(e) => {
                log.append(RequestLogEntry::failure(
                    stage,
                    &config.model,
                    prompt,
                    &e,
                    elapsed_ms,
                ));
                Err(e)
            }
        }
    }
}
