//! The text-completion boundary.
//!
//! [`LlmProvider`] is what the evaluator and consolidator call through. The
//! OpenAI chat-completions backend sits behind the `openai` feature;
//! [`ProviderRegistry`] builds providers by type name and
//! [`RetryingProvider`] adds per-attempt timeouts and backoff.
//!
//! Credentials only ever live inside [`ApiCredential`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod factory;
mod retry;
pub mod secrets;

#[cfg(feature = "openai")]
mod openai;

pub use factory::{ProviderFactory, ProviderRegistry};
pub use retry::RetryingProvider;
pub use secrets::{ApiCredential, CredentialLookup, CredentialSource};

#[cfg(feature = "openai")]
pub use openai::{OpenAiProvider, OpenAiProviderFactory, OPENAI_API_KEY_ENV};

/// Why a completion request failed.
///
/// Every variant is recoverable data for the caller: the evaluator and the
/// consolidator turn it into error verdict text.
#[derive(Error, Debug, Clone)]
pub enum ProviderError {
    #[error("request failed: {0}")]
    Transport(String),

    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("credential rejected by provider")]
    Unauthorized,

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("provider not configured: {0}")]
    NotConfigured(String),
}

impl ProviderError {
    /// Whether repeating the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) | Self::RateLimited { .. } | Self::Timeout(_) => true,
            Self::Status { status, .. } => *status >= 500,
            Self::MalformedResponse(_) | Self::Unauthorized | Self::NotConfigured(_) => false,
        }
    }
}

/// Sampling settings and limits for one request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,

    /// Upper bound for one attempt
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    /// Evaluation settings for the default model.
    fn default() -> Self {
        Self {
            model: crate::config::DEFAULT_MODEL.to_string(),
            max_tokens: 500,
            temperature: 0.1,
            timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat request. Each request carries a system message
/// followed by a user message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// What came back from a successful request.
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Response text, returned verbatim to the caller
    pub content: String,

    /// Zeroed when the provider reports no usage
    pub usage: TokenUsage,

    /// Model id reported by the provider
    pub model: String,

    pub stop_reason: Option<String>,
}

/// Token counts reported for one request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.completion_tokens)
    }
}

/// A text-completion backend.
///
/// The only place model requests leave the process. Implementations report
/// every failure, timeouts included, as a [`ProviderError`].
#[async_trait]
pub trait LlmProvider: Send + Sync {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
