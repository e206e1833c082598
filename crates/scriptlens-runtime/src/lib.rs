//! # scriptlens-runtime
//!
//! Model-backed analysis of video scripts against criteria.
//!
//! The pure pieces (criteria parsing, chunking, reports) live in
//! `scriptlens-core`. This crate adds everything that talks to a model:
//! the provider boundary, the Criterion Evaluator, the Consolidator, the
//! Orchestrator ([`Analyzer`]) and the per-run [`RequestLog`].
//!
//! Provider failures never escape as errors. They become verdict text
//! starting with an error prefix, plus an error entry in the log.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use scriptlens_core::{load_criteria, Script};
//! use scriptlens_runtime::{Analyzer, OpenAiProvider, RuntimeConfig};
//!
//! let analyzer = Analyzer::builder()
//!     .provider(Arc::new(OpenAiProvider::from_env()?))
//!     .config(RuntimeConfig::default().apply_env())
//!     .build()?;
//!
//! let script = Script::load("script.txt").unwrap_or_default();
//! let criteria = load_criteria("criterios.txt");
//! if let Some(results) = analyzer.analyze(&script, &criteria).await {
//!     println!("{} results, {} requests", results.len(), analyzer.log().len());
//! }
//! ```

use thiserror::Error;

pub mod blocking;
pub mod cache;
pub mod client;
pub mod config;
pub mod consolidator;
pub mod evaluator;
pub mod log;
pub mod orchestrator;
pub mod prompts;
pub mod providers;

pub use blocking::BlockingAnalyzer;
pub use cache::VerdictCache;
pub use client::ModelClient;
pub use config::{ConfigError, ExecutionMode, RuntimeConfig, StageSettings, DEFAULT_MODEL};
pub use consolidator::Consolidator;
pub use evaluator::CriterionEvaluator;
pub use log::{RequestKind, RequestLog, RequestLogEntry, RequestStage, UsageSummary};
pub use orchestrator::{Analyzer, AnalyzerBuilder, ProgressObserver, TracingProgress};
pub use providers::{
    ApiCredential, ChatMessage, CompletionConfig, CompletionResponse, LlmProvider, ProviderError,
    ProviderFactory, ProviderRegistry, RetryingProvider, Role, TokenUsage,
};

#[cfg(feature = "openai")]
pub use providers::{OpenAiProvider, OpenAiProviderFactory, OPENAI_API_KEY_ENV};

/// Errors setting up an analysis. Runs themselves do not fail.
#[derive(Error, Debug)]
pub enum RuntimeError {
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}
