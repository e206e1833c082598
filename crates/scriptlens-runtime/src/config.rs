//! Runtime configuration.
//!
//! Every field has a default, so an empty YAML document is a valid
//! configuration. Durations are written in humantime form (`60s`, `2m`).

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::log::RequestStage;
use crate::providers::CompletionConfig;

/// Model used when nothing else is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Environment variable overriding the model id.
pub const MODEL_ENV: &str = "SCRIPTLENS_MODEL";

/// Errors loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// How criteria and parts are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// One request at a time, progress reported after each
    Sequential,

    /// Criteria and parts as independent tasks
    #[default]
    Concurrent,
}

impl std::str::FromStr for ExecutionMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            other => Err(ConfigError::Invalid(format!("unknown mode '{}'", other))),
        }
    }
}

/// Sampling settings for one request kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageSettings {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl StageSettings {
    pub fn evaluation() -> Self {
        Self {
            temperature: 0.1,
            max_tokens: 500,
        }
    }

    pub fn consolidation() -> Self {
        Self {
            temperature: 0.3,
            max_tokens: 600,
        }
    }
}

/// Configuration for an analysis run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Model id sent with every request
    pub model: String,

    /// Part size limit in characters
    pub max_chars: usize,

    pub mode: ExecutionMode,

    /// Cap on in-flight provider calls, unbounded when unset
    pub max_concurrency: Option<usize>,

    /// Per-request timeout
    #[serde(with = "humantime_duration")]
    pub request_timeout: Duration,

    /// Retries for transient provider errors
    pub max_retries: usize,

    /// Reuse successful verdicts for identical prompts
    pub cache_verdicts: bool,

    pub evaluation: StageSettings,
    pub consolidation: StageSettings,
}

mod humantime_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_chars: scriptlens_core::DEFAULT_MAX_CHARS,
            mode: ExecutionMode::default(),
            max_concurrency: None,
            request_timeout: Duration::from_secs(60),
            max_retries: 2,
            cache_verdicts: false,
            evaluation: StageSettings::evaluation(),
            consolidation: StageSettings::consolidation(),
        }
    }
}

impl RuntimeConfig {
    /// Parse and validate a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Apply `SCRIPTLENS_MODEL` when set and non-empty.
    pub fn apply_env(mut self) -> Self {
        if let Ok(model) = std::env::var(MODEL_ENV) {
            let model = model.trim();
            if !model.is_empty() {
                self.model = model.to_string();
            }
        }
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model must not be empty".into()));
        }
        if self.max_chars == 0 {
            return Err(ConfigError::Invalid("max_chars must be at least 1".into()));
        }
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::Invalid(
                "max_concurrency must be at least 1".into(),
            ));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Invalid(
                "request_timeout must be positive".into(),
            ));
        }
        for (name, settings) in [
            ("evaluation", &self.evaluation),
            ("consolidation", &self.consolidation),
        ] {
            if !(0.0..=2.0).contains(&settings.temperature) {
                return Err(ConfigError::Invalid(format!(
                    "{} temperature must be within 0.0..=2.0",
                    name
                )));
            }
            if settings.max_tokens == 0 {
                return Err(ConfigError::Invalid(format!(
                    "{} max_tokens must be at least 1",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Completion settings for one request kind.
    pub fn completion_config(&self, stage: RequestStage) -> CompletionConfig {
        let settings = match stage {
            RequestStage::Evaluation => self.evaluation,
            RequestStage::Consolidation => self.consolidation,
        };
        CompletionConfig {
            model: self.model.clone(),
            max_tokens: settings.max_tokens,
            temperature: settings.temperature,
            timeout: self.request_timeout,
        }
    }
}
