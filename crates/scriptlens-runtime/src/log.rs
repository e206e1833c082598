//! Append-only request log for one analysis run.
//!
//! Every model request made by the evaluator or the consolidator appends
//! exactly one entry, successful or not. The log is a cheap cloneable
//! handle passed to each call; appends are serialised by a mutex so
//! concurrent evaluations never lose or interleave entries. Entry order
//! follows completion order, not criterion or part order.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::providers::{ProviderError, TokenUsage};

/// Characters of the prompt kept in each entry.
pub const PROMPT_PREVIEW_CHARS: usize = 200;

/// Which step issued a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStage {
    Evaluation,
    Consolidation,
}

impl fmt::Display for RequestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Evaluation => write!(f, "evaluation"),
            Self::Consolidation => write!(f, "consolidation"),
        }
    }
}

/// Kind tag of a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Evaluation,
    Consolidation,
    Error,
}

impl From<RequestStage> for RequestKind {
    fn from(stage: RequestStage) -> Self {
        match stage {
            RequestStage::Evaluation => Self::Evaluation,
            RequestStage::Consolidation => Self::Consolidation,
        }
    }
}

/// One model request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestLogEntry {
    pub timestamp: DateTime<Utc>,
    pub model: String,
    pub kind: RequestKind,

    /// Step that issued the request, also set on error entries
    pub stage: RequestStage,

    /// First 200 characters of the prompt, `...` appended when cut
    pub prompt: String,
    pub prompt_chars: usize,

    pub response: String,
    pub response_chars: usize,

    pub tokens_in: u32,
    pub tokens_out: u32,
    pub tokens_total: u32,

    pub elapsed_ms: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RequestLogEntry {
    /// Entry for a successful request.
    pub fn success(
        stage: RequestStage,
        model: &str,
        prompt: &str,
        response: &str,
        usage: TokenUsage,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            model: model.to_string(),
            kind: stage.into(),
            stage,
            prompt: preview(prompt),
            prompt_chars: prompt.chars().count(),
            response: response.to_string(),
            response_chars: response.chars().count(),
            tokens_in: usage.prompt_tokens,
            tokens_out: usage.completion_tokens,
            tokens_total: usage.total(),
            elapsed_ms,
            error: None,
        }
    }

    /// Entry for a failed request. Token counts are zero.
    pub fn failure(
        stage: RequestStage,
        model: &str,
        prompt: &str,
        error: &ProviderError,
        elapsed_ms: u64,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            model: model.to_string(),
            kind: RequestKind::Error,
            stage,
            prompt: preview(prompt),
            prompt_chars: prompt.chars().count(),
            response: format!("Error: {}", error),
            response_chars: 0,
            tokens_in: 0,
            tokens_out: 0,
            tokens_total: 0,
            elapsed_ms,
            error: Some(error.to_string()),
        }
    }
}

/// Truncate a prompt for audit storage.
pub fn preview(prompt: &str) -> String {
    if prompt.chars().count() > PROMPT_PREVIEW_CHARS {
        let head: String = prompt.chars().take(PROMPT_PREVIEW_CHARS).collect();
        format!("{}...", head)
    } else {
        prompt.to_string()
    }
}

/// Aggregated usage over a log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub requests: usize,
    pub evaluations: usize,
    pub consolidations: usize,
    pub errors: usize,
    pub tokens_in: u64,
    pub tokens_out: u64,
    pub tokens_total: u64,
}

impl UsageSummary {
    fn add(&mut self, entry: &RequestLogEntry) {
        self.requests += 1;
        match entry.kind {
            RequestKind::Evaluation => self.evaluations += 1,
            RequestKind::Consolidation => self.consolidations += 1,
            RequestKind::Error => self.errors += 1,
        }
        self.tokens_in += u64::from(entry.tokens_in);
        self.tokens_out += u64::from(entry.tokens_out);
        self.tokens_total += u64::from(entry.tokens_total);
    }
}

/// Shared handle to a run's request log.
#[derive(Debug, Clone, Default)]
pub struct RequestLog {
    entries: Arc<Mutex<Vec<RequestLogEntry>>>,
}

impl RequestLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry.
    pub fn append(&self, entry: RequestLogEntry) {
        self.entries.lock().push(entry);
    }

    /// Copy of all entries so far.
    pub fn entries(&self) -> Vec<RequestLogEntry> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn usage(&self) -> UsageSummary {
        let entries = self.entries.lock();
        let mut summary = UsageSummary::default();
        for entry in entries.iter() {
            summary.add(entry);
        }
        summary
    }

    /// Drop all entries, e.g. before reusing an analyzer for a new run.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Serialise the entries as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&*self.entries.lock())
    }
}
