//! Script text and its basic statistics.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// The script under review. Read-only once loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Script {
    text: String,
}

impl Script {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    /// Read a script file. Unreadable files yield `None`.
    pub fn load(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => Some(Self::new(text)),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Script file not readable");
                None
            }
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// True when there is nothing to analyse.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn stats(&self) -> ScriptStats {
        ScriptStats::of(&self.text)
    }
}

impl From<&str> for Script {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Script {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}

/// Size figures shown before an analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptStats {
    pub chars: usize,
    pub words: usize,
    pub lines: usize,
}

impl ScriptStats {
    pub fn of(text: &str) -> Self {
        Self {
            chars: text.chars().count(),
            words: text.split_whitespace().count(),
            lines: text.lines().count(),
        }
    }
}
