//! Shared types for scriptlens.

use serde::{Deserialize, Serialize};

use crate::criterion::Criterion;
use crate::verdict::VerdictClass;

/// A contiguous fragment of a script produced by the chunker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptPart {
    /// Position in the script, starting at 1
    pub index: usize,

    /// The part text
    pub text: String,
}

impl ScriptPart {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Length in characters.
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// The final verdict for one criterion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// The criterion that was evaluated
    pub criterion: Criterion,

    /// Verdict text, either a single evaluation or a consolidation
    pub verdict: String,
}

impl AnalysisResult {
    pub fn new(criterion: Criterion, verdict: impl Into<String>) -> Self {
        Self {
            criterion,
            verdict: verdict.into(),
        }
    }

    /// Classify the verdict text.
    pub fn class(&self) -> VerdictClass {
        VerdictClass::classify(&self.verdict)
    }

    /// Whether the verdict carries the approval marker.
    pub fn is_approved(&self) -> bool {
        self.class() == VerdictClass::Approved
    }
}
