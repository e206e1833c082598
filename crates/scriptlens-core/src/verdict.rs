//! Verdict marker convention and classification.
//!
//! Verdicts are free text. The only structure is a marker convention the
//! prompts ask the model to follow: the approval marker alone when the
//! criterion is fully met, otherwise a not-met or partially-met marker
//! followed by an explanation and suggestions.
//!
//! Classification here is for presentation. The runtime returns verdict
//! text untouched.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Answer expected when a criterion is fully met.
pub const APPROVED_MARKER: &str = "✅ APROVADO";

/// Marker for a criterion that is not met.
pub const NOT_MET_MARKER: &str = "❌ NÃO ATENDE";

/// Marker for a criterion that is partially met.
pub const PARTIALLY_MET_MARKER: &str = "⚠️ ATENDE PARCIALMENTE";

/// Prefix of the verdict synthesised when a part evaluation fails.
pub const PART_ERROR_PREFIX: &str = "Error analyzing part:";

/// Prefix of the verdict synthesised when a consolidation fails.
pub const CONSOLIDATION_ERROR_PREFIX: &str = "Error consolidating:";

lazy_static! {
    /// Approval marker, tolerant to spacing after the emoji
    static ref APPROVED_PATTERN: Regex = Regex::new(r"✅\s*APROVADO").unwrap();
}

/// Structured reading of a verdict text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictClass {
    Approved,
    NotMet,
    PartiallyMet,
    /// The provider call failed and the text carries the error
    Error,
}

impl VerdictClass {
    /// Classify verdict text.
    ///
    /// Error prefixes win, then the approval marker, then the literal
    /// not-met marker. Anything else is treated as partially met.
    pub fn classify(text: &str) -> Self {
        let trimmed = text.trim_start();
        if is_error_verdict(trimmed) {
            return Self::Error;
        }
        if APPROVED_PATTERN.is_match(text) {
            return Self::Approved;
        }
        if text.contains(NOT_MET_MARKER) {
            return Self::NotMet;
        }
        Self::PartiallyMet
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::NotMet => "not met",
            Self::PartiallyMet => "partially met",
            Self::Error => "error",
        }
    }

    pub fn needs_attention(&self) -> bool {
        !matches!(self, Self::Approved)
    }
}

impl fmt::Display for VerdictClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Whether the text is a synthesised provider-failure verdict.
pub fn is_error_verdict(text: &str) -> bool {
    text.starts_with(PART_ERROR_PREFIX) || text.starts_with(CONSOLIDATION_ERROR_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approved() {
        assert_eq!(VerdictClass::classify("✅ APROVADO"), VerdictClass::Approved);
        assert_eq!(VerdictClass::classify("  ✅APROVADO\n"), VerdictClass::Approved);
    }

    #[test]
    fn test_not_met() {
        let text = "❌ NÃO ATENDE\nThe intro never states the topic.";
        assert_eq!(VerdictClass::classify(text), VerdictClass::NotMet);

        let consolidated = "Final verdict:\n❌ NÃO ATENDE\nParts 2 and 3 drift.";
        assert_eq!(VerdictClass::classify(consolidated), VerdictClass::NotMet);
    }

    #[test]
    fn test_partially_met_mentioning_not_met_wording() {
        let text = "⚠️ ATENDE PARCIALMENTE\nO gancho é bom, mas o final não atende ao público.";
        assert_eq!(VerdictClass::classify(text), VerdictClass::PartiallyMet);

        let text = "⚠️ ATENDE PARCIALMENTE\nSugestão: troque ❌ por um texto neutro.";
        assert_eq!(VerdictClass::classify(text), VerdictClass::PartiallyMet);

        assert_eq!(VerdictClass::classify("Não Atende"), VerdictClass::PartiallyMet);
    }

    #[test]
    fn test_partially_met() {
        let text = "⚠️ ATENDE PARCIALMENTE\nGood hook, weak call to action.";
        assert_eq!(VerdictClass::classify(text), VerdictClass::PartiallyMet);
        assert_eq!(VerdictClass::classify("free-form answer"), VerdictClass::PartiallyMet);
    }

    #[test]
    fn test_error_prefix_wins() {
        let text = format!("{} upstream said {}", PART_ERROR_PREFIX, APPROVED_MARKER);
        assert_eq!(VerdictClass::classify(&text), VerdictClass::Error);

        let text = format!("{} timeout", CONSOLIDATION_ERROR_PREFIX);
        assert_eq!(VerdictClass::classify(&text), VerdictClass::Error);
    }

    #[test]
    fn test_needs_attention() {
        assert!(!VerdictClass::Approved.needs_attention());
        assert!(VerdictClass::Error.needs_attention());
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&VerdictClass::PartiallyMet).unwrap();
        assert_eq!(json, "\"partially_met\"");
    }
}
