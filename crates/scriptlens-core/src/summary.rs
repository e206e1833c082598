//! Run summary: approval counts and an overall score.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::AnalysisResult;
use crate::verdict::VerdictClass;

/// Overall rating derived from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    /// Score of at least 80%
    Excellent,
    /// Score of at least 60%
    Good,
    NeedsWork,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            Self::Excellent
        } else if score >= 60.0 {
            Self::Good
        } else {
            Self::NeedsWork
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Excellent => write!(f, "Excellent"),
            Self::Good => write!(f, "Good"),
            Self::NeedsWork => write!(f, "Needs work"),
        }
    }
}

/// Counts over a result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub approved: usize,
    pub not_met: usize,
    pub partially_met: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn from_results(results: &[AnalysisResult]) -> Self {
        let mut summary = Self {
            total: results.len(),
            ..Default::default()
        };

        for result in results {
            match result.class() {
                VerdictClass::Approved => summary.approved += 1,
                VerdictClass::NotMet => summary.not_met += 1,
                VerdictClass::PartiallyMet => summary.partially_met += 1,
                VerdictClass::Error => summary.errors += 1,
            }
        }

        summary
    }

    /// Criteria that are not approved.
    pub fn needs_attention(&self) -> usize {
        self.total - self.approved
    }

    /// Approved share in percent. Zero for an empty run.
    pub fn score(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.approved as f64 / self.total as f64 * 100.0
    }

    pub fn rating(&self) -> Rating {
        Rating::from_score(self.score())
    }
}
