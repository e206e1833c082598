//! # scriptlens-core
//!
//! Deterministic building blocks for reviewing a video script against a
//! list of user-defined criteria.
//!
//! This crate never talks to a model. It owns:
//! - The criteria file grammar and the [`Criterion`] type
//! - The [`Chunker`] that splits long scripts into model-sized parts
//! - Verdict classification over the marker convention
//! - The plain-text report and the run summary
//!
//! The LLM-backed evaluation lives in `scriptlens-runtime`.
//!
//! ## Example
//!
//! ```rust
//! use scriptlens_core::{parse_criteria, Chunker};
//!
//! let criteria = parse_criteria("Clarity\nIs the intro clear?\n");
//! assert_eq!(criteria[0].title, "Clarity");
//!
//! let parts = Chunker::new(8000).split("A short script.");
//! assert_eq!(parts.len(), 1);
//! ```

pub mod chunker;
pub mod criterion;
pub mod report;
pub mod script;
pub mod summary;
pub mod types;
pub mod verdict;

// Re-export main types at crate root
pub use chunker::{split_script, Chunker, DEFAULT_MAX_CHARS};
pub use criterion::{
    load_criteria, parse_criteria, select_criteria, Criterion, CriterionError,
    DEFAULT_CRITERIA_FILE,
};
pub use report::{render_report, report_file_name, write_report, ReportError};
pub use script::{Script, ScriptStats};
pub use summary::{Rating, RunSummary};
pub use types::{AnalysisResult, ScriptPart};
pub use verdict::{
    VerdictClass, APPROVED_MARKER, CONSOLIDATION_ERROR_PREFIX, NOT_MET_MARKER,
    PARTIALLY_MET_MARKER, PART_ERROR_PREFIX,
};
