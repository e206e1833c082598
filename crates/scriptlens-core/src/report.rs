//! Plain-text analysis report.
//!
//! Layout:
//!
//! ```text
//! ================================================================================
//! SCRIPT ANALYSIS REPORT
//! ================================================================================
//!
//! Analyzed file: roteiro.txt
//! Analysis date: 19/10/2026 14:03:11
//! Criteria analyzed: 2
//!
//! CRITERION 1: Clarity
//! ----------------------------------------
//! Analysis:
//! ✅ APROVADO
//!
//! ================================================================================
//!
//! ```

use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::types::AnalysisResult;

const BANNER_WIDTH: usize = 80;
const RULE_WIDTH: usize = 40;

/// Errors from writing a report file.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Render the report text.
pub fn render_report(
    results: &[AnalysisResult],
    source_name: &str,
    generated_at: &DateTime<Local>,
) -> String {
    let banner = "=".repeat(BANNER_WIDTH);
    let rule = "-".repeat(RULE_WIDTH);

    let mut out = format!(
        "{banner}\nSCRIPT ANALYSIS REPORT\n{banner}\n\n\
         Analyzed file: {source_name}\n\
         Analysis date: {date}\n\
         Criteria analyzed: {count}\n\n",
        date = generated_at.format("%d/%m/%Y %H:%M:%S"),
        count = results.len(),
    );

    for (i, result) in results.iter().enumerate() {
        out.push_str(&format!(
            "CRITERION {}: {}\n{}\nAnalysis:\n",
            i + 1,
            result.criterion.title,
            rule
        ));
        out.push_str(&result.verdict);
        out.push_str(&format!("\n\n{}\n\n", banner));
    }

    out
}

/// File name for a report generated at `at`.
pub fn report_file_name(at: &DateTime<Local>) -> String {
    format!("analysis_report_{}.txt", at.format("%Y%m%d_%H%M%S"))
}

/// Write the report into `dir` and return its path.
///
/// An empty result set writes nothing and returns `None`.
pub fn write_report(
    results: &[AnalysisResult],
    source_name: &str,
    dir: impl AsRef<Path>,
) -> Result<Option<PathBuf>, ReportError> {
    if results.is_empty() {
        return Ok(None);
    }

    let now = Local::now();
    let path = dir.as_ref().join(report_file_name(&now));
    let text = render_report(results, source_name, &now);

    fs::write(&path, text).map_err(|source| ReportError::Write {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), criteria = results.len(), "Report written");
    Ok(Some(path))
}
