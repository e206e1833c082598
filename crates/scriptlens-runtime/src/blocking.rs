//! Synchronous facade over [`Analyzer`].
//!
//! For callers without an async runtime. Owns a multi-thread tokio runtime
//! and blocks on it, so the contract and logging are the same as the async
//! API.

use std::path::Path;

use scriptlens_core::{AnalysisResult, Criterion, Script};
use tokio::runtime::{Builder, Runtime};

use crate::log::RequestLog;
use crate::orchestrator::Analyzer;
use crate::RuntimeError;

pub struct BlockingAnalyzer {
    runtime: Runtime,
    analyzer: Analyzer,
}

impl BlockingAnalyzer {
    /// Must not be called from inside an async context.
    pub fn new(analyzer: Analyzer) -> Result<Self, RuntimeError> {
        let runtime = Builder::new_multi_thread().enable_all().build()?;
        Ok(Self { runtime, analyzer })
    }

    pub fn analyze(&self, script: &Script, criteria: &[Criterion]) -> Option<Vec<AnalysisResult>> {
        self.runtime.block_on(self.analyzer.analyze(script, criteria))
    }

    pub fn analyze_selected(
        &self,
        script: &Script,
        criteria: &[Criterion],
        positions: &[usize],
    ) -> Option<Vec<AnalysisResult>> {
        self.runtime
            .block_on(self.analyzer.analyze_selected(script, criteria, positions))
    }

    pub fn analyze_files(
        &self,
        script_path: impl AsRef<Path>,
        criteria_path: impl AsRef<Path>,
    ) -> Option<Vec<AnalysisResult>> {
        self.runtime
            .block_on(self.analyzer.analyze_files(script_path, criteria_path))
    }

    pub fn log(&self) -> &RequestLog {
        self.analyzer.log()
    }

    pub fn into_inner(self) -> Analyzer {
        self.analyzer
    }
}
