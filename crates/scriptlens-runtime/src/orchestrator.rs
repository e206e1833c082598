//! Orchestrator: runs every criterion over the chunked script.
//!
//! Per criterion:
//! 1. The script is chunked once per run and the parts are shared.
//! 2. A single part is evaluated directly; its verdict is final.
//! 3. Several parts are each evaluated (fan-out), then consolidated in
//!    part order (fan-in).
//!
//! In [`ExecutionMode::Concurrent`] every criterion and every part is a
//! spawned task. Task handles are joined with `join_all`, which yields
//! outputs in handle order, so completion order never leaks into results.

use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;

use scriptlens_core::{
    load_criteria, select_criteria, AnalysisResult, Chunker, Criterion, Script, ScriptPart,
    PART_ERROR_PREFIX,
};

use crate::cache::VerdictCache;
use crate::client::ModelClient;
use crate::config::{ExecutionMode, RuntimeConfig};
use crate::consolidator::Consolidator;
use crate::evaluator::CriterionEvaluator;
use crate::log::{RequestLog, RequestStage};
use crate::providers::{LlmProvider, RetryingProvider};
use crate::RuntimeError;

/// Receives progress events during a run.
///
/// In concurrent mode events arrive from several tasks in completion order.
pub trait ProgressObserver: Send + Sync {
    fn criterion_started(&self, _index: usize, _total: usize, _criterion: &Criterion) {}

    fn part_evaluated(&self, _criterion_index: usize, _part: usize, _parts: usize) {}

    fn criterion_finished(&self, _index: usize, _total: usize, _result: &AnalysisResult) {}
}

/// Reports progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingProgress;

impl ProgressObserver for TracingProgress {
    fn criterion_started(&self, index: usize, total: usize, criterion: &Criterion) {
        tracing::info!(criterion = %criterion.title, "Analyzing criterion {}/{}", index, total);
    }

    fn part_evaluated(&self, criterion_index: usize, part: usize, parts: usize) {
        tracing::debug!(criterion = criterion_index, part, parts, "Part evaluated");
    }

    fn criterion_finished(&self, index: usize, total: usize, result: &AnalysisResult) {
        tracing::info!(
            criterion = %result.criterion.title,
            verdict = %result.class(),
            "Finished criterion {}/{}",
            index,
            total
        );
    }
}

/// Everything a task needs, cheap to clone into `tokio::spawn`.
#[derive(Clone)]
struct Pipeline {
    evaluator: Arc<CriterionEvaluator>,
    consolidator: Arc<Consolidator>,
    log: RequestLog,
    progress: Arc<dyn ProgressObserver>,
}

impl Pipeline {
    async fn run_sequential(
        &self,
        index: usize,
        total: usize,
        criterion: Criterion,
        parts: &[ScriptPart],
    ) -> AnalysisResult {
        self.progress.criterion_started(index, total, &criterion);

        let mut verdicts = Vec::with_capacity(parts.len());
        for part in parts {
            let verdict = self
                .evaluator
                .evaluate(part, &criterion.description, &self.log)
                .await;
            self.progress.part_evaluated(index, part.index, parts.len());
            verdicts.push(verdict);
        }

        self.finish(index, total, criterion, verdicts).await
    }

    async fn run_concurrent(
        self,
        index: usize,
        total: usize,
        criterion: Criterion,
        parts: Arc<Vec<ScriptPart>>,
    ) -> AnalysisResult {
        self.progress.criterion_started(index, total, &criterion);

        let verdicts = if parts.len() == 1 {
            let verdict = self
                .evaluator
                .evaluate(&parts[0], &criterion.description, &self.log)
                .await;
            self.progress.part_evaluated(index, 1, 1);
            vec![verdict]
        } else {
            let handles: Vec<_> = (0..parts.len())
                .map(|slot| {
                    let pipeline = self.clone();
                    let parts = Arc::clone(&parts);
                    let description = criterion.description.clone();
                    tokio::spawn(async move {
                        let part = &parts[slot];
                        let verdict = pipeline
                            .evaluator
                            .evaluate(part, &description, &pipeline.log)
                            .await;
                        pipeline
                            .progress
                            .part_evaluated(index, part.index, parts.len());
                        verdict
                    })
                })
                .collect();

            join_all(handles)
                .await
                .into_iter()
                .map(|joined| match joined {
                    Ok(verdict) => verdict,
                    Err(e) => {
                        tracing::warn!(criterion = index, error = %e, "Part task failed");
                        format!("{} {}", PART_ERROR_PREFIX, e)
                    }
                })
                .collect()
        };

        self.finish(index, total, criterion, verdicts).await
    }

    async fn finish(
        &self,
        index: usize,
        total: usize,
        criterion: Criterion,
        mut verdicts: Vec<String>,
    ) -> AnalysisResult {
        let verdict = if verdicts.len() == 1 {
            verdicts.remove(0)
        } else {
            self.consolidator
                .consolidate(&verdicts, &criterion.description, &self.log)
                .await
        };

        let result = AnalysisResult::new(criterion, verdict);
        self.progress.criterion_finished(index, total, &result);
        result
    }
}

/// Analyzes scripts against criteria.
///
/// One analyzer owns one request log; every provider call made through it
/// lands there. Use [`Analyzer::builder`] to construct one.
pub struct Analyzer {
    pipeline: Pipeline,
    chunker: Chunker,
    mode: ExecutionMode,
}

impl Analyzer {
    pub fn builder() -> AnalyzerBuilder {
        AnalyzerBuilder::default()
    }

    /// The run's request log.
    pub fn log(&self) -> &RequestLog {
        &self.pipeline.log
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    pub fn chunker(&self) -> Chunker {
        self.chunker
    }

    /// Analyze a script against every criterion.
    ///
    /// Returns `None` when the script is blank or there are no criteria;
    /// no provider call is made in that case. Otherwise there is exactly one
    /// result per criterion, in input order. Provider failures never abort
    /// the run; they show up as error verdict text.
    pub async fn analyze(
        &self,
        script: &Script,
        criteria: &[Criterion],
    ) -> Option<Vec<AnalysisResult>> {
        if criteria.is_empty() {
            tracing::info!("No criteria to analyze");
            return None;
        }
        if script.is_blank() {
            tracing::info!("Script is empty");
            return None;
        }

        let parts = self.chunker.split(script.text());
        if parts.is_empty() {
            tracing::info!("Script has no words to analyze");
            return None;
        }

        tracing::info!(
            criteria = criteria.len(),
            parts = parts.len(),
            mode = ?self.mode,
            "Starting analysis"
        );

        let results = match self.mode {
            ExecutionMode::Sequential => self.analyze_sequential(&parts, criteria).await,
            ExecutionMode::Concurrent => self.analyze_concurrent(parts, criteria).await,
        };

        let usage = self.pipeline.log.usage();
        tracing::info!(
            results = results.len(),
            requests = usage.requests,
            errors = usage.errors,
            tokens = usage.tokens_total,
            "Analysis finished"
        );
        Some(results)
    }

    /// Analyze only the criteria at the given 1-based positions.
    pub async fn analyze_selected(
        &self,
        script: &Script,
        criteria: &[Criterion],
        positions: &[usize],
    ) -> Option<Vec<AnalysisResult>> {
        let selected = select_criteria(criteria, positions);
        self.analyze(script, &selected).await
    }

    /// Analyze a script against a single criterion.
    pub async fn analyze_criterion(
        &self,
        script: &Script,
        criterion: &Criterion,
    ) -> Option<AnalysisResult> {
        self.analyze(script, std::slice::from_ref(criterion))
            .await
            .and_then(|mut results| results.pop())
    }

    /// Load a script file and a criteria file, then analyze.
    ///
    /// Unreadable inputs yield `None` like empty ones.
    pub async fn analyze_files(
        &self,
        script_path: impl AsRef<Path>,
        criteria_path: impl AsRef<Path>,
    ) -> Option<Vec<AnalysisResult>> {
        let script = Script::load(script_path)?;
        let criteria = load_criteria(criteria_path);
        self.analyze(&script, &criteria).await
    }

    async fn analyze_sequential(
        &self,
        parts: &[ScriptPart],
        criteria: &[Criterion],
    ) -> Vec<AnalysisResult> {
        let total = criteria.len();
        let mut results = Vec::with_capacity(total);
        for (i, criterion) in criteria.iter().enumerate() {
            results.push(
                self.pipeline
                    .run_sequential(i + 1, total, criterion.clone(), parts)
                    .await,
            );
        }
        results
    }

    async fn analyze_concurrent(
        &self,
        parts: Vec<ScriptPart>,
        criteria: &[Criterion],
    ) -> Vec<AnalysisResult> {
        let total = criteria.len();
        let parts = Arc::new(parts);

        let handles: Vec<_> = criteria
            .iter()
            .enumerate()
            .map(|(i, criterion)| {
                let pipeline = self.pipeline.clone();
                let parts = Arc::clone(&parts);
                let criterion = criterion.clone();
                tokio::spawn(pipeline.run_concurrent(i + 1, total, criterion, parts))
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .zip(criteria)
            .map(|(joined, criterion)| match joined {
                Ok(result) => result,
                Err(e) => {
                    tracing::warn!(criterion = %criterion.title, error = %e, "Criterion task failed");
                    AnalysisResult::new(
                        criterion.clone(),
                        format!("{} criterion task failed: {}", PART_ERROR_PREFIX, e),
                    )
                }
            })
            .collect()
    }
}

/// Builder for [`Analyzer`].
#[derive(Default)]
pub struct AnalyzerBuilder {
    provider: Option<Arc<dyn LlmProvider>>,
    config: RuntimeConfig,
    progress: Option<Arc<dyn ProgressObserver>>,
    log: Option<RequestLog>,
    cache: Option<Arc<VerdictCache>>,
}

impl AnalyzerBuilder {
    pub fn provider(mut self, provider: Arc<dyn LlmProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ProgressObserver>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Append to an existing log instead of a fresh one.
    pub fn log(mut self, log: RequestLog) -> Self {
        self.log = Some(log);
        self
    }

    /// Share a verdict cache between analyzers. Implies caching.
    pub fn cache(mut self, cache: Arc<VerdictCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn build(self) -> Result<Analyzer, RuntimeError> {
        self.config.validate()?;
        let provider = self.provider.ok_or_else(|| {
            RuntimeError::ProviderNotConfigured("no LLM provider given".to_string())
        })?;
        let config = self.config;

        let provider: Arc<dyn LlmProvider> =
            Arc::new(RetryingProvider::new(provider, config.max_retries));
        let mut client = ModelClient::new(provider);
        if let Some(limit) = config.max_concurrency {
            client = client.with_concurrency_limit(limit);
        }
        let cache = match self.cache {
            Some(cache) => Some(cache),
            None if config.cache_verdicts => Some(Arc::new(VerdictCache::default())),
            None => None,
        };
        if let Some(cache) = cache {
            client = client.with_cache(cache);
        }

        tracing::debug!(
            provider = client.provider_name(),
            model = %config.model,
            max_chars = config.max_chars,
            "Analyzer configured"
        );

        let evaluator = CriterionEvaluator::new(
            client.clone(),
            config.completion_config(RequestStage::Evaluation),
        );
        let consolidator =
            Consolidator::new(client, config.completion_config(RequestStage::Consolidation));

        Ok(Analyzer {
            pipeline: Pipeline {
                evaluator: Arc::new(evaluator),
                consolidator: Arc::new(consolidator),
                log: self.log.unwrap_or_default(),
                progress: self.progress.unwrap_or_else(|| Arc::new(TracingProgress)),
            },
            chunker: Chunker::new(config.max_chars),
            mode: config.mode,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedProvider;
    use crate::log::RequestKind;
    use crate::providers::ProviderError;
    use parking_lot::Mutex;
    use scriptlens_core::{VerdictClass, APPROVED_MARKER};
    use std::time::Duration;

    fn criteria(n: usize) -> Vec<Criterion> {
        (1..=n)
            .map(|i| Criterion::new(format!("Criterion {}", i), format!("Check number {}", i)).unwrap())
            .collect()
    }

    fn config(mode: ExecutionMode, max_chars: usize) -> RuntimeConfig {
        RuntimeConfig {
            mode,
            max_chars,
            max_retries: 0,
            ..Default::default()
        }
    }

    fn analyzer(provider: Arc<ScriptedProvider>, config: RuntimeConfig) -> Analyzer {
        Analyzer::builder()
            .provider(provider)
            .config(config)
            .build()
            .unwrap()
    }

    fn is_consolidation(prompt: &str) -> bool {
        prompt.contains("PART ANALYSES")
    }

    #[tokio::test]
    async fn test_one_result_per_criterion_in_order() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Concurrent] {
            let provider = Arc::new(ScriptedProvider::fixed(APPROVED_MARKER));
            let analyzer = analyzer(provider.clone(), config(mode, 8000));

            let results = analyzer
                .analyze(&Script::new("A short script."), &criteria(4))
                .await
                .unwrap();

            assert_eq!(results.len(), 4);
            for (i, result) in results.iter().enumerate() {
                assert_eq!(result.criterion.title, format!("Criterion {}", i + 1));
                assert!(result.is_approved());
            }

            // Single part: no consolidation requests.
            assert_eq!(provider.calls(), 4);
            let entries = analyzer.log().entries();
            assert_eq!(entries.len(), 4);
            assert!(entries.iter().all(|e| e.kind == RequestKind::Evaluation));
        }
    }

    #[tokio::test]
    async fn test_empty_inputs_yield_no_result() {
        let provider = Arc::new(ScriptedProvider::fixed(APPROVED_MARKER));
        let analyzer = analyzer(provider.clone(), RuntimeConfig::default());

        assert!(analyzer.analyze(&Script::new("text"), &[]).await.is_none());
        assert!(analyzer.analyze(&Script::new("  \n\t "), &criteria(2)).await.is_none());
        assert!(analyzer.analyze(&Script::new(""), &criteria(2)).await.is_none());
        assert_eq!(provider.calls(), 0);
        assert!(analyzer.log().is_empty());
    }

    #[tokio::test]
    async fn test_log_completeness_with_consolidation() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Concurrent] {
            let provider = Arc::new(ScriptedProvider::new(|prompt| {
                Ok(if is_consolidation(prompt) {
                    "❌ NÃO ATENDE\nSummary".to_string()
                } else {
                    APPROVED_MARKER.to_string()
                })
            }));
            let analyzer = analyzer(provider.clone(), config(mode, 10));

            // Three parts of at most 10 characters.
            let script = Script::new("alpha bravo charlie");
            let results = analyzer.analyze(&script, &criteria(3)).await.unwrap();

            assert_eq!(results.len(), 3);
            assert!(results
                .iter()
                .all(|r| r.class() == VerdictClass::NotMet));

            let parts = analyzer.chunker().split(script.text()).len();
            assert_eq!(parts, 3);
            let expected = 3 * (parts + 1);
            assert_eq!(provider.calls(), expected);

            let usage = analyzer.log().usage();
            assert_eq!(usage.requests, expected);
            assert_eq!(usage.evaluations, 9);
            assert_eq!(usage.consolidations, 3);
            assert_eq!(usage.errors, 0);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_consolidation_keeps_part_order() {
        let provider = Arc::new(
            ScriptedProvider::new(|prompt| {
                Ok(if is_consolidation(prompt) {
                    APPROVED_MARKER.to_string()
                } else if prompt.contains("alphaword") {
                    "verdict for first".to_string()
                } else {
                    "verdict for second".to_string()
                })
            })
            // The first part answers last.
            .with_delay(|prompt| {
                if prompt.contains("alphaword") {
                    Duration::from_millis(500)
                } else {
                    Duration::from_millis(10)
                }
            }),
        );
        let analyzer = analyzer(provider.clone(), config(ExecutionMode::Concurrent, 12));

        let results = analyzer
            .analyze(&Script::new("alphaword omegaword"), &criteria(1))
            .await
            .unwrap();
        assert_eq!(results.len(), 1);

        let prompts = provider.prompts();
        let consolidation = prompts.iter().find(|p| is_consolidation(p)).unwrap();
        let first = consolidation.find("Part 1: verdict for first").unwrap();
        let second = consolidation.find("Part 2: verdict for second").unwrap();
        assert!(first < second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_results_follow_input_order() {
        let provider = Arc::new(
            ScriptedProvider::new(|prompt| {
                Ok(if prompt.contains("Check number 1") {
                    "verdict for C1".to_string()
                } else if prompt.contains("Check number 2") {
                    "verdict for C2".to_string()
                } else {
                    "verdict for C3".to_string()
                })
            })
            // The first criterion finishes last.
            .with_delay(|prompt| {
                if prompt.contains("Check number 1") {
                    Duration::from_millis(900)
                } else {
                    Duration::from_millis(10)
                }
            }),
        );
        let analyzer = analyzer(provider.clone(), config(ExecutionMode::Concurrent, 8000));
        let criteria: Vec<Criterion> = (1..=3)
            .map(|i| Criterion::new(format!("C{}", i), format!("Check number {}", i)).unwrap())
            .collect();

        let results = analyzer
            .analyze(&Script::new("A short script."), &criteria)
            .await
            .unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.criterion.title.as_str()).collect();
        assert_eq!(titles, ["C1", "C2", "C3"]);
        for result in &results {
            assert_eq!(result.verdict, format!("verdict for {}", result.criterion.title));
        }

        // The log records completion order, so criterion 1 lands last.
        let entries = analyzer.log().entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].response, "verdict for C1");
    }

    #[tokio::test]
    async fn test_panicking_criterion_task_becomes_error_verdict() {
        let provider = Arc::new(ScriptedProvider::new(|prompt| {
            if prompt.contains("Check number 2") {
                panic!("provider blew up");
            }
            Ok(APPROVED_MARKER.to_string())
        }));
        let analyzer = analyzer(provider, config(ExecutionMode::Concurrent, 8000));

        let results = analyzer
            .analyze(&Script::new("A short script."), &criteria(3))
            .await
            .unwrap();

        assert_eq!(results.len(), 3);
        assert!(results[0].is_approved());
        assert!(results[2].is_approved());
        assert_eq!(results[1].criterion.title, "Criterion 2");
        assert!(results[1]
            .verdict
            .starts_with(&format!("{} criterion task failed:", PART_ERROR_PREFIX)));
        assert_eq!(VerdictClass::classify(&results[1].verdict), VerdictClass::Error);
    }

    #[tokio::test]
    async fn test_failed_part_is_contained() {
        for mode in [ExecutionMode::Sequential, ExecutionMode::Concurrent] {
            let provider = Arc::new(ScriptedProvider::new(|prompt| {
                if is_consolidation(prompt) {
                    Ok("⚠️ ATENDE PARCIALMENTE".to_string())
                } else if prompt.contains("omegaword") {
                    Err(ProviderError::Transport("connection reset".into()))
                } else {
                    Ok(APPROVED_MARKER.to_string())
                }
            }));
            let analyzer = analyzer(provider.clone(), config(mode, 12));

            let results = analyzer
                .analyze(&Script::new("alphaword omegaword"), &criteria(2))
                .await
                .unwrap();

            assert_eq!(results.len(), 2);
            let consolidations: Vec<_> = provider
                .prompts()
                .into_iter()
                .filter(|p| is_consolidation(p))
                .collect();
            assert_eq!(consolidations.len(), 2);
            for prompt in consolidations {
                assert!(prompt.contains("Part 1: ✅ APROVADO"));
                assert!(prompt.contains("Part 2: Error analyzing part:"));
            }

            let usage = analyzer.log().usage();
            assert_eq!(usage.requests, 6);
            assert_eq!(usage.errors, 2);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_timeout_becomes_error_verdict() {
        let provider = Arc::new(
            ScriptedProvider::fixed(APPROVED_MARKER).with_delay(|_| Duration::from_secs(120)),
        );
        let analyzer = analyzer(
            provider,
            RuntimeConfig {
                request_timeout: Duration::from_secs(5),
                max_retries: 0,
                ..Default::default()
            },
        );

        let result = analyzer
            .analyze_criterion(&Script::new("Slow script"), &criteria(1)[0])
            .await
            .unwrap();

        assert!(result.verdict.starts_with("Error analyzing part:"));
        assert!(result.verdict.contains("Timeout"));
        let entries = analyzer.log().entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, RequestKind::Error);
    }

    #[tokio::test]
    async fn test_analyze_selected_keeps_input_order() {
        let provider = Arc::new(ScriptedProvider::fixed(APPROVED_MARKER));
        let analyzer = analyzer(provider.clone(), RuntimeConfig::default());

        let results = analyzer
            .analyze_selected(&Script::new("script"), &criteria(5), &[4, 2, 9])
            .await
            .unwrap();

        let titles: Vec<_> = results.iter().map(|r| r.criterion.title.as_str()).collect();
        assert_eq!(titles, vec!["Criterion 2", "Criterion 4"]);
        assert_eq!(provider.calls(), 2);

        let none = analyzer
            .analyze_selected(&Script::new("script"), &criteria(2), &[7])
            .await;
        assert!(none.is_none());
    }

    #[derive(Default)]
    struct RecordingProgress {
        events: Mutex<Vec<String>>,
    }

    impl ProgressObserver for RecordingProgress {
        fn criterion_started(&self, index: usize, total: usize, _criterion: &Criterion) {
            self.events.lock().push(format!("start {}/{}", index, total));
        }

        fn part_evaluated(&self, criterion_index: usize, part: usize, parts: usize) {
            self.events
                .lock()
                .push(format!("part {}.{}/{}", criterion_index, part, parts));
        }

        fn criterion_finished(&self, index: usize, total: usize, _result: &AnalysisResult) {
            self.events.lock().push(format!("done {}/{}", index, total));
        }
    }

    #[tokio::test]
    async fn test_sequential_progress_order() {
        let progress = Arc::new(RecordingProgress::default());
        let analyzer = Analyzer::builder()
            .provider(Arc::new(ScriptedProvider::fixed(APPROVED_MARKER)))
            .config(config(ExecutionMode::Sequential, 12))
            .progress(progress.clone())
            .build()
            .unwrap();

        analyzer
            .analyze(&Script::new("alphaword omegaword"), &criteria(2))
            .await
            .unwrap();

        assert_eq!(
            *progress.events.lock(),
            vec![
                "start 1/2", "part 1.1/2", "part 1.2/2", "done 1/2",
                "start 2/2", "part 2.1/2", "part 2.2/2", "done 2/2",
            ]
        );
    }

    #[tokio::test]
    async fn test_cached_verdicts_skip_repeat_requests() {
        let provider = Arc::new(ScriptedProvider::fixed(APPROVED_MARKER));
        let analyzer = analyzer(
            provider.clone(),
            RuntimeConfig {
                cache_verdicts: true,
                ..Default::default()
            },
        );
        let script = Script::new("Same script twice");

        analyzer.analyze(&script, &criteria(2)).await.unwrap();
        analyzer.analyze(&script, &criteria(2)).await.unwrap();

        assert_eq!(provider.calls(), 2);
        assert_eq!(analyzer.log().len(), 2);
    }

    #[test]
    fn test_build_requires_provider() {
        let result = Analyzer::builder().build();
        assert!(matches!(result, Err(RuntimeError::ProviderNotConfigured(_))));
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = Analyzer::builder()
            .provider(Arc::new(ScriptedProvider::fixed("x")))
            .config(RuntimeConfig {
                max_chars: 0,
                ..Default::default()
            })
            .build();
        assert!(matches!(result, Err(RuntimeError::Config(_))));
    }
}
