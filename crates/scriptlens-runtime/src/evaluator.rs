//! Criterion Evaluator: one script part against one criterion.

use scriptlens_core::{ScriptPart, PART_ERROR_PREFIX};

use crate::client::ModelClient;
use crate::log::{RequestLog, RequestStage};
use crate::prompts::{evaluation_prompt, EVALUATION_SYSTEM_PROMPT};
use crate::providers::CompletionConfig;

/// Evaluates (part, criterion) pairs.
///
/// Never fails: a provider error comes back as verdict text starting with
/// [`PART_ERROR_PREFIX`], and the log gets an error entry.
#[derive(Clone)]
pub struct CriterionEvaluator {
    client: ModelClient,
    config: CompletionConfig,
}

impl CriterionEvaluator {
    pub fn new(client: ModelClient, config: CompletionConfig) -> Self {
        Self { client, config }
    }

    /// Completion settings used for every evaluation.
    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// Evaluate one part. The response is returned verbatim.
    pub async fn evaluate(
        &self,
        part: &ScriptPart,
        criterion_description: &str,
        log: &RequestLog,
    ) -> String {
        let prompt = evaluation_prompt(criterion_description, &part.text);
        match self
            .client
            .request(
                RequestStage::Evaluation,
                EVALUATION_SYSTEM_PROMPT,
                &prompt,
                &self.config,
                log,
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(part = part.index, error = %e, "Part evaluation failed");
                format!("{} {}", PART_ERROR_PREFIX, e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::ScriptedProvider;
    use crate::log::RequestKind;
    use crate::providers::ProviderError;
    use scriptlens_core::VerdictClass;
    use std::sync::Arc;

    fn evaluator(provider: Arc<ScriptedProvider>) -> CriterionEvaluator {
        CriterionEvaluator::new(ModelClient::new(provider), CompletionConfig::default())
    }

    #[tokio::test]
    async fn test_returns_response_verbatim() {
        let raw = "⚠️ ATENDE PARCIALMENTE\nThe hook is weak.\nSuggestion: open with a question.";
        let provider = Arc::new(ScriptedProvider::fixed(raw));
        let log = RequestLog::new();

        let verdict = evaluator(provider.clone())
            .evaluate(&ScriptPart::new(1, "Hello viewers"), "Is the intro clear?", &log)
            .await;

        assert_eq!(verdict, raw);
        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("Is the intro clear?"));
        assert!(prompt.contains("Hello viewers"));

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, RequestKind::Evaluation);
        assert_eq!(entries[0].prompt_chars, prompt.chars().count());
    }

    #[tokio::test]
    async fn test_provider_error_becomes_error_verdict() {
        let provider = Arc::new(ScriptedProvider::new(|_| {
            Err(ProviderError::Status {
                status: 500,
                message: "upstream down".into(),
            })
        }));
        let log = RequestLog::new();

        let verdict = evaluator(provider)
            .evaluate(&ScriptPart::new(2, "text"), "criterion", &log)
            .await;

        assert!(verdict.starts_with("Error analyzing part:"));
        assert!(verdict.contains("upstream down"));
        assert_eq!(VerdictClass::classify(&verdict), VerdictClass::Error);

        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, RequestKind::Error);
        assert_eq!(entries[0].tokens_total, 0);
    }
}
