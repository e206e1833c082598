//! Consolidator: merges part verdicts for one criterion.

use scriptlens_core::CONSOLIDATION_ERROR_PREFIX;

use crate::client::ModelClient;
use crate::log::{RequestLog, RequestStage};
use crate::prompts::{consolidation_prompt, CONSOLIDATION_SYSTEM_PROMPT};
use crate::providers::CompletionConfig;

/// Issues the follow-up request that turns N part verdicts into one.
///
/// Only used when a script was split into more than one part. Failures
/// follow the evaluator's policy: error text plus an error log entry.
#[derive(Clone)]
pub struct Consolidator {
    client: ModelClient,
    config: CompletionConfig,
}

impl Consolidator {
    pub fn new(client: ModelClient, config: CompletionConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }

    /// `part_verdicts` must be in part order; they are labelled
    /// `Part 1`, `Part 2`, ... in that order.
    pub async fn consolidate(
        &self,
        part_verdicts: &[String],
        criterion_description: &str,
        log: &RequestLog,
    ) -> String {
        let prompt = consolidation_prompt(criterion_description, part_verdicts);
        match self
            .client
            .request(
                RequestStage::Consolidation,
                CONSOLIDATION_SYSTEM_PROMPT,
                &prompt,
                &self.config,
                log,
            )
            .await
        {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::warn!(parts = part_verdicts.len(), error = %e, "Consolidation failed");
                format!("{} {}", CONSOLIDATION_ERROR_PREFIX, e)
            }
        }
    }
}
