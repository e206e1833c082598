//! Prompt templates for criterion evaluation and consolidation.
//!
//! The verdict markers are part of the output contract: the approval
//! marker alone means the criterion is fully met. The templates are the
//! only place that convention is enforced.

use scriptlens_core::{APPROVED_MARKER, NOT_MET_MARKER, PARTIALLY_MET_MARKER};

/// System prompt for evaluating one script part.
pub const EVALUATION_SYSTEM_PROMPT: &str =
    "You are an expert in video script analysis. Be precise and concise.";

/// System prompt for merging part verdicts.
pub const CONSOLIDATION_SYSTEM_PROMPT: &str = "You are an expert in video script analysis.";

/// Build the user prompt for one (part, criterion) pair.
pub fn evaluation_prompt(criterion_description: &str, part_text: &str) -> String {
    format!(
        r#"Analyze the following script against the specific criterion below.

CRITERION TO ANALYZE: {criterion_description}

SCRIPT:
{part_text}

IMPORTANT INSTRUCTIONS:
- If the criterion is FULLY MET, answer ONLY: "{APPROVED_MARKER}"
- NEVER add explanations when approved
- If there are problems, provide:
  1. "{NOT_MET_MARKER}" or "{PARTIALLY_MET_MARKER}"
  2. An explanation of the problem
  3. Improvement suggestions

Be rigorously objective."#
    )
}

/// Label part verdicts as `Part 1: ...`, `Part 2: ...` in the given order.
pub fn label_part_verdicts(verdicts: &[String]) -> String {
    verdicts
        .iter()
        .enumerate()
        .map(|(i, verdict)| format!("Part {}: {}", i + 1, verdict))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user prompt that merges part verdicts into a final verdict.
pub fn consolidation_prompt(criterion_description: &str, verdicts: &[String]) -> String {
    let analyses = label_part_verdicts(verdicts);
    format!(
        r#"Based on the analyses of the script parts below, give a final evaluation.

CRITERION: {criterion_description}

PART ANALYSES:
{analyses}

INSTRUCTIONS:
- If ALL parts were approved, answer ONLY: "{APPROVED_MARKER}"
- If any part has problems, provide:
  1. A final verdict: "{NOT_MET_MARKER}" or "{PARTIALLY_MET_MARKER}"
  2. A summary of the main problems found across the parts
  3. Specific improvement suggestions

Be objective and constructive."#
    )
}
