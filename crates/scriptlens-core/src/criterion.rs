//! Evaluation criteria and the criteria file grammar.
//!
//! A criteria file is plain text made of blocks separated by blank lines.
//! The first line of a block is the title; the remaining lines are joined
//! with single spaces to form the description:
//!
//! ```text
//! Clarity
//! Is the intro clear?
//!
//! Pacing
//! Does it stay
//! on topic?
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// File the CLI reads criteria from when none is given.
pub const DEFAULT_CRITERIA_FILE: &str = "criterios.txt";

/// Title length used when a bare string is promoted to a criterion.
const BARE_TITLE_CHARS: usize = 50;

/// Errors from building a criterion by hand.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CriterionError {
    #[error("Criterion title must not be empty")]
    EmptyTitle,
}

/// A named rubric item the script is judged against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Short name shown in reports
    pub title: String,

    /// What the model is asked to check
    pub description: String,
}

impl Criterion {
    /// Create a criterion. The title is trimmed and must not be empty.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Result<Self, CriterionError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(CriterionError::EmptyTitle);
        }

        Ok(Self {
            title,
            description: description.into().trim().to_string(),
        })
    }

    /// Promote a bare criterion string into the structured form.
    ///
    /// The whole text becomes the description and its first 50 characters
    /// the title.
    pub fn from_bare(text: &str) -> Result<Self, CriterionError> {
        let text = text.trim();
        let title: String = text.chars().take(BARE_TITLE_CHARS).collect();
        Self::new(title, text)
    }
}

/// Parse criteria from the text of a criteria file.
///
/// Lines are trimmed before parsing, so whitespace-only lines count as
/// blank. Any number of blank lines may separate blocks. A block with only
/// a title yields an empty description.
pub fn parse_criteria(content: &str) -> Vec<Criterion> {
    let mut criteria = Vec::new();
    let mut lines = content.lines().map(str::trim).peekable();

    while let Some(line) = lines.next() {
        if line.is_empty() {
            continue;
        }

        let title = line.to_string();
        let mut description = Vec::new();
        while let Some(next) = lines.next_if(|l| !l.is_empty()) {
            description.push(next);
        }

        criteria.push(Criterion {
            title,
            description: description.join(" ").trim().to_string(),
        });
    }

    criteria
}

/// Read and parse a criteria file.
///
/// A missing or unreadable file degrades to an empty list so callers can
/// report "no criteria" instead of failing.
pub fn load_criteria(path: impl AsRef<Path>) -> Vec<Criterion> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(content) => {
            let criteria = parse_criteria(&content);
            tracing::debug!(path = %path.display(), count = criteria.len(), "Loaded criteria");
            criteria
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Criteria file not readable");
            Vec::new()
        }
    }
}

/// Keep the criteria at the given 1-based positions, in input order.
///
/// Out-of-range and duplicate positions are ignored.
pub fn select_criteria(criteria: &[Criterion], positions: &[usize]) -> Vec<Criterion> {
    criteria
        .iter()
        .enumerate()
        .filter(|(i, _)| positions.contains(&(i + 1)))
        .map(|(_, c)| c.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_blocks() {
        let criteria =
            parse_criteria("Clarity\nIs the intro clear?\n\nPacing\nDoes it stay on topic?\n");

        assert_eq!(
            criteria,
            vec![
                Criterion {
                    title: "Clarity".to_string(),
                    description: "Is the intro clear?".to_string(),
                },
                Criterion {
                    title: "Pacing".to_string(),
                    description: "Does it stay on topic?".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_multiline_description_joined_with_spaces() {
        let criteria = parse_criteria("Hook\nFirst line   \n  second line\nthird\n");
        assert_eq!(criteria.len(), 1);
        assert_eq!(criteria[0].description, "First line second line third");
    }

    #[test]
    fn test_multiple_blank_lines_between_blocks() {
        let criteria = parse_criteria("\n\nA\ndesc a\n\n\n   \n\nB\ndesc b\n\n");
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[1].title, "B");
        assert_eq!(criteria[1].description, "desc b");
    }

    #[test]
    fn test_title_only_block() {
        let criteria = parse_criteria("Lonely title\n\nOther\ntext");
        assert_eq!(criteria[0].description, "");
        assert_eq!(criteria[1].description, "text");
    }

    #[test]
    fn test_empty_content() {
        assert!(parse_criteria("").is_empty());
        assert!(parse_criteria("\n  \n\t\n").is_empty());
    }

    #[test]
    fn test_crlf_lines() {
        let criteria = parse_criteria("Clarity\r\nIs it clear?\r\n\r\nPacing\r\nFast?\r\n");
        assert_eq!(criteria.len(), 2);
        assert_eq!(criteria[0].description, "Is it clear?");
    }

    #[test]
    fn test_new_rejects_empty_title() {
        assert_eq!(Criterion::new("  ", "x"), Err(CriterionError::EmptyTitle));
        assert!(Criterion::new("Title", "").is_ok());
    }

    #[test]
    fn test_from_bare_truncates_title() {
        let text = "a".repeat(80);
        let criterion = Criterion::from_bare(&text).unwrap();
        assert_eq!(criterion.title.chars().count(), 50);
        assert_eq!(criterion.description, text);
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let criteria = load_criteria("/definitely/not/here/criterios.txt");
        assert!(criteria.is_empty());
    }

    #[test]
    fn test_select_keeps_input_order() {
        let criteria = parse_criteria("A\na\n\nB\nb\n\nC\nc\n");
        let selected = select_criteria(&criteria, &[3, 1, 9]);
        let titles: Vec<_> = selected.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "C"]);
    }
}
