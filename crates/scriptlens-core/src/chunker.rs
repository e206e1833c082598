//! Splits scripts into model-sized parts on word boundaries.
//!
//! Lengths are counted in characters, not bytes. Words are never split:
//! a single word longer than the limit becomes its own oversized part.

use crate::types::ScriptPart;

/// Default part size in characters.
pub const DEFAULT_MAX_CHARS: usize = 8000;

/// Greedy word-boundary splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Chunker {
    max_chars: usize,
}

impl Default for Chunker {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHARS)
    }
}

impl Chunker {
    /// Create a chunker with the given part size.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }

    /// The part size limit in characters.
    pub fn max_chars(&self) -> usize {
        self.max_chars
    }

    /// Split a script into ordered parts numbered from 1.
    ///
    /// A script that fits is returned whole and untouched. Otherwise words
    /// are accumulated while `len(part) + 1 + len(word) <= max_chars`; the
    /// part is closed when the next word would overflow it. A script made
    /// only of whitespace that exceeds the limit has no words and yields no
    /// parts.
    pub fn split(&self, script: &str) -> Vec<ScriptPart> {
        if script.chars().count() <= self.max_chars {
            return vec![ScriptPart::new(1, script)];
        }

        let mut texts: Vec<String> = Vec::new();
        let mut current = String::new();
        let mut current_len = 0usize;

        for word in script.split_whitespace() {
            let word_len = word.chars().count();

            if current_len + 1 + word_len > self.max_chars {
                if !current.is_empty() {
                    texts.push(std::mem::take(&mut current));
                }
                current.push_str(word);
                current_len = word_len;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                    current_len += 1;
                }
                current.push_str(word);
                current_len += word_len;
            }
        }

        if !current.is_empty() {
            texts.push(current);
        }

        texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| ScriptPart::new(i + 1, text))
            .collect()
    }
}

/// Split `script` with the given limit. See [`Chunker::split`].
pub fn split_script(script: &str, max_chars: usize) -> Vec<ScriptPart> {
    Chunker::new(max_chars).split(script)
}
