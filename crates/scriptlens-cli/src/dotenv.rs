//! Minimal `.env` loader.
//!
//! `KEY=VALUE` per line. Blank lines and `#` comments are skipped, an
//! optional `export ` prefix and matching surrounding quotes are removed.
//! Variables already present in the environment win.

use std::path::Path;

/// Parse `.env` content into key/value pairs, in file order.
pub fn parse(content: &str) -> Vec<(String, String)> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Load a `.env` file into the process environment.
///
/// Returns the number of variables set. A missing file sets nothing.
/// Must run before any other thread is started.
pub fn load(path: impl AsRef<Path>) -> usize {
    let Ok(content) = std::fs::read_to_string(path.as_ref()) else {
        return 0;
    };

    let mut set = 0;
    for (key, value) in parse(&content) {
        if std::env::var_os(&key).is_none() {
            std::env::set_var(&key, value);
            set += 1;
        }
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs_comments_and_quotes() {
        let content = r#"
# credentials
OPENAI_API_KEY=sk-test
export SCRIPTLENS_MODEL="gpt-4o-mini"
QUOTED='single'
EMPTY=
not a pair
=novalue
"#;
        let pairs = parse(content);
        assert_eq!(
            pairs,
            vec![
                ("OPENAI_API_KEY".to_string(), "sk-test".to_string()),
                ("SCRIPTLENS_MODEL".to_string(), "gpt-4o-mini".to_string()),
                ("QUOTED".to_string(), "single".to_string()),
                ("EMPTY".to_string(), String::new()),
            ]
        );
    }

    #[test]
    fn existing_variables_are_kept() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".env");
        std::fs::write(
            &path,
            "SCRIPTLENS_DOTENV_TEST_KEEP=from-file\nSCRIPTLENS_DOTENV_TEST_NEW=new\n",
        )
        .unwrap();
        std::env::set_var("SCRIPTLENS_DOTENV_TEST_KEEP", "from-env");

        let set = load(&path);

        assert_eq!(set, 1);
        assert_eq!(std::env::var("SCRIPTLENS_DOTENV_TEST_KEEP").unwrap(), "from-env");
        assert_eq!(std::env::var("SCRIPTLENS_DOTENV_TEST_NEW").unwrap(), "new");
    }

    #[test]
    fn missing_file_sets_nothing() {
        assert_eq!(load("/nonexistent/.env"), 0);
    }
}
