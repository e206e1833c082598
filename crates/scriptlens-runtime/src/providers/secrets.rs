//! Provider credentials.
//!
//! A key is wrapped in [`secrecy::SecretString`] the moment it is read and
//! only [`ApiCredential::expose`] hands it out, at the point where a request
//! is signed. `Debug` and `Display` always redact.

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Config,
    Environment,
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Config => "config",
            Self::Environment => "environment",
            Self::Programmatic => "programmatic",
        })
    }
}

/// Where to look for one credential: a provider config key first, then an
/// environment variable. Blank values count as missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CredentialLookup {
    pub label: &'static str,
    pub config_key: &'static str,
    pub env_var: &'static str,
}

impl CredentialLookup {
    pub fn resolve(&self, config: &JsonValue) -> Result<ApiCredential, ProviderError> {
        if let Some(value) = self.from_config(config) {
            return Ok(ApiCredential::new(value, CredentialSource::Config, self.label));
        }
        if let Some(value) = self.from_env() {
            return Ok(ApiCredential::new(value, CredentialSource::Environment, self.label));
        }
        Err(self.missing())
    }

    /// Environment only.
    pub fn resolve_env(&self) -> Result<ApiCredential, ProviderError> {
        self.from_env()
            .map(|value| ApiCredential::new(value, CredentialSource::Environment, self.label))
            .ok_or_else(|| self.missing())
    }

    /// Whether [`resolve`](Self::resolve) would succeed.
    pub fn is_available(&self, config: &JsonValue) -> bool {
        self.from_config(config).is_some() || self.from_env().is_some()
    }

    fn from_config(&self, config: &JsonValue) -> Option<String> {
        config[self.config_key]
            .as_str()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn from_env(&self) -> Option<String> {
        std::env::var(self.env_var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn missing(&self) -> ProviderError {
        ProviderError::NotConfigured(format!(
            "{} missing: set '{}' in provider config or the {} environment variable",
            self.label, self.config_key, self.env_var
        ))
    }
}

/// An API key that never prints itself.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    label: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, label: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            label,
        }
    }

    /// The raw key. Only for signing requests.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("label", &self.label)
            .field("source", &self.source)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, redacted)", self.label, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(env_var: &'static str) -> CredentialLookup {
        CredentialLookup {
            label: "Test key",
            config_key: "api_key",
            env_var,
        }
    }

    #[test]
    fn test_never_printed() {
        let secret = "sk-proj-super-secret-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Config, "OpenAI API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret));
        assert!(debug.contains("[REDACTED]"));

        let display = cred.to_string();
        assert!(!display.contains(secret));
        assert_eq!(display, "OpenAI API key (config, redacted)");

        assert_eq!(cred.expose(), secret);
    }

    #[test]
    fn test_config_wins_over_env() {
        std::env::set_var("SCRIPTLENS_TEST_KEY_PRIORITY", "env-key");
        let cred = lookup("SCRIPTLENS_TEST_KEY_PRIORITY")
            .resolve(&serde_json::json!({ "api_key": "config-key" }))
            .unwrap();
        std::env::remove_var("SCRIPTLENS_TEST_KEY_PRIORITY");

        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source(), CredentialSource::Config);
    }

    #[test]
    fn test_env_fallback_and_blank_config() {
        std::env::set_var("SCRIPTLENS_TEST_KEY_FALLBACK", " env-key ");
        let cred = lookup("SCRIPTLENS_TEST_KEY_FALLBACK")
            .resolve(&serde_json::json!({ "api_key": "  " }))
            .unwrap();
        std::env::remove_var("SCRIPTLENS_TEST_KEY_FALLBACK");

        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);
    }

    #[test]
    fn test_missing_names_both_places() {
        let lookup = lookup("SCRIPTLENS_NONEXISTENT_VAR_12345");
        assert!(!lookup.is_available(&serde_json::json!({})));

        let msg = lookup.resolve(&serde_json::json!({})).unwrap_err().to_string();
        assert!(msg.contains("Test key"));
        assert!(msg.contains("api_key"));
        assert!(msg.contains("SCRIPTLENS_NONEXISTENT_VAR_12345"));
    }

    #[test]
    fn test_blank_env_is_missing() {
        std::env::set_var("SCRIPTLENS_TEST_KEY_EMPTY", "   ");
        let result = lookup("SCRIPTLENS_TEST_KEY_EMPTY").resolve_env();
        std::env::remove_var("SCRIPTLENS_TEST_KEY_EMPTY");

        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }
}
