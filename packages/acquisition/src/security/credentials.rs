//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive
//! values. Missing credentials are the only campaign-fatal condition, so
//! they are checked here, before any site task starts.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::PipelineError;

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API
    /// request).
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl Clone for SecretString {
    fn clone(&self) -> Self {
        Self::new(self.expose().to_string())
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl From<String> for SecretString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&str> for SecretString {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Credentials for every external provider a campaign talks to.
#[derive(Clone)]
pub struct Credentials {
    /// SERP search provider API key.
    pub search_api_key: SecretString,

    /// Extraction model API key.
    pub model_api_key: SecretString,

    /// Browser gateway API key; strategy is skipped when absent.
    pub gateway_api_key: Option<SecretString>,

    /// Proxy endpoint URL with embedded credentials; strategy is skipped
    /// when absent.
    pub proxy_url: Option<SecretString>,
}

impl Credentials {
    /// Load credentials from the environment.
    ///
    /// `SERP_API_KEY` and `GEMINI_API_KEY` are required; `BROWSER_GATEWAY_KEY`
    /// and `SCRAPE_PROXY_URL` enable their strategies when present.
    pub fn from_env() -> Result<Self, PipelineError> {
        Ok(Self {
            search_api_key: require("SERP_API_KEY")?,
            model_api_key: require("GEMINI_API_KEY")?,
            gateway_api_key: optional("BROWSER_GATEWAY_KEY"),
            proxy_url: optional("SCRAPE_PROXY_URL"),
        })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("search_api_key", &"[REDACTED]")
            .field("model_api_key", &"[REDACTED]")
            .field("gateway_api_key", &self.gateway_api_key.is_some())
            .field("proxy_url", &self.proxy_url.is_some())
            .finish()
    }
}

fn require(name: &'static str) -> Result<SecretString, PipelineError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(SecretString::new(value)),
        _ => Err(PipelineError::MissingCredential { name }),
    }
}

fn optional(name: &str) -> Option<SecretString> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .map(SecretString::new)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug_or_display() {
        let secret = SecretString::new("sk-super-secret-key");
        assert!(!format!("{:?}", secret).contains("sk-super"));
        assert!(!format!("{}", secret).contains("sk-super"));
        assert_eq!(secret.expose(), "sk-super-secret-key");
    }

    #[test]
    fn test_credentials_debug_redacts() {
        let creds = Credentials {
            search_api_key: "serp-key".into(),
            model_api_key: "model-key".into(),
            gateway_api_key: None,
            proxy_url: Some("http://u:p@proxy.test:8080".into()),
        };
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("serp-key"));
        assert!(!debug.contains("proxy.test"));
    }
}
