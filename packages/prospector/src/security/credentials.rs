//! Credential handling with secure memory.
//!
//! Uses the `secrecy` crate to prevent accidental logging of sensitive values.

use secrecy::{ExposeSecret, SecretBox};
use std::fmt;

use crate::error::PipelineError;

/// A secret string that won't be logged or displayed.
pub struct SecretString(SecretBox<str>);

impl SecretString {
    /// Create a new secret string.
    pub fn new(value: impl Into<String>) -> Self {
        Self(SecretBox::new(Box::from(value.into().as_str())))
    }

    /// Expose the secret value for use.
    ///
    /// Only call this when actually using the secret (e.g., in an API request).
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

/// Credentials for an external HTTP service.
#[derive(Clone)]
pub struct ApiCredentials {
    /// API key (secret)
    pub api_key: SecretString,

    /// API base URL override (None = provider default)
    pub base_url: Option<String>,
}

impl ApiCredentials {
    /// Create credentials from a raw API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key),
            base_url: None,
        }
    }

    /// Read credentials from the named environment variable.
    ///
    /// This is the configuration-error path of the pipeline: a missing key
    /// fails here, before any work is attempted.
    pub fn from_env(var: &str) -> Result<Self, PipelineError> {
        let api_key = std::env::var(var)
            .map_err(|_| PipelineError::Config(format!("{var} not set")))?;
        Ok(Self::new(api_key))
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }
}

impl fmt::Debug for ApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredentials")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_not_in_debug() {
        let secret = SecretString::new("fc-super-secret-key");
        let debug = format!("{:?}", secret);
        assert!(!debug.contains("fc-super"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_secret_not_in_display() {
        let secret = SecretString::new("fc-super-secret-key");
        let display = format!("{}", secret);
        assert!(!display.contains("fc-super"));
        assert!(display.contains("[REDACTED]"));
    }

    #[test]
    fn test_expose_works() {
        let secret = SecretString::new("fc-super-secret-key");
        assert_eq!(secret.expose(), "fc-super-secret-key");
    }

    #[test]
    fn test_credentials_debug_redacts_key() {
        let creds = ApiCredentials::new("fc-secret").with_base_url("https://example.test/v1");
        let debug = format!("{:?}", creds);
        assert!(!debug.contains("fc-secret"));
        assert!(debug.contains("https://example.test/v1"));
    }

    #[test]
    fn test_from_env_missing_is_config_error() {
        let err = ApiCredentials::from_env("PROSPECTOR_TEST_UNSET_VAR").unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }
}
