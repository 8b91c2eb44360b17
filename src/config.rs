//! Client configuration
//!
//! Connection settings are an explicit struct handed to the transport when it
//! is built. They can come from a TOML file, then be overridden by the
//! `WB_API_URL` / `WB_API_TOKEN` environment variables and finally by
//! command-line flags.

use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

/// Production API host
pub const DEFAULT_BASE_URL: &str = "https://suppliers-api.wildberries.ru";

/// Per-attempt request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Attempts made on connection-level failures
pub const MAX_RETRIES: u32 = 3;

/// Pause between attempts
pub const RETRY_DELAY: Duration = Duration::from_secs(1);

pub const ENV_BASE_URL: &str = "WB_API_URL";
pub const ENV_TOKEN: &str = "WB_API_TOKEN";

/// Errors that can occur while loading or checking configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("API token is not configured (set WB_API_TOKEN or pass --token)")]
    MissingToken,

    #[error("API token contains characters not allowed in an HTTP header")]
    InvalidToken,

    #[error("Invalid base URL: '{0}'")]
    InvalidBaseUrl(String),

    #[error("max_retries must be at least 1")]
    InvalidRetries,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Settings for one API client
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub base_url: String,
    pub token: String,
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
    pub max_retries: u32,
    #[serde(with = "humantime_serde")]
    pub retry_delay: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: String::new(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: MAX_RETRIES,
            retry_delay: RETRY_DELAY,
        }
    }
}

// Hand-written so the token never reaches logs
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("max_retries", &self.max_retries)
            .field("retry_delay", &self.retry_delay)
            .finish()
    }
}

impl ClientConfig {
    /// Creates a config with default timing for the given host and token
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Parses a TOML document; absent keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads a TOML config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Applies `WB_API_URL` / `WB_API_TOKEN` from the process environment
    pub fn apply_env(self) -> Self {
        self.apply_env_from(|name| std::env::var(name).ok())
    }

    /// Applies overrides from an arbitrary variable lookup
    pub fn apply_env_from<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.token = token;
        }
        self
    }

    /// Base URL without trailing slashes
    pub fn normalized_base_url(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Stable digest of the host and token
    ///
    /// Identifies which credentials produced a cached response without
    /// storing the token itself.
    pub fn credential_fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.normalized_base_url().as_bytes());
        hasher.update(b"\n");
        hasher.update(self.token.trim().as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Checks the settings a transport cannot work without
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.trim().is_empty() {
            return Err(ConfigError::MissingToken);
        }
        let url = self.normalized_base_url();
        let has_host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .is_some_and(|rest| !rest.is_empty());
        if !has_host {
            return Err(ConfigError::InvalidBaseUrl(self.base_url.clone()));
        }
        if self.max_retries == 0 {
            return Err(ConfigError::InvalidRetries);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.retry_delay, Duration::from_secs(1));
    }

    #[test]
    fn test_from_toml_with_human_durations() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://dev.wildberries.ru/api/"
            token = "secret"
            timeout = "10s"
            retry_delay = "250ms"
            "#,
        )
        .unwrap();

        assert_eq!(config.normalized_base_url(), "https://dev.wildberries.ru/api");
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.retry_delay, Duration::from_millis(250));
        assert_eq!(config.max_retries, MAX_RETRIES);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let config = ClientConfig::new("https://file.example", "file-token").apply_env_from(|name| {
            match name {
                ENV_TOKEN => Some("env-token".to_string()),
                ENV_BASE_URL => Some(String::new()),
                _ => None,
            }
        });

        assert_eq!(config.token, "env-token");
        assert_eq!(config.base_url, "https://file.example");
    }

    #[test]
    fn test_validate_rejects_missing_token() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "  ");
        assert!(matches!(config.validate(), Err(ConfigError::MissingToken)));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let config = ClientConfig::new("ftp://example.com", "t");
        assert!(matches!(config.validate(), Err(ConfigError::InvalidBaseUrl(_))));

        let config = ClientConfig::new("https://", "t");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_retries() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "t").with_max_retries(0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidRetries)));
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = ClientConfig::new(DEFAULT_BASE_URL, "super-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_fingerprint_depends_on_host_and_token() {
        let base = ClientConfig::new("https://api.example/", "token-a");
        assert_eq!(
            base.credential_fingerprint(),
            ClientConfig::new("https://api.example", " token-a ").credential_fingerprint()
        );
        assert_ne!(
            base.credential_fingerprint(),
            ClientConfig::new("https://api.example", "token-b").credential_fingerprint()
        );
        assert_ne!(
            base.credential_fingerprint(),
            ClientConfig::new("https://dev.example", "token-a").credential_fingerprint()
        );
        assert!(!base.credential_fingerprint().contains("token-a"));
    }
}
