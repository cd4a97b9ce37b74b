//! Directory client configuration

use rolepolicy_core::{DirectoryError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "ROLEPOLICY_";

/// Retry behaviour for transient directory failures
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per request, including the first
    pub max_attempts: usize,

    /// Backoff unit; attempt `n` waits `n * base_backoff_ms`
    pub base_backoff_ms: u64,

    /// Upper bound on any single wait, including server `Retry-After`
    pub max_backoff_ms: u64,

    /// Retry 404 responses, which the directory returns while a freshly
    /// written object is still replicating
    pub retry_not_found: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 250,
            max_backoff_ms: 30_000,
            retry_not_found: true,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Delay before attempt `attempt + 1`
    pub fn backoff(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64)).min(self.max_backoff())
    }

    /// Delay before attempt `attempt + 1`, preferring the server's
    /// `Retry-After` but never exceeding `max_backoff_ms`
    pub fn delay(&self, attempt: usize, retry_after: Option<Duration>) -> Duration {
        retry_after
            .map(|wait| wait.min(self.max_backoff()))
            .unwrap_or_else(|| self.backoff(attempt))
    }

    /// Longest single wait
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }
}

/// Directory client configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Service endpoint, without version
    pub endpoint: String,

    /// API version path segment
    pub api_version: String,

    /// Bearer token sent with every request
    #[serde(skip_serializing)]
    pub access_token: Option<String>,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Retry behaviour
    pub retry: RetryPolicy,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://graph.microsoft.com".to_string(),
            api_version: "beta".to_string(),
            access_token: None,
            request_timeout_secs: 30,
            retry: RetryPolicy::default(),
        }
    }
}

impl fmt::Debug for DirectoryConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectoryConfig")
            .field("endpoint", &self.endpoint)
            .field("api_version", &self.api_version)
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

impl DirectoryConfig {
    /// Defaults overridden by `ROLEPOLICY_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by values from `lookup`, keyed by full variable name
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| {
            lookup(&format!("{ENV_PREFIX}{name}"))
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(endpoint) = var("ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(version) = var("API_VERSION") {
            config.api_version = version;
        }
        if let Some(token) = var("ACCESS_TOKEN") {
            config.access_token = Some(token);
        }
        if let Some(timeout) = var("REQUEST_TIMEOUT_SECS") {
            config.request_timeout_secs = parse_number("REQUEST_TIMEOUT_SECS", &timeout)?;
        }
        if let Some(attempts) = var("MAX_ATTEMPTS") {
            config.retry.max_attempts = parse_number("MAX_ATTEMPTS", &attempts)?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is usable
    pub fn validate(&self) -> Result<()> {
        self.base_url()?;
        if self.request_timeout_secs == 0 {
            return Err(DirectoryError::Configuration(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(DirectoryError::Configuration(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Versioned base URL, always ending in `/`
    pub fn base_url(&self) -> Result<Url> {
        let endpoint = self.endpoint.trim_end_matches('/');
        let version = self.api_version.trim_matches('/');
        let raw = if version.is_empty() {
            format!("{endpoint}/")
        } else {
            format!("{endpoint}/{version}/")
        };

        let url = Url::parse(&raw)
            .map_err(|e| DirectoryError::Configuration(format!("invalid endpoint {raw:?}: {e}")))?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            other => Err(DirectoryError::Configuration(format!(
                "unsupported endpoint scheme {other:?}"
            ))),
        }
    }

    /// Per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        DirectoryError::Configuration(format!("{ENV_PREFIX}{name} must be a number, got {value:?}"))
    })
}
