//! Configuration types for QIX client

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

use crate::error::{QixClientError, QixClientResult};

/// Environment variable holding the tenant base URL
pub const BASE_URL_ENV: &str = "QIX_BASE_URL";

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "QIX_API_KEY";

/// Main client configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ClientConfig {
    /// Tenant HTTP(S) base URL, e.g. `https://tenant.example.com`
    pub base_url: Option<String>,

    /// Bearer credential sent on the WebSocket upgrade
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Timeout configurations
    #[serde(default)]
    pub timeouts: TimeoutConfig,

    /// Reconnect policy used by `Document::open_with_retry`
    #[serde(default)]
    pub retry: RetryConfig,

    /// Connection configurations
    #[serde(default)]
    pub connection: ConnectionConfig,
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// TCP (and TLS) connection timeout
    #[serde(with = "duration_serde")]
    pub connect: Duration,

    /// WebSocket upgrade timeout
    #[serde(with = "duration_serde")]
    pub upgrade: Duration,

    /// Timeout for the `OpenDoc` reply during the handshake
    #[serde(with = "duration_serde")]
    pub open_document: Duration,

    /// Default per-request timeout
    #[serde(with = "duration_serde")]
    pub request: Duration,
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of connection attempts
    pub max_attempts: u32,

    /// Initial retry delay
    #[serde(with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum retry delay
    #[serde(with = "duration_serde")]
    pub max_delay: Duration,

    /// Exponential backoff multiplier
    pub backoff_multiplier: f64,

    /// Jitter factor (0.0 to 1.0)
    pub jitter: f64,

    /// Whether to enable exponential backoff
    pub exponential_backoff: bool,
}

/// Connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// User agent string
    pub user_agent: Option<String>,

    /// Custom headers to include in the upgrade request
    pub headers: Option<HashMap<String, String>>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            upgrade: Duration::from_secs(10),
            open_document: Duration::from_secs(30),
            request: Duration::from_secs(60),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(10),
            backoff_multiplier: 2.0,
            jitter: 0.1,
            exponential_backoff: true,
        }
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            user_agent: Some(format!("qix-client/{}", env!("CARGO_PKG_VERSION"))),
            headers: None,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            api_key: Some(api_key.into()),
            ..Default::default()
        }
    }

    /// Read base URL and API key from `QIX_BASE_URL` and `QIX_API_KEY`
    pub fn from_env() -> QixClientResult<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .map_err(|_| QixClientError::config(format!("{} is not set", BASE_URL_ENV)))?;
        let api_key = std::env::var(API_KEY_ENV)
            .map_err(|_| QixClientError::config(format!("{} is not set", API_KEY_ENV)))?;

        let config = Self::new(base_url, api_key);
        config.validate()?;
        Ok(config)
    }

    pub fn with_timeouts(mut self, timeouts: TimeoutConfig) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.request = timeout;
        self
    }

    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.connection
            .headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Check credentials and base URL; no network activity happens here
    pub fn validate(&self) -> QixClientResult<()> {
        self.parsed_base_url()?;
        self.bearer_token()?;
        Ok(())
    }

    /// The base URL, parsed; only http, https, ws and wss are accepted
    pub fn parsed_base_url(&self) -> QixClientResult<Url> {
        let raw = self
            .base_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| QixClientError::config("base URL is missing"))?;

        let url = Url::parse(raw)
            .map_err(|e| QixClientError::config(format!("invalid base URL '{}': {}", raw, e)))?;

        if !matches!(url.scheme(), "http" | "https" | "ws" | "wss") {
            return Err(QixClientError::config(format!(
                "unsupported base URL scheme: {}",
                url.scheme()
            )));
        }

        if url.host_str().is_none() {
            return Err(QixClientError::config(format!(
                "base URL has no host: {}",
                raw
            )));
        }

        Ok(url)
    }

    pub fn bearer_token(&self) -> QixClientResult<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .ok_or_else(|| QixClientError::config("API key is missing"))
    }
}

impl RetryConfig {
    /// Calculate the delay for a given attempt number
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::from_millis(0);
        }

        let mut delay = self.initial_delay;

        if self.exponential_backoff && attempt > 1 {
            let multiplier = self.backoff_multiplier.powi((attempt - 1) as i32);
            delay = Duration::from_millis((delay.as_millis() as f64 * multiplier) as u64);
        }

        if delay > self.max_delay {
            delay = self.max_delay;
        }

        if self.jitter > 0.0 {
            let jitter_ms = (delay.as_millis() as f64 * self.jitter) as u64;
            let random_offset = rand::random::<f64>() * jitter_ms as f64;
            delay = Duration::from_millis(delay.as_millis() as u64 + random_offset as u64);
        }

        // Jitter must not push past the cap either
        if delay > self.max_delay {
            delay = self.max_delay;
        }

        delay
    }

    /// Check if an attempt should be retried
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

// Helper module for Duration serialization
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
