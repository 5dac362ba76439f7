//! Client configuration.
//!
//! # Design
//! A `ClientConfig` is validated once when the `ApiClient` is built and is
//! immutable afterwards. The timeout bounds every invocation end to end, so a
//! backend that never answers resolves as a timeout instead of hanging.

use std::env;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_BASE_URL: &str = "DASHBOARD_API_URL";
pub const ENV_TIMEOUT_SECS: &str = "DASHBOARD_API_TIMEOUT_SECS";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "DASHBOARD_API_CONNECT_TIMEOUT_SECS";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and authority of the backend, e.g. `https://dashboard.example.com`.
    pub base_url: String,
    /// Upper bound for one invocation, from dispatch to the last body byte.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// Keep cookies set by the backend (session auth) and send them on later
    /// calls.
    pub cookie_store: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            cookie_store: true,
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_cookie_store(mut self, enabled: bool) -> Self {
        self.cookie_store = enabled;
        self
    }

    /// Build a config from `DASHBOARD_API_*` variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&'static str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = match lookup(ENV_BASE_URL) {
            Some(url) => Self::new(&url),
            None => Self::default(),
        };
        if let Some(secs) = seconds(&lookup, ENV_TIMEOUT_SECS)? {
            config.timeout = secs;
        }
        if let Some(secs) = seconds(&lookup, ENV_CONNECT_TIMEOUT_SECS)? {
            config.connect_timeout = secs;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: self.base_url.clone(),
            reason,
        };
        let parsed = url::Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
        }
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(invalid("base url must not carry a query or fragment".to_string()));
        }
        if self.timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        Ok(())
    }
}

fn seconds(
    lookup: &impl Fn(&'static str) -> Option<String>,
    var: &'static str,
) -> Result<Option<Duration>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse::<u64>()
        .map(|secs| Some(Duration::from_secs(secs)))
        .map_err(|_| ConfigError::InvalidEnv { var, value })
}
