//! Dashboard configuration - constructed by the embedding layer or from env

use std::env;
use std::time::Duration;

pub mod vars {
    pub const PROVIDER_URL: &str = "BEEDASH_PROVIDER_URL";
    pub const REFRESH_SECS: &str = "BEEDASH_REFRESH_SECS";
    pub const EVENT_POLL_MS: &str = "BEEDASH_EVENT_POLL_MS";
    pub const RECEIPT_POLL_MS: &str = "BEEDASH_RECEIPT_POLL_MS";
}

pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(15);
pub const DEFAULT_EVENT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_RECEIPT_POLL_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("{var}: expected a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashConfig {
    /// Wallet bridge endpoint; `None` means no provider is installed
    pub provider_url: Option<String>,
    /// Background balance refresh period while connected
    pub refresh_interval: Duration,
    pub event_poll_interval: Duration,
    pub receipt_poll_interval: Duration,
}

impl Default for DashConfig {
    fn default() -> Self {
        Self {
            provider_url: None,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            event_poll_interval: DEFAULT_EVENT_POLL_INTERVAL,
            receipt_poll_interval: DEFAULT_RECEIPT_POLL_INTERVAL,
        }
    }
}

impl DashConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_provider_url(mut self, url: impl Into<String>) -> Self { self.provider_url = Some(url.into()); self }
    pub fn with_refresh_interval(mut self, d: Duration) -> Self { self.refresh_interval = d; self }
    pub fn with_event_poll_interval(mut self, d: Duration) -> Self { self.event_poll_interval = d; self }
    pub fn with_receipt_poll_interval(mut self, d: Duration) -> Self { self.receipt_poll_interval = d; self }

    /// Defaults overridden by `BEEDASH_*` variables. Empty values are ignored.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(url) = read(vars::PROVIDER_URL) {
            config.provider_url = Some(url);
        }
        if let Some(secs) = read_number(vars::REFRESH_SECS)? {
            config.refresh_interval = Duration::from_secs(secs);
        }
        if let Some(ms) = read_number(vars::EVENT_POLL_MS)? {
            config.event_poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = read_number(vars::RECEIPT_POLL_MS)? {
            config.receipt_poll_interval = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn read(var: &str) -> Option<String> {
    env::var(var).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn read_number(var: &'static str) -> Result<Option<u64>, ConfigError> {
    match read(var) {
        None => Ok(None),
        Some(value) => match value.parse::<u64>() {
            Ok(n) if n > 0 => Ok(Some(n)),
            _ => Err(ConfigError::InvalidNumber { var, value }),
        },
    }
}
