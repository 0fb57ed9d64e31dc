//! Configuration loading from environment variables.

use std::time::Duration;

use super::ConfigError;

pub const TAG_KEY: &str = "TAG_KEY";
pub const TAG_VALUE: &str = "TAG_VALUE";
pub const LEDGER_TABLE: &str = "LEDGER_TABLE";
pub const NOTIFY_CHANNEL: &str = "NOTIFY_CHANNEL";
pub const TIMEOUT_MS: &str = "COMPUTE_TOGGLE_TIMEOUT_MS";

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Settings resolved once at process start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub tag_key: String,
    pub tag_value: String,
    pub ledger_table: String,
    pub notify_channel: String,
    /// Bound applied to every outbound call, in milliseconds
    pub timeout_ms: u64,
}

impl Settings {
    /// Load settings from the process environment.
    ///
    /// Required: `TAG_KEY`, `TAG_VALUE`, `LEDGER_TABLE`, `NOTIFY_CHANNEL`.
    /// Optional: `COMPUTE_TOGGLE_TIMEOUT_MS` (default: 10000).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut require = |key: &'static str| match lookup(key) {
            Some(value) if !value.trim().is_empty() => value,
            _ => {
                missing.push(key);
                String::new()
            }
        };

        let tag_key = require(TAG_KEY);
        let tag_value = require(TAG_VALUE);
        let ledger_table = require(LEDGER_TABLE);
        let notify_channel = require(NOTIFY_CHANNEL);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        let timeout_ms = match lookup(TIMEOUT_MS) {
            None => DEFAULT_TIMEOUT_MS,
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => ms,
                _ => return Err(ConfigError::Invalid(TIMEOUT_MS, "must be a positive integer")),
            },
        };

        Ok(Self {
            tag_key,
            tag_value,
            ledger_table,
            notify_channel,
            timeout_ms,
        })
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}
