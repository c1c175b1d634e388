//! Configuration Module
//!
//! Handles loading facade configuration from environment variables.

use std::env;

/// Facade configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Replace keys with `<redacted>` in log events
    pub redact_keys: bool,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_REDACT_KEYS` - Hide keys in log output, `true` or `false` (default: false)
    pub fn from_env() -> Self {
        Self {
            redact_keys: env::var("CACHE_REDACT_KEYS")
                .ok()
                .and_then(|v| v.trim().to_ascii_lowercase().parse().ok())
                .unwrap_or(false),
        }
    }

    /// Sets whether keys are redacted in log events.
    pub fn with_redact_keys(mut self, redact: bool) -> Self {
        self.redact_keys = redact;
        self
    }
}
