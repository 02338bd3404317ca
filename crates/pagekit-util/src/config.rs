//! Host configuration.
//!
//! ```json
//! { "capabilities": { "mutation_observer": false }, "poll_interval_ms": 10 }
//! ```
//!
//! Every field is optional and falls back to a modern host with the
//! [`DEFAULT_POLL_INTERVAL`].

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::platform::{Capabilities, DEFAULT_POLL_INTERVAL, Platform};

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The input was not valid JSON for [`HostConfig`].
    #[error("invalid host config: {0}")]
    Parse(#[from] serde_json::Error),
    /// `poll_interval_ms` was zero.
    #[error("poll_interval_ms must be at least 1")]
    ZeroPollInterval,
}

/// Capabilities and timing of the host a [`Window`](crate::Window) emulates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// What the host provides.
    pub capabilities: Capabilities,
    /// Interval of polling waits, in milliseconds.
    pub poll_interval_ms: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            capabilities: Capabilities::default(),
            poll_interval_ms: duration_millis(DEFAULT_POLL_INTERVAL),
        }
    }
}

impl HostConfig {
    /// A host without mutation observers or native lookups.
    #[must_use]
    pub fn legacy() -> Self {
        Self {
            capabilities: Capabilities::legacy(),
            ..Self::default()
        }
    }

    /// Parse a JSON configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Parse`] for malformed JSON or unknown value types,
    /// [`ConfigError::ZeroPollInterval`] if the interval is zero.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }
        Ok(config)
    }

    /// [`poll_interval_ms`](Self::poll_interval_ms) as a [`Duration`].
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// The strategies this configuration selects.
    #[must_use]
    pub fn platform(&self) -> Platform {
        Platform::select(self.capabilities, self.poll_interval())
    }
}

fn duration_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
