//! Broadcaster configuration
//!
//! Provides the configuration structure for `Broadcaster`, with sensible
//! defaults, validation, and loading from environment variables.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BroadcastError, Result};
use crate::limit::ListenerLimit;

/// Environment variable holding the default per-event cap (`-1` for none)
pub const ENV_DEFAULT_MAX_LISTENERS: &str = "BROADCASTER_DEFAULT_MAX_LISTENERS";

/// Environment variable selecting the emit mode (`propagate` or `isolate`)
pub const ENV_EMIT_MODE: &str = "BROADCASTER_EMIT_MODE";

/// How `emit` reacts to failing listeners
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitMode {
    /// Stop at the first listener error and return it; panics unwind to the caller
    #[default]
    Propagate,
    /// Run every listener, catching errors and panics, then report them together
    Isolate,
}

impl FromStr for EmitMode {
    type Err = BroadcastError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(EmitMode::Propagate),
            "isolate" => Ok(EmitMode::Isolate),
            other => Err(BroadcastError::Configuration(format!(
                "Unknown emit mode '{}': expected 'propagate' or 'isolate'",
                other
            ))),
        }
    }
}

/// Configuration for a `Broadcaster`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BroadcasterConfig {
    /// Cap given to events created by `add_listener`
    /// Default: unbounded
    pub default_limit: ListenerLimit,

    /// Failure handling during emission
    /// Default: propagate
    pub emit_mode: EmitMode,
}

impl Default for BroadcasterConfig {
    fn default() -> Self {
        Self {
            default_limit: ListenerLimit::Unbounded,
            emit_mode: EmitMode::Propagate,
        }
    }
}

impl BroadcasterConfig {
    /// Create a new BroadcasterConfig with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a BroadcasterConfig whose emissions isolate failing listeners
    pub fn isolated() -> Self {
        Self {
            emit_mode: EmitMode::Isolate,
            ..Default::default()
        }
    }

    /// Load configuration from the process environment
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_DEFAULT_MAX_LISTENERS) {
            let value: i64 = raw.trim().parse().map_err(|_| {
                BroadcastError::Configuration(format!(
                    "{} must be an integer, got '{}'",
                    ENV_DEFAULT_MAX_LISTENERS, raw
                ))
            })?;
            config.default_limit = ListenerLimit::try_from(value)?;
        }

        if let Some(raw) = lookup(ENV_EMIT_MODE) {
            config.emit_mode = raw.parse()?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.default_limit == ListenerLimit::Bounded(0) {
            return Err(BroadcastError::Configuration(
                "Default listener limit must be greater than 0 or unbounded".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_default_limit(mut self, limit: ListenerLimit) -> Self {
        self.default_limit = limit;
        self
    }

    pub fn with_emit_mode(mut self, mode: EmitMode) -> Self {
        self.emit_mode = mode;
        self
    }
}
