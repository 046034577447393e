//! Logging setup for applications embedding the broadcaster
//!
//! The library only emits `tracing` events. A binary that wants to see them
//! resolves a [`LoggingConfig`] (usually from the environment) and installs
//! it once, early in `main`.

use std::str::FromStr;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

/// Environment variable selecting the logging mode
pub const ENV_LOG_MODE: &str = "BROADCASTER_LOG_MODE";

/// Environment variable overriding the log filter
pub const ENV_LOG_LEVEL: &str = "BROADCASTER_LOG_LEVEL";

/// How much the installed subscriber prints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoggingMode {
    /// No subscriber installed
    #[default]
    Silent,
    /// One line per event at `info`
    Development,
    /// `debug` and up, tagged with target, thread and source location
    Debug,
}

impl LoggingMode {
    fn default_directive(self) -> Option<&'static str> {
        match self {
            LoggingMode::Silent => None,
            LoggingMode::Development => Some("info"),
            LoggingMode::Debug => Some("debug"),
        }
    }
}

impl FromStr for LoggingMode {
    type Err = LoggingError;

    fn from_str(s: &str) -> Result<Self, LoggingError> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "silent" | "off" => Ok(LoggingMode::Silent),
            "development" | "dev" => Ok(LoggingMode::Development),
            "debug" => Ok(LoggingMode::Debug),
            other => Err(LoggingError::UnknownMode(other.to_string())),
        }
    }
}

/// Logging configuration error
#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Unknown logging mode '{0}': expected 'silent', 'development' or 'debug'")]
    UnknownMode(String),

    #[error("Invalid log filter '{directive}': {reason}")]
    InvalidFilter { directive: String, reason: String },

    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Resolved logging settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LoggingConfig {
    pub mode: LoggingMode,

    /// Explicit filter directive; the mode's level applies when unset
    pub filter: Option<String>,
}

impl LoggingConfig {
    pub fn new(mode: LoggingMode) -> Self {
        Self { mode, filter: None }
    }

    pub fn with_filter(mut self, directive: impl Into<String>) -> Self {
        self.filter = Some(directive.into());
        self
    }

    /// Read `BROADCASTER_LOG_MODE` and `BROADCASTER_LOG_LEVEL`, then `RUST_LOG`
    pub fn from_env() -> Result<Self, LoggingError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve settings through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LoggingError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mode = match lookup(ENV_LOG_MODE) {
            Some(raw) => raw.parse()?,
            None => LoggingMode::Silent,
        };
        let filter = lookup(ENV_LOG_LEVEL).or_else(|| lookup("RUST_LOG"));
        Ok(Self { mode, filter })
    }

    /// Filter the subscriber would use, or `None` when silent
    pub fn env_filter(&self) -> Result<Option<EnvFilter>, LoggingError> {
        let Some(fallback) = self.mode.default_directive() else {
            return Ok(None);
        };
        let directive = self.filter.as_deref().unwrap_or(fallback);
        EnvFilter::try_new(directive)
            .map(Some)
            .map_err(|e| LoggingError::InvalidFilter {
                directive: directive.to_string(),
                reason: e.to_string(),
            })
    }

    /// Install the global subscriber
    ///
    /// Silent mode installs nothing. Fails if another subscriber is already set.
    pub fn install(&self) -> Result<(), LoggingError> {
        let Some(filter) = self.env_filter()? else {
            return Ok(());
        };
        let verbose = self.mode == LoggingMode::Debug;

        Registry::default()
            .with(
                fmt::layer()
                    .compact()
                    .with_target(verbose)
                    .with_thread_ids(verbose)
                    .with_file(verbose)
                    .with_line_number(verbose),
            )
            .with(filter)
            .try_init()
            .map_err(|e| LoggingError::TracingInit(e.to_string()))
    }
}

/// Install a subscriber for `mode`, honouring level overrides from the environment
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    let filter = std::env::var(ENV_LOG_LEVEL)
        .or_else(|_| std::env::var("RUST_LOG"))
        .ok();
    LoggingConfig { mode, filter }.install()
}

/// Install a subscriber configured entirely from the environment
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    LoggingConfig::from_env()?.install()
}
