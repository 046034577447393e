//! Error types for registration, limits, configuration and emission
//!
//! Listener failures are carried as [`ListenerError`] and, in isolate mode,
//! collected into [`ListenerFailure`] records.

use thiserror::Error;

use crate::limit::ListenerLimit;

/// Boxed error a fallible listener may return
pub type ListenerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur while registering listeners or emitting events
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum BroadcastError {
    /// Event names must not be empty
    #[error("Event name must not be empty")]
    InvalidEventName,

    /// The listener handle can no longer be invoked (a once-listener that already fired)
    #[error("Listener for event `{event}` is not callable")]
    InvalidListener { event: String },

    /// The event already holds as many listeners as its cap allows
    #[error("The maximum amount of listeners ({limit}) for event `{event}` has been reached")]
    ListenerLimitExceeded { event: String, limit: ListenerLimit },

    /// A new cap would be lower than the number of listeners already registered
    #[error("Cannot cap event `{event}` at {limit}: {current} listeners are registered")]
    LimitBelowCurrent {
        event: String,
        limit: ListenerLimit,
        current: usize,
    },

    /// Raw limit value is neither the unbounded sentinel nor a non-negative count
    #[error("Invalid listener limit {0}: expected -1 or a non-negative count")]
    InvalidListenerLimit(i64),

    /// A listener failed and the emission was stopped
    #[error("Listener failed while emitting `{event}`: {source}")]
    ListenerFailed {
        event: String,
        #[source]
        source: ListenerError,
    },

    /// One or more listeners failed; every other listener still ran
    #[error("{} listener(s) failed while emitting `{event}`", .failures.len())]
    ListenersFailed {
        event: String,
        failures: Vec<ListenerFailure>,
    },

    /// The process-wide broadcaster already exists
    #[error("The global broadcaster has already been initialized")]
    AlreadyInitialized,

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl BroadcastError {
    /// Short stable label (snake_case) for logs
    pub fn as_label(&self) -> &'static str {
        match self {
            BroadcastError::InvalidEventName => "invalid_event_name",
            BroadcastError::InvalidListener { .. } => "invalid_listener",
            BroadcastError::ListenerLimitExceeded { .. } => "listener_limit_exceeded",
            BroadcastError::LimitBelowCurrent { .. } => "limit_below_current",
            BroadcastError::InvalidListenerLimit(_) => "invalid_listener_limit",
            BroadcastError::ListenerFailed { .. } => "listener_failed",
            BroadcastError::ListenersFailed { .. } => "listeners_failed",
            BroadcastError::AlreadyInitialized => "already_initialized",
            BroadcastError::Configuration(_) => "configuration",
        }
    }
}

/// How a listener failed during an isolated emission
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The listener returned an error
    Error,
    /// The listener panicked
    Panic,
}

/// One collected listener failure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerFailure {
    /// Position of the listener in the emission snapshot
    pub index: usize,
    pub kind: FailureKind,
    pub message: String,
}

impl std::fmt::Display for ListenerFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            FailureKind::Error => "error",
            FailureKind::Panic => "panic",
        };
        write!(f, "listener #{} {}: {}", self.index, kind, self.message)
    }
}

/// Result type for broadcaster operations
pub type Result<T> = std::result::Result<T, BroadcastError>;
