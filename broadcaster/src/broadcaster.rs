//! The broadcaster: registration, removal, introspection and emission
//!
//! `Broadcaster` is a cheap handle; every clone talks to the same registry.
//! `Broadcaster::global()` hands out the process-wide registry, while
//! `Broadcaster::new()` builds an independent one for injection and tests.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use crate::args::Args;
use crate::config::{BroadcasterConfig, EmitMode};
use crate::error::{BroadcastError, FailureKind, ListenerFailure, Result};
use crate::limit::ListenerLimit;
use crate::listener::Listener;
use crate::registry::{Registry, SharedRegistry};

static GLOBAL: OnceLock<Broadcaster> = OnceLock::new();

/// In-process event broadcaster
///
/// # Example
///
/// ```rust
/// use std::sync::{Arc, Mutex};
/// use broadcaster::{args, Broadcaster, Listener};
///
/// let broadcaster = Broadcaster::new();
/// let received = Arc::new(Mutex::new(Vec::new()));
///
/// let sink = Arc::clone(&received);
/// let listener = broadcaster
///     .on("temperature", Listener::new(move |args| {
///         if let Some(t) = args.get::<f32>(0) {
///             sink.lock().unwrap().push(*t);
///         }
///     }))
///     .unwrap();
///
/// broadcaster.emit("temperature", args![21.5_f32]).unwrap();
/// assert_eq!(*received.lock().unwrap(), vec![21.5]);
///
/// assert!(broadcaster.off(&listener));
/// assert!(!broadcaster.off(&listener));
/// ```
#[derive(Clone)]
pub struct Broadcaster {
    registry: SharedRegistry,
    config: Arc<BroadcasterConfig>,
}

/// The same broadcaster under its other name
pub type Link = Broadcaster;

impl Broadcaster {
    /// Create an independent broadcaster with default configuration
    pub fn new() -> Self {
        Self::build(BroadcasterConfig::default())
    }

    /// Create an independent broadcaster with a validated configuration
    pub fn with_config(config: BroadcasterConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: BroadcasterConfig) -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry::new())),
            config: Arc::new(config),
        }
    }

    /// Handle to the process-wide broadcaster
    ///
    /// The first call creates it, configured from the environment (see
    /// [`BroadcasterConfig::from_env`]); every later call returns a handle
    /// to the same registry.
    pub fn global() -> Broadcaster {
        GLOBAL
            .get_or_init(|| {
                let config = BroadcasterConfig::from_env().unwrap_or_else(|e| {
                    warn!(error = %e, "Invalid broadcaster environment, using defaults");
                    BroadcasterConfig::default()
                });
                debug!(?config, "Creating global broadcaster");
                Self::build(config)
            })
            .clone()
    }

    /// Create the process-wide broadcaster with an explicit configuration
    ///
    /// Fails with `AlreadyInitialized` if it already exists, including when
    /// `global()` was called first.
    pub fn init_global(config: BroadcasterConfig) -> Result<Broadcaster> {
        config.validate()?;

        let mut created = false;
        let global = GLOBAL.get_or_init(|| {
            created = true;
            debug!(?config, "Creating global broadcaster");
            Self::build(config)
        });

        if created {
            Ok(global.clone())
        } else {
            Err(BroadcastError::AlreadyInitialized)
        }
    }

    /// Whether two handles share one registry
    pub fn same_registry(a: &Broadcaster, b: &Broadcaster) -> bool {
        Arc::ptr_eq(&a.registry, &b.registry)
    }

    /// Configuration this broadcaster was built with
    pub fn config(&self) -> &BroadcasterConfig {
        &self.config
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Append `listener` to `event`, returning the same handle
    ///
    /// Creates the event on first use with the configured default cap.
    pub fn add_listener(&self, event: &str, listener: Listener) -> Result<Listener> {
        validate_event_name(event)?;
        if !listener.is_callable() {
            return Err(BroadcastError::InvalidListener {
                event: event.to_string(),
            });
        }

        let mut registry = self.registry.lock();
        let entry = registry.entry_or_insert(event, self.config.default_limit);
        if !entry.try_push(listener.clone()) {
            warn!(event = %event, limit = %entry.limit, "Listener limit reached");
            return Err(BroadcastError::ListenerLimitExceeded {
                event: event.to_string(),
                limit: entry.limit,
            });
        }

        debug!(
            event = %event,
            listener = listener.id(),
            listeners = entry.listeners.len(),
            "Listener added"
        );
        Ok(listener)
    }

    /// Alias of [`Broadcaster::add_listener`]
    pub fn on(&self, event: &str, listener: Listener) -> Result<Listener> {
        self.add_listener(event, listener)
    }

    /// Register `callback` to run on the next emission of `event` only
    ///
    /// Returns the wrapper handle that is actually stored. To cancel before
    /// it fires, remove that wrapper, not `callback`.
    pub fn once(&self, event: &str, callback: Listener) -> Result<Listener> {
        if !callback.is_callable() {
            return Err(BroadcastError::InvalidListener {
                event: event.to_string(),
            });
        }
        let wrapper = Listener::once(callback, Arc::downgrade(&self.registry));
        self.add_listener(event, wrapper)
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    /// Remove the first occurrence of `listener` from whichever event holds it
    ///
    /// Events are scanned in creation order; only one occurrence is removed
    /// even if the handle is registered under several events.
    pub fn remove_listener(&self, listener: &Listener) -> bool {
        match self.registry.lock().remove(listener) {
            Some(event) => {
                debug!(event = %event, listener = listener.id(), "Listener removed");
                true
            }
            None => {
                trace!(listener = listener.id(), "Listener not registered");
                false
            }
        }
    }

    /// Alias of [`Broadcaster::remove_listener`]
    pub fn off(&self, listener: &Listener) -> bool {
        self.remove_listener(listener)
    }

    /// Remove the first occurrence of `listener` from `event` only
    pub fn remove_listener_from(&self, event: &str, listener: &Listener) -> bool {
        let removed = self
            .registry
            .lock()
            .get_mut(event)
            .map(|entry| entry.remove_first(listener))
            .unwrap_or(false);

        if removed {
            debug!(event = %event, listener = listener.id(), "Listener removed");
        }
        removed
    }

    /// Remove every listener of `event`, returning how many were removed
    ///
    /// The event itself stays registered.
    pub fn remove_all_listeners(&self, event: &str) -> usize {
        let removed = self
            .registry
            .lock()
            .get_mut(event)
            .map(|entry| std::mem::take(&mut entry.listeners).len())
            .unwrap_or(0);

        if removed > 0 {
            debug!(event = %event, removed, "All listeners removed");
        }
        removed
    }

    /// Forget every event and listener
    pub fn clear(&self) {
        self.registry.lock().clear();
        debug!("Registry cleared");
    }

    // ------------------------------------------------------------------------
    // Introspection and limits
    // ------------------------------------------------------------------------

    /// Listeners of `event` in emission order; empty for unknown events
    pub fn listeners(&self, event: &str) -> Vec<Listener> {
        self.registry
            .lock()
            .get(event)
            .map(|entry| entry.listeners.clone())
            .unwrap_or_default()
    }

    /// Number of listeners of `event`; 0 for unknown events
    pub fn listener_count(&self, event: &str) -> usize {
        self.registry
            .lock()
            .get(event)
            .map(|entry| entry.listeners.len())
            .unwrap_or(0)
    }

    /// Every registered event name, in creation order
    ///
    /// Includes events whose listener list is currently empty.
    pub fn events(&self) -> Vec<String> {
        self.registry.lock().names()
    }

    /// Number of registered events
    pub fn event_count(&self) -> usize {
        self.registry.lock().len()
    }

    /// Check if no event has been registered
    pub fn is_empty(&self) -> bool {
        self.registry.lock().is_empty()
    }

    /// Set the cap of `event`, creating the event if needed
    ///
    /// `ListenerLimit::Unbounded` removes the cap. A cap below the number of
    /// listeners already registered is rejected.
    pub fn set_max_listeners(&self, event: &str, limit: ListenerLimit) -> Result<ListenerLimit> {
        validate_event_name(event)?;

        let mut registry = self.registry.lock();
        let entry = registry.entry_or_insert(event, limit);
        let current = entry.listeners.len();
        if !limit.holds(current) {
            return Err(BroadcastError::LimitBelowCurrent {
                event: event.to_string(),
                limit,
                current,
            });
        }
        entry.limit = limit;

        debug!(event = %event, limit = %limit, "Listener limit set");
        Ok(limit)
    }

    /// Current cap of `event`, or `None` for unknown events
    pub fn max_listeners(&self, event: &str) -> Option<ListenerLimit> {
        self.registry.lock().get(event).map(|entry| entry.limit)
    }

    // ------------------------------------------------------------------------
    // Emission
    // ------------------------------------------------------------------------

    /// Invoke every listener of `event` in registration order with `args`
    ///
    /// Runs synchronously on the calling thread over the listeners registered
    /// when the call starts. Unknown events are a no-op. Returns the number of
    /// listeners invoked; once-listeners that already fired are skipped.
    ///
    /// Failures follow the configured [`EmitMode`].
    pub fn emit(&self, event: &str, args: Args) -> Result<usize> {
        let snapshot = match self.registry.lock().get(event) {
            Some(entry) => entry.listeners.clone(),
            None => {
                trace!(event = %event, "Emit to unregistered event ignored");
                return Ok(0);
            }
        };

        trace!(
            event = %event,
            listeners = snapshot.len(),
            args = args.len(),
            "Emitting"
        );

        match self.config.emit_mode {
            EmitMode::Propagate => emit_propagating(event, &snapshot, &args),
            EmitMode::Isolate => emit_isolated(event, &snapshot, &args),
        }
    }
}

fn emit_propagating(event: &str, snapshot: &[Listener], args: &Args) -> Result<usize> {
    let mut invoked = 0;
    for listener in snapshot {
        match listener.invoke(args) {
            None => trace!(event = %event, listener = listener.id(), "Skipping spent listener"),
            Some(Ok(())) => invoked += 1,
            Some(Err(source)) => {
                warn!(event = %event, error = %source, "Listener failed, stopping emission");
                return Err(BroadcastError::ListenerFailed {
                    event: event.to_string(),
                    source,
                });
            }
        }
    }
    Ok(invoked)
}

fn emit_isolated(event: &str, snapshot: &[Listener], args: &Args) -> Result<usize> {
    let mut invoked = 0;
    let mut failures = Vec::new();

    for (index, listener) in snapshot.iter().enumerate() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener.invoke(args)));
        let failure = match outcome {
            Ok(None) => {
                trace!(event = %event, listener = listener.id(), "Skipping spent listener");
                continue;
            }
            Ok(Some(Ok(()))) => {
                invoked += 1;
                continue;
            }
            Ok(Some(Err(e))) => ListenerFailure {
                index,
                kind: FailureKind::Error,
                message: e.to_string(),
            },
            Err(payload) => ListenerFailure {
                index,
                kind: FailureKind::Panic,
                message: panic_message(&*payload),
            },
        };

        invoked += 1;
        warn!(event = %event, %failure, "Listener failed, continuing emission");
        failures.push(failure);
    }

    if failures.is_empty() {
        Ok(invoked)
    } else {
        Err(BroadcastError::ListenersFailed {
            event: event.to_string(),
            failures,
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "listener panicked".to_string()
    }
}

fn validate_event_name(event: &str) -> Result<()> {
    if event.is_empty() {
        return Err(BroadcastError::InvalidEventName);
    }
    Ok(())
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Broadcaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Broadcaster")
            .field("event_count", &self.event_count())
            .field("emit_mode", &self.config.emit_mode)
            .finish()
    }
}
