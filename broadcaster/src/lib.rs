//! In-process Event Broadcaster
//!
//! A publish/subscribe registry for decoupling producers and consumers of
//! events inside one process. Named events map to ordered lists of
//! listeners; emitting an event calls each listener synchronously, in
//! registration order, with the emitted arguments.
//!
//! # Features
//!
//! - **Process-wide Registry**: `Broadcaster::global()` always refers to the same registry
//! - **Injectable Instances**: `Broadcaster::new()` for isolated registries (tests, libraries)
//! - **Identity Handles**: `Listener` handles are returned on registration and removed by identity
//! - **Once-listeners**: self-deregistering after their first invocation
//! - **Listener Caps**: per-event upper bound on registered listeners
//! - **Variadic Emission**: any number of typed arguments via `args![...]`
//! - **Failure Modes**: propagate the first listener failure, or isolate and collect them
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//! use broadcaster::{args, Broadcaster, Listener};
//!
//! let broadcaster = Broadcaster::new();
//! let total = Arc::new(AtomicUsize::new(0));
//!
//! let sum = Arc::clone(&total);
//! broadcaster
//!     .on("bytes_read", Listener::new(move |args| {
//!         if let Some(n) = args.get::<usize>(0) {
//!             sum.fetch_add(*n, Ordering::SeqCst);
//!         }
//!     }))
//!     .unwrap();
//!
//! // Fires only for the first emission
//! broadcaster
//!     .once("bytes_read", Listener::new(|_| println!("first read")))
//!     .unwrap();
//!
//! broadcaster.emit("bytes_read", args![512_usize]).unwrap();
//! broadcaster.emit("bytes_read", args![256_usize]).unwrap();
//!
//! assert_eq!(total.load(Ordering::SeqCst), 768);
//! assert_eq!(broadcaster.listener_count("bytes_read"), 1);
//! ```
//!
//! # Architecture
//!
//! ```text
//! Broadcaster (Clone handle)
//!     │
//!     ├── registry: Arc<Mutex<Registry>>
//!     │       │
//!     │       └── [(event name, EventEntry { limit, listeners: Vec<Listener> })]
//!     │                                                  │
//!     │                  Listener: Arc<callback | once-wrapper ──weak──► registry>
//!     │
//!     └── config: BroadcasterConfig { default_limit, emit_mode }
//! ```
//!
//! `emit` copies the listener list under the lock and releases it before
//! calling anything, so listeners may register or remove listeners
//! (including themselves) while an emission is running.

// Modules
pub mod args;
pub mod broadcaster;
pub mod config;
pub mod error;
pub mod limit;
pub mod listener;
pub mod logging;

mod registry;

// Re-exports - Public API
pub use args::Args;
pub use broadcaster::{Broadcaster, Link};
pub use config::{BroadcasterConfig, EmitMode};
pub use error::{BroadcastError, FailureKind, ListenerError, ListenerFailure, Result};
pub use limit::{ListenerLimit, UNBOUNDED_SENTINEL};
pub use listener::Listener;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::args;
    pub use crate::args::Args;
    pub use crate::broadcaster::{Broadcaster, Link};
    pub use crate::config::{BroadcasterConfig, EmitMode};
    pub use crate::error::{BroadcastError, Result};
    pub use crate::limit::ListenerLimit;
    pub use crate::listener::Listener;
}
