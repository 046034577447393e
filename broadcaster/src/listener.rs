//! Listener handles
//!
//! A [`Listener`] is a cheap, clonable handle to a callback. Handles compare
//! by identity: two clones of the same handle are equal, two handles built
//! from identical closures are not. Removal works on that identity.
//!
//! Once-listeners are wrapper records around another handle. The wrapper
//! holds a weak reference back to the registry it was registered in and
//! deregisters itself (by its own handle) right after its callback ran.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use tracing::debug;

use crate::args::Args;
use crate::error::ListenerError;
use crate::registry::Registry;

type Callback = dyn Fn(&Args) -> Result<(), ListenerError> + Send + Sync;

enum Kind {
    Callback(Box<Callback>),
    Once(OnceWrapper),
}

/// Self-deregistering wrapper created by `Broadcaster::once`
struct OnceWrapper {
    callback: Listener,
    fired: AtomicBool,
    registry: Weak<Mutex<Registry>>,
}

/// Handle to a registered (or registrable) event callback
///
/// # Example
///
/// ```rust
/// use broadcaster::{Args, Listener};
///
/// let listener = Listener::new(|args: &Args| {
///     if let Some(n) = args.get::<i32>(0) {
///         println!("got {}", n);
///     }
/// });
///
/// let same = listener.clone();
/// assert_eq!(listener, same);
/// assert_ne!(listener, Listener::new(|_| {}));
/// ```
#[derive(Clone)]
pub struct Listener {
    inner: Arc<Kind>,
}

impl Listener {
    /// Wrap an infallible callback
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        Self::from_kind(Kind::Callback(Box::new(move |args: &Args| {
            callback(args);
            Ok(())
        })))
    }

    /// Wrap a callback that may fail
    ///
    /// A returned error stops or is collected by the emission, depending on
    /// the broadcaster's `EmitMode`.
    pub fn fallible<F, E>(callback: F) -> Self
    where
        F: Fn(&Args) -> Result<(), E> + Send + Sync + 'static,
        E: Into<ListenerError>,
    {
        Self::from_kind(Kind::Callback(Box::new(move |args: &Args| {
            callback(args).map_err(Into::into)
        })))
    }

    pub(crate) fn once(callback: Listener, registry: Weak<Mutex<Registry>>) -> Self {
        Self::from_kind(Kind::Once(OnceWrapper {
            callback,
            fired: AtomicBool::new(false),
            registry,
        }))
    }

    fn from_kind(kind: Kind) -> Self {
        Self {
            inner: Arc::new(kind),
        }
    }

    /// Identity comparison
    pub fn ptr_eq(&self, other: &Listener) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identifier of this handle, shared by all its clones
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as *const () as usize
    }

    /// Whether this handle is a once-wrapper
    pub fn is_once(&self) -> bool {
        matches!(*self.inner, Kind::Once(_))
    }

    /// Whether invoking this handle would run a callback
    ///
    /// Plain callbacks are always callable. A once-wrapper stops being
    /// callable as soon as it fires.
    pub fn is_callable(&self) -> bool {
        match &*self.inner {
            Kind::Callback(_) => true,
            Kind::Once(wrapper) => {
                !wrapper.fired.load(Ordering::Acquire) && wrapper.callback.is_callable()
            }
        }
    }

    /// The callback wrapped by a once-wrapper
    pub fn wrapped(&self) -> Option<&Listener> {
        match &*self.inner {
            Kind::Callback(_) => None,
            Kind::Once(wrapper) => Some(&wrapper.callback),
        }
    }

    /// Run the callback, or return `None` if the handle is not callable
    pub(crate) fn invoke(&self, args: &Args) -> Option<Result<(), ListenerError>> {
        match &*self.inner {
            Kind::Callback(callback) => Some(callback(args)),
            Kind::Once(wrapper) => {
                if wrapper.fired.swap(true, Ordering::AcqRel) {
                    return None;
                }
                // Runs on drop so a panicking callback is still deregistered.
                let _deregister = Deregister {
                    listener: self,
                    registry: &wrapper.registry,
                };
                wrapper.callback.invoke(args)
            }
        }
    }
}

struct Deregister<'a> {
    listener: &'a Listener,
    registry: &'a Weak<Mutex<Registry>>,
}

impl Drop for Deregister<'_> {
    fn drop(&mut self) {
        let Some(registry) = self.registry.upgrade() else {
            return;
        };
        let mut registry = registry.lock();
        let events = registry.remove_all(self.listener);
        if !events.is_empty() {
            debug!(
                events = ?events,
                listener = self.listener.id(),
                "Once-listener fired and removed itself"
            );
        }
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Listener {}

impl std::hash::Hash for Listener {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id().hash(state);
    }
}

impl std::fmt::Debug for Listener {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match &*self.inner {
            Kind::Callback(_) => "callback",
            Kind::Once(_) => "once",
        };
        f.debug_struct("Listener")
            .field("id", &format_args!("{:#x}", self.id()))
            .field("kind", &kind)
            .field("callable", &self.is_callable())
            .finish()
    }
}
