//! Event name to listener-list storage
//!
//! - `EventEntry`: cap and ordered listeners of a single event
//! - `Registry`: all entries, kept in creation order
//!
//! The registry itself does no locking; `Broadcaster` wraps it in a
//! `parking_lot::Mutex` and never holds that lock while a listener runs.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::limit::ListenerLimit;
use crate::listener::Listener;

/// Registry shared between a broadcaster's handles and its once-wrappers
pub(crate) type SharedRegistry = Arc<Mutex<Registry>>;

// ============================================================================
// EventEntry - cap and listeners of one event
// ============================================================================

/// Listener cap and ordered listener list of one event
#[derive(Debug, Clone)]
pub(crate) struct EventEntry {
    pub limit: ListenerLimit,
    pub listeners: Vec<Listener>,
}

impl EventEntry {
    pub fn new(limit: ListenerLimit) -> Self {
        Self {
            limit,
            listeners: Vec::new(),
        }
    }

    /// Append a listener if the cap allows it, returning whether it was added
    pub fn try_push(&mut self, listener: Listener) -> bool {
        if self.limit.admits(self.listeners.len()) {
            self.listeners.push(listener);
            true
        } else {
            false
        }
    }

    /// Remove the first occurrence of `listener`, returning whether one was found
    pub fn remove_first(&mut self, listener: &Listener) -> bool {
        match self.listeners.iter().position(|l| l.ptr_eq(listener)) {
            Some(index) => {
                self.listeners.remove(index);
                true
            }
            None => false,
        }
    }

    /// Remove every occurrence of `listener`, returning how many were dropped
    pub fn remove_every(&mut self, listener: &Listener) -> usize {
        let before = self.listeners.len();
        self.listeners.retain(|l| !l.ptr_eq(listener));
        before - self.listeners.len()
    }
}

// ============================================================================
// Registry - all events, in creation order
// ============================================================================

/// Every event that has ever been registered, in creation order
///
/// Entries are never dropped when their listener list empties, so the set
/// of names only grows until [`Registry::clear`].
#[derive(Debug, Default)]
pub(crate) struct Registry {
    entries: Vec<(String, EventEntry)>,
    index: HashMap<String, usize>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, event: &str) -> Option<&EventEntry> {
        let position = *self.index.get(event)?;
        self.entries.get(position).map(|(_, entry)| entry)
    }

    pub fn get_mut(&mut self, event: &str) -> Option<&mut EventEntry> {
        let position = *self.index.get(event)?;
        self.entries.get_mut(position).map(|(_, entry)| entry)
    }

    /// Get the entry for `event`, creating it with `limit` if absent
    pub fn entry_or_insert(&mut self, event: &str, limit: ListenerLimit) -> &mut EventEntry {
        let position = match self.index.get(event) {
            Some(position) => *position,
            None => {
                let position = self.entries.len();
                self.entries.push((event.to_string(), EventEntry::new(limit)));
                self.index.insert(event.to_string(), position);
                position
            }
        };
        &mut self.entries[position].1
    }

    /// Remove the first occurrence of `listener` across all events
    ///
    /// Events are scanned in creation order and only the first match is
    /// removed, even if the same handle is registered under several events.
    /// Returns the name of the event it was removed from.
    pub fn remove(&mut self, listener: &Listener) -> Option<String> {
        self.entries
            .iter_mut()
            .find_map(|(name, entry)| entry.remove_first(listener).then(|| name.clone()))
    }

    /// Remove every occurrence of `listener` from every event
    ///
    /// Used when a once-wrapper is spent. Returns the names of the events it
    /// was removed from, in creation order.
    pub fn remove_all(&mut self, listener: &Listener) -> Vec<String> {
        self.entries
            .iter_mut()
            .filter_map(|(name, entry)| (entry.remove_every(listener) > 0).then(|| name.clone()))
            .collect()
    }

    /// Event names in creation order
    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn noop() -> Listener {
        Listener::new(|_| {})
    }

    #[test]
    fn test_entry_respects_limit() {
        let mut entry = EventEntry::new(ListenerLimit::Bounded(1));

        assert!(entry.try_push(noop()));
        assert!(!entry.try_push(noop()));
        assert_eq!(entry.listeners.len(), 1);
    }

    #[test]
    fn test_entry_remove_first_only() {
        let listener = noop();
        let mut entry = EventEntry::new(ListenerLimit::Unbounded);
        entry.try_push(listener.clone());
        entry.try_push(listener.clone());

        assert!(entry.remove_first(&listener));
        assert_eq!(entry.listeners.len(), 1);
        assert!(entry.remove_first(&listener));
        assert!(!entry.remove_first(&listener));
    }

    #[test]
    fn test_registry_creation_order() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.entry_or_insert("b", ListenerLimit::Unbounded);
        registry.entry_or_insert("a", ListenerLimit::Unbounded);
        registry.entry_or_insert("b", ListenerLimit::Bounded(3));

        assert_eq!(registry.names(), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(registry.len(), 2);
        // Existing entry keeps its original limit
        assert_eq!(registry.get("b").map(|e| e.limit), Some(ListenerLimit::Unbounded));
    }

    #[test]
    fn test_registry_remove_first_event_wins() {
        let listener = noop();
        let mut registry = Registry::new();
        registry
            .entry_or_insert("first", ListenerLimit::Unbounded)
            .try_push(listener.clone());
        registry
            .entry_or_insert("second", ListenerLimit::Unbounded)
            .try_push(listener.clone());

        assert_eq!(registry.remove(&listener), Some("first".to_string()));
        assert_eq!(registry.get("first").map(|e| e.listeners.len()), Some(0));
        assert_eq!(registry.get("second").map(|e| e.listeners.len()), Some(1));

        assert_eq!(registry.remove(&listener), Some("second".to_string()));
        assert_eq!(registry.remove(&listener), None);

        // Emptied entries stay registered
        assert_eq!(registry.names().len(), 2);
    }

    #[test]
    fn test_registry_remove_all_sweeps_every_event() {
        let listener = noop();
        let other = noop();
        let mut registry = Registry::new();
        let b = registry.entry_or_insert("b", ListenerLimit::Unbounded);
        b.try_push(listener.clone());
        b.try_push(other.clone());
        b.try_push(listener.clone());
        registry
            .entry_or_insert("a", ListenerLimit::Unbounded)
            .try_push(listener.clone());
        registry.entry_or_insert("c", ListenerLimit::Unbounded);

        assert_eq!(registry.remove_all(&listener), vec!["b".to_string(), "a".to_string()]);
        assert_eq!(registry.get("b").map(|e| e.listeners.len()), Some(1));
        assert_eq!(registry.get("a").map(|e| e.listeners.len()), Some(0));
        assert!(registry.remove_all(&listener).is_empty());
        assert_eq!(registry.remove(&other), Some("b".to_string()));
    }

    #[test]
    fn test_registry_clear() {
        let mut registry = Registry::new();
        registry.entry_or_insert("a", ListenerLimit::Unbounded);
        registry.clear();

        assert!(registry.is_empty());
        assert!(registry.get("a").is_none());
        assert!(registry.get_mut("a").is_none());
    }
}
