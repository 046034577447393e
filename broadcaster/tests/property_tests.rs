//! Property-based tests for registry invariants
//!
//! Each block drives a fresh broadcaster with generated operations and
//! checks an invariant that must hold for any input.

use std::sync::{Arc, Mutex};

use broadcaster::{args, Broadcaster, Listener, ListenerLimit};
use proptest::prelude::*;

// ============================================================================
// Test Helpers
// ============================================================================

/// Strategy for short, non-empty event names from a small alphabet so that
/// generated operations collide on the same events
fn event_name_strategy() -> impl Strategy<Value = String> {
    "[a-d]{1,2}"
}

/// An operation against the registry
#[derive(Debug, Clone)]
enum Op {
    Add { event: String },
    Once { event: String },
    Remove { slot: usize },
    Cap { event: String, max: usize },
    Uncap { event: String },
    Emit { event: String },
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => event_name_strategy().prop_map(|event| Op::Add { event }),
        2 => event_name_strategy().prop_map(|event| Op::Once { event }),
        2 => (0usize..32).prop_map(|slot| Op::Remove { slot }),
        1 => (event_name_strategy(), 0usize..4).prop_map(|(event, max)| Op::Cap { event, max }),
        1 => event_name_strategy().prop_map(|event| Op::Uncap { event }),
        2 => event_name_strategy().prop_map(|event| Op::Emit { event }),
    ]
}

// ============================================================================
// Emission order
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any number of listeners on one event, a single emission invokes
    /// each of them exactly once, in registration order, with the argument.
    #[test]
    fn prop_emission_follows_registration_order(count in 0usize..20, value in any::<i64>()) {
        let broadcaster = Broadcaster::new();
        let log = Arc::new(Mutex::new(Vec::new()));

        for index in 0..count {
            let log = Arc::clone(&log);
            broadcaster
                .on("e", Listener::new(move |args| {
                    log.lock().unwrap().push((index, args.get::<i64>(0).copied()));
                }))
                .unwrap();
        }

        prop_assert_eq!(broadcaster.emit("e", args![value]).unwrap(), count);

        let expected: Vec<(usize, Option<i64>)> = (0..count).map(|i| (i, Some(value))).collect();
        prop_assert_eq!(log.lock().unwrap().clone(), expected);
    }
}

// ============================================================================
// Cap invariant
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any cap and any number of registration attempts, exactly
    /// `min(cap, attempts)` registrations succeed.
    #[test]
    fn prop_cap_bounds_registrations(cap in 0usize..10, attempts in 0usize..20) {
        let broadcaster = Broadcaster::new();
        broadcaster.set_max_listeners("e", ListenerLimit::Bounded(cap)).unwrap();

        let accepted = (0..attempts)
            .filter(|_| broadcaster.on("e", Listener::new(|_| {})).is_ok())
            .count();

        prop_assert_eq!(accepted, cap.min(attempts));
        prop_assert_eq!(broadcaster.listener_count("e"), cap.min(attempts));
    }
}

// ============================================================================
// Arbitrary operation sequences
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// For any sequence of operations:
    /// - no event ever holds more listeners than its cap
    /// - `events()` lists every name that was ever registered, nothing else
    /// - once-listeners fire at most once
    #[test]
    fn prop_registry_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..60)) {
        let broadcaster = Broadcaster::new();
        let mut handles: Vec<Listener> = Vec::new();
        let mut registered: Vec<String> = Vec::new();
        let once_fires = Arc::new(Mutex::new(Vec::<usize>::new()));
        let mut once_count = 0usize;

        for op in ops {
            match op {
                Op::Add { event } => {
                    let result = broadcaster.on(&event, Listener::new(|_| {}));
                    if !registered.contains(&event) {
                        registered.push(event);
                    }
                    if let Ok(listener) = result {
                        handles.push(listener);
                    }
                }
                Op::Once { event } => {
                    let id = once_count;
                    once_count += 1;
                    let fires = Arc::clone(&once_fires);
                    let result = broadcaster.once(&event, Listener::new(move |_| {
                        fires.lock().unwrap().push(id);
                    }));
                    if !registered.contains(&event) {
                        registered.push(event);
                    }
                    if let Ok(wrapper) = result {
                        handles.push(wrapper);
                    }
                }
                Op::Remove { slot } => {
                    if !handles.is_empty() {
                        let listener = handles[slot % handles.len()].clone();
                        broadcaster.remove_listener(&listener);
                    }
                }
                Op::Cap { event, max } => {
                    let _ = broadcaster.set_max_listeners(&event, ListenerLimit::Bounded(max));
                    if !registered.contains(&event) {
                        registered.push(event);
                    }
                }
                Op::Uncap { event } => {
                    broadcaster.set_max_listeners(&event, ListenerLimit::Unbounded).unwrap();
                    if !registered.contains(&event) {
                        registered.push(event);
                    }
                }
                Op::Emit { event } => {
                    broadcaster.emit(&event, args![]).unwrap();
                }
            }

            for event in broadcaster.events() {
                let count = broadcaster.listener_count(&event);
                match broadcaster.max_listeners(&event) {
                    Some(ListenerLimit::Bounded(max)) => prop_assert!(count <= max),
                    Some(ListenerLimit::Unbounded) => {}
                    None => prop_assert!(false, "listed event {} has no entry", event),
                }
            }
        }

        prop_assert_eq!(broadcaster.events(), registered);

        let mut fired = once_fires.lock().unwrap().clone();
        let total = fired.len();
        fired.sort_unstable();
        fired.dedup();
        prop_assert_eq!(fired.len(), total, "a once-listener fired twice");
    }
}

// ============================================================================
// Removal
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any handle registered `n` times across events, exactly `n`
    /// removals succeed and the next one fails.
    #[test]
    fn prop_removal_count_matches_registrations(events in prop::collection::vec(event_name_strategy(), 1..10)) {
        let broadcaster = Broadcaster::new();
        let listener = Listener::new(|_| {});

        for event in &events {
            broadcaster.on(event, listener.clone()).unwrap();
        }

        for _ in 0..events.len() {
            prop_assert!(broadcaster.remove_listener(&listener));
        }
        prop_assert!(!broadcaster.remove_listener(&listener));

        for event in broadcaster.events() {
            prop_assert_eq!(broadcaster.listener_count(&event), 0);
        }
    }
}
