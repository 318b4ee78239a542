//! Typed event emitter.
//!
//! Maps a finite event-type key space to ordered subscriber lists. The
//! dispatch loop emits browser notifications through an emitter keyed by
//! [`CdpEventType`](crate::protocol::CdpEventType); emission is synchronous
//! and runs on the emitting task.
//!
//! Subscribers are fault-isolated: one panicking listener cannot stop the
//! remaining listeners, nor any future event, from being delivered.

// ============================================================================
// Imports
// ============================================================================

use std::fmt::Debug;
use std::hash::Hash;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tracing::warn;

// ============================================================================
// Types
// ============================================================================

/// Subscriber callback invoked for each emitted event.
pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

// ============================================================================
// EventEmitter
// ============================================================================

/// Registry mapping event-type keys to ordered subscriber lists.
///
/// Listeners for a key are invoked synchronously, in registration order.
/// Emitting for a key with no listeners is a no-op.
pub struct EventEmitter<K, E> {
    listeners: Mutex<FxHashMap<K, Vec<Listener<E>>>>,
}

impl<K, E> Default for EventEmitter<K, E>
where
    K: Eq + Hash + Copy + Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, E> EventEmitter<K, E>
where
    K: Eq + Hash + Copy + Debug,
{
    /// Creates an empty emitter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            listeners: Mutex::new(FxHashMap::default()),
        }
    }

    /// Registers a listener for the given event type.
    ///
    /// Listeners are retained for the emitter's lifetime and invoked in
    /// registration order.
    pub fn on(&self, key: K, listener: impl Fn(&E) + Send + Sync + 'static) {
        self.listeners
            .lock()
            .entry(key)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Removes every listener registered for the given event type.
    pub fn remove_listeners(&self, key: K) {
        self.listeners.lock().remove(&key);
    }

    /// Returns the number of listeners registered for the given event type.
    #[must_use]
    pub fn listener_count(&self, key: K) -> usize {
        self.listeners.lock().get(&key).map_or(0, Vec::len)
    }

    /// Invokes every listener registered for `key`, in registration order.
    ///
    /// A panicking listener is caught and logged; the remaining listeners
    /// still run. The subscriber list is snapshotted before invocation so a
    /// listener may register further listeners without deadlocking.
    pub fn emit(&self, key: K, event: &E) {
        let snapshot: Vec<Listener<E>> = {
            let listeners = self.listeners.lock();
            match listeners.get(&key) {
                Some(list) => list.clone(),
                None => return,
            }
        };

        for listener in snapshot {
            if let Err(panic) = catch_unwind(AssertUnwindSafe(|| listener(event))) {
                let reason = panic_message(panic.as_ref());
                warn!(event_type = ?key, reason, "Event listener panicked");
            }
        }
    }
}

/// Extracts a printable message from a panic payload.
fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Key {
        A,
        B,
    }

    #[test]
    fn test_emit_in_registration_order() {
        let emitter: EventEmitter<Key, u32> = EventEmitter::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            emitter.on(Key::A, move |_| order.lock().push(tag));
        }

        emitter.emit(Key::A, &0);
        assert_eq!(*order.lock(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_emit_unregistered_key_is_noop() {
        let emitter: EventEmitter<Key, u32> = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        emitter.on(Key::A, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        emitter.emit(Key::B, &0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_listener_is_isolated() {
        let emitter: EventEmitter<Key, u32> = EventEmitter::new();
        let hits = Arc::new(AtomicUsize::new(0));

        emitter.on(Key::A, |_| panic!("listener bug"));
        let counter = Arc::clone(&hits);
        emitter.on(Key::A, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        // The panicking listener must not block the second one, nor the
        // next emission.
        emitter.emit(Key::A, &1);
        emitter.emit(Key::A, &2);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_listener_may_register_listener() {
        let emitter: Arc<EventEmitter<Key, u32>> = Arc::new(EventEmitter::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let inner_emitter = Arc::clone(&emitter);
        let counter = Arc::clone(&hits);
        emitter.on(Key::A, move |_| {
            let counter = Arc::clone(&counter);
            inner_emitter.on(Key::B, move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });
        });

        emitter.emit(Key::A, &0);
        emitter.emit(Key::B, &0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_count_and_removal() {
        let emitter: EventEmitter<Key, u32> = EventEmitter::new();
        emitter.on(Key::A, |_| {});
        emitter.on(Key::A, |_| {});
        assert_eq!(emitter.listener_count(Key::A), 2);
        assert_eq!(emitter.listener_count(Key::B), 0);

        emitter.remove_listeners(Key::A);
        assert_eq!(emitter.listener_count(Key::A), 0);
    }

    #[test]
    fn test_event_payload_passed_by_reference() {
        let emitter: EventEmitter<Key, String> = EventEmitter::new();
        let seen = Arc::new(Mutex::new(String::new()));

        let sink = Arc::clone(&seen);
        emitter.on(Key::A, move |event| {
            sink.lock().push_str(event);
        });

        emitter.emit(Key::A, &"payload".to_string());
        assert_eq!(*seen.lock(), "payload");
    }
}
