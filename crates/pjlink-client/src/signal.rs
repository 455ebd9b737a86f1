//! A small thread-safe observer collection.
//!
//! [`Signal`] carries events from the I/O worker to whoever subscribed:
//! emission runs synchronously on the thread that raised the event, in
//! subscription order. Crossing to another thread is the subscriber's
//! business — [`crate::pump::MessagePump`] does exactly that for
//! application-thread delivery.
//!
//! The subscriber list is snapshotted before emission, so a callback may
//! connect or disconnect slots (including its own) without deadlocking.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync + 'static>;

/// Identifies a connected observer; pass it back to [`Signal::disconnect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotId(u64);

/// A list of observers notified synchronously on [`Signal::emit`].
pub struct Signal<T> {
    slots: Mutex<Vec<(SlotId, Callback<T>)>>,
    next_id: AtomicU64,
}

impl<T> Signal<T> {
    /// Creates a signal with no observers.
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Adds an observer and returns its slot id.
    pub fn connect(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> SlotId {
        let id = SlotId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.slots.lock().push((id, Arc::new(callback)));
        id
    }

    /// Removes an observer. Returns whether the slot was still connected.
    pub fn disconnect(&self, id: SlotId) -> bool {
        let mut slots = self.slots.lock();
        let before = slots.len();
        slots.retain(|(slot, _)| *slot != id);
        slots.len() != before
    }

    /// Number of connected observers.
    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    /// Whether no observers are connected.
    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Invokes every observer with `value`, in subscription order, on the
    /// calling thread.
    pub fn emit(&self, value: &T) {
        let snapshot: Vec<Callback<T>> = self
            .slots
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in snapshot {
            callback(value);
        }
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
