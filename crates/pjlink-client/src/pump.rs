//! Moves projector responses onto an application thread.
//!
//! The response signal of a [`Projector`] fires on the pool's I/O worker.
//! Applications that process events on their own cadence (a frame tick, a
//! UI loop) attach a [`MessagePump`]: it deep-copies every incoming command
//! into a mutex-guarded inbox, and [`MessagePump::update`] — called from the
//! application thread — swaps the inbox out and re-emits each command on
//! [`MessagePump::message_received`] from that thread. Protocol delivery and
//! application pacing stay decoupled; the lock is held only for the swap and
//! the push, never while subscriber code runs.

use std::sync::Arc;

use parking_lot::Mutex;

use pjlink_core::PjlinkCommand;

use crate::projector::Projector;
use crate::signal::{Signal, SlotId};

/// Collects responses from the I/O worker and replays them on the caller's
/// thread, one batch per [`MessagePump::update`].
pub struct MessagePump {
    projector: Projector,
    slot: SlotId,
    inbox: Arc<Mutex<Vec<PjlinkCommand>>>,
    received: Signal<PjlinkCommand>,
}

impl MessagePump {
    /// Subscribes to `projector`'s response signal.
    pub fn new(projector: &Projector) -> Self {
        let inbox = Arc::new(Mutex::new(Vec::new()));
        let producer = Arc::clone(&inbox);
        let slot = projector
            .response_signal()
            .connect(move |cmd: &PjlinkCommand| producer.lock().push(cmd.clone()));
        Self {
            projector: projector.clone(),
            slot,
            inbox,
            received: Signal::new(),
        }
    }

    /// Signal fired from within [`MessagePump::update`], on the calling
    /// thread, once per drained command in arrival order.
    pub fn message_received(&self) -> &Signal<PjlinkCommand> {
        &self.received
    }

    /// Number of responses waiting to be drained.
    pub fn queued(&self) -> usize {
        self.inbox.lock().len()
    }

    /// Drains the inbox and re-emits every command on
    /// [`MessagePump::message_received`]. Call once per application tick.
    pub fn update(&self) {
        let drained = std::mem::take(&mut *self.inbox.lock());
        for cmd in &drained {
            self.received.emit(cmd);
        }
    }
}

impl Drop for MessagePump {
    fn drop(&mut self) {
        self.projector.response_signal().disconnect(self.slot);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
