//! # Broadcast bus for monitor events.
//!
//! [`Bus`] is a thin wrapper around [`tokio::sync::broadcast`]. Publishing never
//! blocks, so it is safe from the event loop and from registry calls alike.
//!
//! ```text
//! Publishers:                        Receivers (any number):
//!   EventService ──┐
//!   event loop   ──┼──────► Bus ───────► subscribe() ─► test / exporter
//!   dispatch     ──┘  (broadcast chan)
//! ```
//!
//! ## Rules
//! - **Non-blocking publish**: `publish()` calls `broadcast::Sender::send` and returns.
//! - **Bounded capacity**: one ring buffer holds recent events for all receivers.
//! - **Lag handling**: slow receivers get `RecvError::Lagged(n)` and skip `n` oldest items.
//! - **No persistence**: events are lost if nobody is subscribed at send time.

use tokio::sync::broadcast;

use super::event::MonitorEvent;

/// Broadcast channel for monitor events.
///
/// Cheap to clone (internally an `Arc`-backed sender).
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<MonitorEvent>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _rx) = broadcast::channel::<MonitorEvent>(capacity);
        Self { tx }
    }

    /// Publishes an event to all current receivers; dropped if there are none.
    pub fn publish(&self, ev: MonitorEvent) {
        let _ = self.tx.send(ev);
    }

    /// Creates an independent receiver for events sent from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.tx.subscribe()
    }
}
