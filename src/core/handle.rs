//! # Handle for reporting events into a running service.
//!
//! [`EventHandle`] is a cheap clone of the command queue sender. Handlers that
//! raise follow-up events hold one (see [`EventService::handle`](crate::EventService::handle)).
//!
//! Inside a handler prefer [`EventHandle::try_report`]: the event loop is busy
//! running that handler, so waiting for queue space there would never finish.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::core::cache::Report;
use crate::core::event_loop::Command;
use crate::error::EventError;

/// Cloneable reporting handle.
#[derive(Clone, Debug)]
pub struct EventHandle {
    tx: mpsc::Sender<Command>,
    token: CancellationToken,
}

impl EventHandle {
    pub(crate) fn new(tx: mpsc::Sender<Command>, token: CancellationToken) -> Self {
        Self { tx, token }
    }

    /// Queues a report, waiting for space if the queue is full.
    pub async fn report(&self, report: Report) -> Result<(), EventError> {
        self.send(Command::Report(report)).await
    }

    /// Queues a report without waiting.
    ///
    /// Fails with [`EventError::QueueFull`] if the queue is full.
    pub fn try_report(&self, report: Report) -> Result<(), EventError> {
        if self.token.is_cancelled() {
            return Err(EventError::ShutdownInProgress);
        }
        self.tx
            .try_send(Command::Report(report))
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => EventError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => EventError::ShutdownInProgress,
            })
    }

    /// True once shutdown has begun.
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled() || self.tx.is_closed()
    }

    pub(crate) async fn send(&self, cmd: Command) -> Result<(), EventError> {
        if self.token.is_cancelled() {
            return Err(EventError::ShutdownInProgress);
        }
        self.tx
            .send(cmd)
            .await
            .map_err(|_| EventError::ShutdownInProgress)
    }
}
