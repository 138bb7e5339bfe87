//! # Event handler trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handlers::Notification;

/// What the chain does after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Hand the event to the next matching handler.
    Continue,
    /// Stop here; no later handler sees this event.
    EndChain,
}

/// # Event handler.
///
/// Invoked by the dispatch chain, one handler at a time, on the event loop.
/// A handler may append results to the [`Notification`], end the chain by
/// returning [`Flow::EndChain`], or fail. A failure is logged and the chain
/// continues with the next handler.
///
/// Handlers must return promptly: no other event is dispatched while one runs.
/// Long work belongs in a spawned task. To raise a new event from inside a
/// handler, use an [`EventHandle`](crate::EventHandle); the new event is
/// dispatched by its own chain after the current one finishes.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use eventvisor::{Flow, Handler, HandlerError, Info, Notification};
///
/// struct Audit;
///
/// #[async_trait]
/// impl Handler for Audit {
///     async fn on_event(&self, n: &mut Notification) -> Result<Flow, HandlerError> {
///         let affected = n.payload().source_count() as u64;
///         n.push_result(Info::new("audit.affected", affected));
///         Ok(Flow::Continue)
///     }
/// }
/// ```
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    /// Handles one event delivery.
    async fn on_event(&self, notification: &mut Notification) -> Result<Flow, HandlerError>;
}

/// Shared handle to a handler.
pub type HandlerRef = Arc<dyn Handler>;
