//! # Closure-backed handler (`HandlerFn`)
//!
//! [`HandlerFn`] wraps a synchronous closure `F: Fn(&mut Notification) -> Result<Flow, HandlerError>`.
//! Most handlers only inspect the event and record something, so a plain closure
//! avoids writing a trait impl. Shared state goes into the closure explicitly
//! (`Arc<...>`).
//!
//! ## Example
//! ```rust
//! use eventvisor::{Flow, HandlerFn, HandlerRef, Notification};
//!
//! let h: HandlerRef = HandlerFn::arc(|n: &mut Notification| {
//!     println!("status {} from {}", n.code(), n.source());
//!     Ok(Flow::Continue)
//! });
//! # let _ = h;
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerError;
use crate::handlers::{Flow, Handler, Notification};

/// Closure-backed handler implementation.
pub struct HandlerFn<F> {
    f: F,
}

impl<F> HandlerFn<F>
where
    F: Fn(&mut Notification) -> Result<Flow, HandlerError> + Send + Sync + 'static,
{
    /// Creates a new closure-backed handler.
    ///
    /// Prefer [`HandlerFn::arc`] when you immediately need a [`HandlerRef`](crate::HandlerRef).
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the handler and returns it as a shared handle.
    pub fn arc(f: F) -> Arc<Self> {
        Arc::new(Self::new(f))
    }
}

impl<F> fmt::Debug for HandlerFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerFn").finish_non_exhaustive()
    }
}

#[async_trait]
impl<F> Handler for HandlerFn<F>
where
    F: Fn(&mut Notification) -> Result<Flow, HandlerError> + Send + Sync + 'static,
{
    async fn on_event(&self, notification: &mut Notification) -> Result<Flow, HandlerError> {
        (self.f)(notification)
    }
}
