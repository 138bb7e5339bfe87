//! # Handler abstractions and registrations.
//!
//! This module provides the handler-facing types:
//! - [`Handler`] - trait for implementing async event handlers
//! - [`HandlerFn`] - closure-backed handler implementation
//! - [`HandlerRef`] - shared reference to a handler (`Arc<dyn Handler>`)
//! - [`HandlerSpec`] - registration bundling a handler with its codes, range and placement
//! - [`Notification`] - the event view a handler receives and may annotate
//! - [`Flow`] - a handler's decision to continue or end the chain

#[cfg(feature = "logging")]
mod embedded;
mod handler;
mod handler_fn;
mod notification;
mod spec;

#[cfg(feature = "logging")]
pub use embedded::LogHandler;
pub use handler::{Flow, Handler, HandlerRef};
pub use handler_fn::HandlerFn;
pub use notification::Notification;
pub use spec::HandlerSpec;
