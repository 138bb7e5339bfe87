//! Error types used by the eventvisor runtime and by event handlers.
//!
//! This module defines two main error enums:
//!
//! - [`EventError`]: errors returned by registry, cache and service operations,
//!   plus the terminal `NoMatchingHandler` outcome of a dispatch.
//! - [`HandlerError`]: failures of a single handler invocation. These never
//!   leave the dispatch chain: they are logged and the chain moves on.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging/metrics.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::types::StatusCode;

/// # Errors produced by the eventvisor runtime.
///
/// Structural errors (`DuplicateName`, `NotFound`, `EmptyRange`) are returned
/// synchronously and leave state untouched. `HandlerFailed` and
/// `NoMatchingHandler` describe dispatch outcomes; they reach callers through
/// [`Delivery::failures`](crate::Delivery::failures) and
/// [`Delivery::error`](crate::Delivery::error).
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EventError {
    /// A handler with this name is already registered.
    #[error("handler '{name}' is already registered")]
    DuplicateName {
        /// The conflicting name.
        name: String,
    },

    /// No handler is registered under this handle or name.
    #[error("handler '{handler}' not found")]
    NotFound {
        /// The handle or name that was looked up.
        handler: String,
    },

    /// A handler signaled failure; the chain continued without it.
    #[error("handler '{handler}' failed: {reason}")]
    HandlerFailed {
        /// Name of the failing handler.
        handler: Arc<str>,
        /// Failure description.
        reason: String,
    },

    /// A reported event matched no handler at all, defaults included.
    #[error("no handler matched status {code}")]
    NoMatchingHandler {
        /// The unhandled status code.
        code: StatusCode,
    },

    /// The service is shutting down and no longer accepts work.
    #[error("shutdown in progress")]
    ShutdownInProgress,

    /// An explicit range was built from an empty process set.
    #[error("explicit range must name at least one process")]
    EmptyRange,

    /// The report queue is full (retry, or use the awaiting `report_event`).
    #[error("report queue full")]
    QueueFull,

    /// Teardown found handlers still referenced by an in-flight chain.
    #[error("handlers still in use at teardown: {names:?}")]
    HandlersInUse {
        /// Names of the handlers with outstanding references.
        names: Vec<String>,
    },

    /// The event loop ended abnormally; pending chains and their completions
    /// may have been lost.
    #[error("event loop failed: {reason}")]
    EventLoopFailed {
        /// Join error rendered as text.
        reason: String,
    },

    /// A process identity string could not be parsed.
    #[error("invalid process identity '{input}'")]
    InvalidIdentity {
        /// The rejected input.
        input: String,
    },
}

impl EventError {
    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::EventError;
    ///
    /// let err = EventError::DuplicateName { name: "h1".into() };
    /// assert_eq!(err.as_label(), "duplicate_name");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::DuplicateName { .. } => "duplicate_name",
            EventError::NotFound { .. } => "not_found",
            EventError::HandlerFailed { .. } => "handler_failed",
            EventError::NoMatchingHandler { .. } => "no_matching_handler",
            EventError::ShutdownInProgress => "shutdown_in_progress",
            EventError::EmptyRange => "empty_range",
            EventError::QueueFull => "queue_full",
            EventError::HandlersInUse { .. } => "handlers_in_use",
            EventError::EventLoopFailed { .. } => "event_loop_failed",
            EventError::InvalidIdentity { .. } => "invalid_identity",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            EventError::DuplicateName { name } => format!("duplicate handler name: {name}"),
            EventError::NotFound { handler } => format!("unknown handler: {handler}"),
            EventError::HandlerFailed { handler, reason } => {
                format!("handler {handler} failed: {reason}")
            }
            EventError::NoMatchingHandler { code } => format!("unhandled status: {code}"),
            EventError::ShutdownInProgress => "shutdown in progress".to_string(),
            EventError::EmptyRange => "empty explicit range".to_string(),
            EventError::QueueFull => "report queue full".to_string(),
            EventError::HandlersInUse { names } => format!("in-use handlers: {names:?}"),
            EventError::EventLoopFailed { reason } => format!("event loop failed: {reason}"),
            EventError::InvalidIdentity { input } => format!("bad identity: {input}"),
        }
    }
}

/// # Errors produced by a single handler invocation.
///
/// A handler returns `Fail` itself; `Timeout` and `Panicked` are produced by the
/// dispatch chain around the call.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Handler reported a failure.
    #[error("handler failed: {error}")]
    Fail {
        /// The underlying error message.
        error: String,
    },

    /// Handler did not return within the configured handler timeout.
    #[error("handler timed out after {timeout:?}")]
    Timeout {
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// Handler panicked; the panic was caught.
    #[error("handler panicked: {info}")]
    Panicked {
        /// Panic payload rendered as text.
        info: String,
    },
}

impl HandlerError {
    /// Shorthand for [`HandlerError::Fail`].
    pub fn fail(error: impl Into<String>) -> Self {
        HandlerError::Fail {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs/metrics.
    ///
    /// # Example
    /// ```
    /// use eventvisor::HandlerError;
    ///
    /// assert_eq!(HandlerError::fail("boom").as_label(), "handler_fail");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            HandlerError::Fail { .. } => "handler_fail",
            HandlerError::Timeout { .. } => "handler_timeout",
            HandlerError::Panicked { .. } => "handler_panicked",
        }
    }

    /// Returns a human-readable message with details about the error.
    pub fn as_message(&self) -> String {
        match self {
            HandlerError::Fail { error } => format!("error: {error}"),
            HandlerError::Timeout { timeout } => format!("timeout: {timeout:?}"),
            HandlerError::Panicked { info } => format!("panic: {info}"),
        }
    }

    /// Converts into the chain-level [`EventError::HandlerFailed`] for `handler`.
    pub fn into_event_error(self, handler: Arc<str>) -> EventError {
        EventError::HandlerFailed {
            handler,
            reason: self.as_message(),
        }
    }
}
