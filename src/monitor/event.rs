//! # Monitor events emitted by the dispatch service.
//!
//! [`MonitorKind`] classifies what happened:
//! - **Registry**: handler registered / deregistered / removal deferred
//! - **Cache**: event cached, merged, window changed
//! - **Dispatch**: chain started / handler failed / chain ended early / chain completed,
//!   no matching handler
//! - **Shutdown**: requested, complete
//!
//! [`MonitorEvent`] carries the metadata relevant to each kind.
//!
//! ## Ordering guarantees
//! Each event gets a globally unique, monotonically increasing `seq`.
//!
//! ## Example
//! ```rust
//! use eventvisor::{MonitorEvent, MonitorKind, StatusCode};
//!
//! let ev = MonitorEvent::new(MonitorKind::HandlerFailed)
//!     .with_code(StatusCode(7))
//!     .with_handler("audit")
//!     .with_reason("boom");
//!
//! assert_eq!(ev.kind, MonitorKind::HandlerFailed);
//! assert_eq!(ev.handler.as_deref(), Some("audit"));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::types::{ProcId, StatusCode};

static MONITOR_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of monitor events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorKind {
    // === Registry ===
    /// A handler was registered.
    ///
    /// Sets: `handler`.
    HandlerRegistered,

    /// A handler was removed from the registry.
    ///
    /// Sets: `handler`.
    HandlerDeregistered,

    /// A deregistered handler is still held by an in-flight chain; its record
    /// is dropped when that chain finishes.
    ///
    /// Sets: `handler`.
    RemovalDeferred,

    // === Cache ===
    /// First report of a code opened a cache entry.
    ///
    /// Sets: `code`, `source`, `delay_ms` (time until dispatch).
    EventCached,

    /// A report was merged into a pending cache entry.
    ///
    /// Sets: `code`, `source`, `count` (sources so far), `delay_ms`.
    EventMerged,

    /// The coalescing window was changed.
    ///
    /// Sets: `delay_ms` (new window).
    WindowChanged,

    // === Dispatch ===
    /// A dispatch chain began.
    ///
    /// Sets: `code`, `source`, `count` (handlers planned).
    ChainStarted,

    /// A handler returned an error, timed out or panicked; the chain continued.
    ///
    /// Sets: `code`, `handler`, `reason`.
    HandlerFailed,

    /// A handler ended the chain early.
    ///
    /// Sets: `code`, `handler`.
    ChainEnded,

    /// A chain finished and its completions ran.
    ///
    /// Sets: `code`, `count` (handlers invoked).
    ChainCompleted,

    /// No handler matched a dispatched event.
    ///
    /// Sets: `code`, `source`.
    NoMatchingHandler,

    // === Shutdown ===
    /// Shutdown was requested.
    ShutdownRequested,

    /// Pending events were flushed and the registry torn down.
    ///
    /// Sets: `count` (events flushed), `reason` (teardown error, if any).
    ShutdownComplete,
}

/// Monitor event with optional metadata.
#[derive(Debug, Clone)]
pub struct MonitorEvent {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: MonitorKind,

    /// Status code involved, if any.
    pub code: Option<StatusCode>,
    /// Handler name, if any.
    pub handler: Option<Arc<str>>,
    /// Reporting process, if any.
    pub source: Option<ProcId>,
    /// Human-readable reason.
    pub reason: Option<Arc<str>>,
    /// Kind-specific counter (sources, handlers, flushed events).
    pub count: Option<u32>,
    /// Delay in milliseconds (compact).
    pub delay_ms: Option<u32>,
}

impl MonitorEvent {
    /// Creates an event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: MonitorKind) -> Self {
        Self {
            seq: MONITOR_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            code: None,
            handler: None,
            source: None,
            reason: None,
            count: None,
            delay_ms: None,
        }
    }

    #[inline]
    pub fn with_code(mut self, code: StatusCode) -> Self {
        self.code = Some(code);
        self
    }

    #[inline]
    pub fn with_handler(mut self, name: impl Into<Arc<str>>) -> Self {
        self.handler = Some(name.into());
        self
    }

    #[inline]
    pub fn with_source(mut self, source: ProcId) -> Self {
        self.source = Some(source);
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches a counter (saturates at `u32::MAX`).
    #[inline]
    pub fn with_count(mut self, n: usize) -> Self {
        self.count = Some(u32::try_from(n).unwrap_or(u32::MAX));
        self
    }

    /// Attaches a delay (stored as milliseconds).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }
}
