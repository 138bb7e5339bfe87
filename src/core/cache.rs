//! # Event cache: per-code coalescing of repeated reports.
//!
//! [`EventCache`] holds at most one [`PendingEvent`] per status code. The first
//! report of a code opens an entry and arms a one-shot timer; every further
//! report of the same code merges into it (its source is prepended, its extra
//! info appended, its completions kept) and pushes the timer back to `now + W`.
//! When the timer fires, or on an explicit flush, the entry leaves the cache
//! and becomes a dispatch chain.
//!
//! ```text
//! report(7, A) ── no entry ──► open   { sources: [A] }        timer: t0 + W
//! report(7, B) ── entry    ──► merge  { sources: [B, A] }     timer: t1 + W
//! report(7, C) ── entry    ──► merge  { sources: [C, B, A] }  timer: t2 + W
//!                                  ... quiet for W ...
//! timer fires  ──────────────► take entry → dispatch chain (code 7, source A)
//! report(7, D) ── no entry ──► open   { sources: [D] }        (fresh burst)
//! ```
//!
//! ## Rules
//! - A merge never moves the deadline earlier than the one already armed.
//! - With a coalescing bound the deadline never passes `first_seen + bound`.
//! - Timers are `tokio_util::time::DelayQueue` keys: insert = schedule,
//!   reset = reschedule, remove = cancel.
//! - The window and the bound are clamped to [`MAX_TIMER_DELAY`]; the timer
//!   wheel cannot hold deadlines much further out. The queue is rebuilt once
//!   it is older than that, so long-lived entries stay within its horizon.

use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

use futures::StreamExt;
use tokio::time::Instant;
use tokio_util::time::{DelayQueue, delay_queue};

use crate::core::chain::{Completion, Delivery};
use crate::policies::DefaultDelivery;
use crate::types::{Info, Payload, ProcId, Range, StatusCode};

/// One event report.
///
/// ## Example
/// ```rust
/// use eventvisor::{DefaultDelivery, Info, ProcId, Report, StatusCode};
///
/// let report = Report::new(StatusCode(7), ProcId::new("job-1", 3))
///     .with_info(Info::new("reason", "link down"))
///     .with_defaults(DefaultDelivery::Always)
///     .on_complete(|delivery| println!("handled by {:?}", delivery.visited));
///
/// assert_eq!(report.code(), StatusCode(7));
/// ```
pub struct Report {
    code: StatusCode,
    source: ProcId,
    range: Range,
    info: Vec<Info>,
    defaults: Option<DefaultDelivery>,
    completions: Vec<Completion>,
}

impl Report {
    /// Creates a report of `code` raised by `source`, scoped to every process.
    pub fn new(code: impl Into<StatusCode>, source: ProcId) -> Self {
        Self {
            code: code.into(),
            source,
            range: Range::All,
            info: Vec::new(),
            defaults: None,
            completions: Vec::new(),
        }
    }

    /// Sets the range the event is reported for.
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    /// Appends one extra info entry.
    pub fn with_info(mut self, info: Info) -> Self {
        self.info.push(info);
        self
    }

    /// Appends extra info entries.
    pub fn with_infos(mut self, info: impl IntoIterator<Item = Info>) -> Self {
        self.info.extend(info);
        self
    }

    /// Chooses the default-category policy for this report.
    pub fn with_defaults(mut self, defaults: DefaultDelivery) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Adds a completion, called exactly once when the event's chain finishes.
    ///
    /// Completions run on the event loop; they must not block.
    pub fn on_complete<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&Delivery) + Send + 'static,
    {
        self.completions.push(Box::new(f));
        self
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    pub fn source(&self) -> &ProcId {
        &self.source
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub(crate) fn push_completion(&mut self, completion: Completion) {
        self.completions.push(completion);
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Report")
            .field("code", &self.code)
            .field("source", &self.source)
            .field("range", &self.range)
            .field("info", &self.info)
            .field("defaults", &self.defaults)
            .field("completions", &self.completions.len())
            .finish()
    }
}

/// A coalesced event waiting for its timer.
pub(crate) struct PendingEvent {
    pub(crate) code: StatusCode,
    /// First reporter; becomes the chain source.
    pub(crate) source: ProcId,
    pub(crate) range: Range,
    pub(crate) payload: Payload,
    /// Strongest policy any merged report asked for.
    pub(crate) defaults: Option<DefaultDelivery>,
    pub(crate) completions: Vec<Completion>,
    first_seen: Instant,
    deadline: Instant,
    key: delay_queue::Key,
}

impl fmt::Debug for PendingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingEvent")
            .field("code", &self.code)
            .field("source", &self.source)
            .field("sources", &self.payload.source_count())
            .field("deadline", &self.deadline)
            .finish_non_exhaustive()
    }
}

/// What [`EventCache::report`] did with a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Cached {
    /// Opened a new entry; flush in `delay`.
    Opened { delay: Duration },
    /// Merged into the pending entry, which now lists `sources`; flush in `delay`.
    Merged { sources: usize, delay: Duration },
}

/// Longest delay a single timer is armed for (365 days).
pub(crate) const MAX_TIMER_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

fn deadline_after(from: Instant, delay: Duration) -> Instant {
    from.checked_add(delay).unwrap_or(from)
}

/// Per-code coalescing cache.
pub(crate) struct EventCache {
    window: Duration,
    limit: Option<Duration>,
    entries: HashMap<StatusCode, PendingEvent>,
    timers: DelayQueue<StatusCode>,
    epoch: Instant,
}

impl EventCache {
    pub(crate) fn new(window: Duration, limit: Option<Duration>) -> Self {
        Self {
            window: window.min(MAX_TIMER_DELAY),
            limit: limit.map(|l| l.min(MAX_TIMER_DELAY)),
            entries: HashMap::new(),
            timers: DelayQueue::new(),
            epoch: Instant::now(),
        }
    }

    /// Opens or merges an entry for the report's code.
    pub(crate) fn report(&mut self, report: Report) -> Cached {
        let now = Instant::now();
        let aged = now.saturating_duration_since(self.epoch) >= MAX_TIMER_DELAY;
        if self.entries.is_empty() || aged {
            self.rebase(now);
        }
        let Report {
            code,
            source,
            range,
            info,
            defaults,
            completions,
        } = report;

        if let Some(pending) = self.entries.get_mut(&code) {
            let mut deadline = deadline_after(now, self.window);
            if let Some(limit) = self.limit {
                deadline = deadline.min(deadline_after(pending.first_seen, limit));
            }
            deadline = deadline.max(pending.deadline);

            pending.payload.prepend_source(source);
            pending.payload.extend_extra(info);
            pending.defaults = match (pending.defaults, defaults) {
                (Some(a), Some(b)) => Some(a.merge(b)),
                (a, b) => a.or(b),
            };
            pending.completions.extend(completions);
            if deadline != pending.deadline {
                pending.deadline = deadline;
                self.timers.reset_at(&pending.key, deadline);
            }

            return Cached::Merged {
                sources: pending.payload.source_count(),
                delay: deadline.saturating_duration_since(now),
            };
        }

        let mut delay = self.window;
        if let Some(limit) = self.limit {
            delay = delay.min(limit);
        }
        let deadline = deadline_after(now, delay);
        let key = self.timers.insert_at(code, deadline);
        self.entries.insert(
            code,
            PendingEvent {
                code,
                payload: Payload::new(source.clone(), info),
                source,
                range,
                defaults,
                completions,
                first_seen: now,
                deadline,
                key,
            },
        );
        Cached::Opened { delay }
    }

    /// Takes the entry for `code` out of the cache and cancels its timer.
    pub(crate) fn flush(&mut self, code: StatusCode) -> Option<PendingEvent> {
        let pending = self.entries.remove(&code)?;
        self.timers.remove(&pending.key);
        Some(pending)
    }

    /// Takes every entry out of the cache, earliest deadline first.
    pub(crate) fn drain(&mut self) -> Vec<PendingEvent> {
        let mut all: Vec<PendingEvent> = self.entries.drain().map(|(_, p)| p).collect();
        self.timers.clear();
        all.sort_by_key(|p| (p.deadline, p.code));
        all
    }

    /// Waits for the next due entry and takes it out of the cache.
    ///
    /// Resolves to `None` right away when nothing is pending.
    pub(crate) async fn next_due(&mut self) -> Option<PendingEvent> {
        loop {
            let code = self.timers.next().await?.into_inner();
            if let Some(pending) = self.entries.remove(&code) {
                return Some(pending);
            }
        }
    }

    /// Moves every armed timer into a fresh queue whose clock starts at `now`.
    fn rebase(&mut self, now: Instant) {
        let mut timers = DelayQueue::with_capacity(self.entries.len());
        for pending in self.entries.values_mut() {
            pending.key = timers.insert_at(pending.code, pending.deadline);
        }
        self.timers = timers;
        self.epoch = now;
    }

    pub(crate) fn set_window(&mut self, window: Duration) {
        self.window = window.min(MAX_TIMER_DELAY);
    }

    pub(crate) fn window(&self) -> Duration {
        self.window
    }

    pub(crate) fn contains(&self, code: StatusCode) -> bool {
        self.entries.contains_key(&code)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
