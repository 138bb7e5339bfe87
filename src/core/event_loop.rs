//! # Event loop: the single task that owns the cache and runs chains.
//!
//! All cache mutation and all handler invocation happen here, one at a time.
//! Callers hand work over through the command queue.
//!
//! ```text
//! loop (biased select):
//!   token.cancelled()   → leave loop, drain
//!   cache.next_due()    → dispatch(pending)            (only while cache non-empty)
//!   rx.recv()           → Report    → cache.report()   (open / merge)
//!                         Flush     → cache.flush(code) → dispatch → reply
//!                         FlushAll  → cache.drain()     → dispatch each → reply K
//!                         SetWindow → cache.set_window()
//!
//! drain:
//!   rx.close(); handle every queued command; dispatch everything still pending
//! ```
//!
//! Reports raised by a handler go through the same queue, so they start a new
//! cache entry or chain after the current chain finishes.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

use crate::core::cache::{Cached, EventCache, PendingEvent, Report};
use crate::core::chain::Dispatcher;
use crate::monitor::{MonitorEvent, MonitorKind};
use crate::types::StatusCode;

/// Work handed to the event loop.
pub(crate) enum Command {
    Report(Report),
    Flush {
        code: StatusCode,
        reply: oneshot::Sender<bool>,
    },
    FlushAll {
        reply: oneshot::Sender<usize>,
    },
    SetWindow(Duration),
}

pub(crate) struct EventLoop {
    cache: EventCache,
    rx: mpsc::Receiver<Command>,
    dispatcher: Dispatcher,
    token: CancellationToken,
}

impl EventLoop {
    pub(crate) fn new(
        cache: EventCache,
        rx: mpsc::Receiver<Command>,
        dispatcher: Dispatcher,
        token: CancellationToken,
    ) -> Self {
        Self {
            cache,
            rx,
            dispatcher,
            token,
        }
    }

    /// Runs until cancelled (or every sender is gone), then drains.
    ///
    /// Returns the number of chains dispatched by the final drain.
    pub(crate) async fn run(mut self) -> usize {
        loop {
            tokio::select! {
                biased;

                _ = self.token.cancelled() => break,

                Some(pending) = self.cache.next_due(), if !self.cache.is_empty() => {
                    self.dispatch(pending).await;
                }
                cmd = self.rx.recv() => match cmd {
                    Some(cmd) => self.handle(cmd).await,
                    None => break,
                },
            }
        }
        self.drain().await
    }

    async fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Report(report) => self.on_report(report),
            Command::Flush { code, reply } => {
                let hit = match self.cache.flush(code) {
                    Some(pending) => {
                        self.dispatch(pending).await;
                        true
                    }
                    None => false,
                };
                let _ = reply.send(hit);
            }
            Command::FlushAll { reply } => {
                let n = self.flush_all().await;
                let _ = reply.send(n);
            }
            Command::SetWindow(window) => {
                tracing::debug!(old = ?self.cache.window(), new = ?window, "coalescing window changed");
                self.cache.set_window(window);
                self.dispatcher
                    .bus
                    .publish(MonitorEvent::new(MonitorKind::WindowChanged).with_delay(window));
            }
        }
    }

    fn on_report(&mut self, report: Report) {
        let code = report.code();
        let source = report.source().clone();

        let ev = match self.cache.report(report) {
            Cached::Opened { delay } => {
                tracing::debug!(code = %code, source = %source, ?delay, "event cached");
                MonitorEvent::new(MonitorKind::EventCached).with_delay(delay)
            }
            Cached::Merged { sources, delay } => {
                tracing::debug!(code = %code, source = %source, sources, ?delay, "event merged");
                MonitorEvent::new(MonitorKind::EventMerged)
                    .with_count(sources)
                    .with_delay(delay)
            }
        };
        self.dispatcher
            .bus
            .publish(ev.with_code(code).with_source(source));
    }

    async fn dispatch(&mut self, pending: PendingEvent) {
        tracing::debug!(code = %pending.code, sources = pending.payload.source_count(), "flushing event");
        self.dispatcher.dispatch(pending).await;
    }

    async fn flush_all(&mut self) -> usize {
        let pending = self.cache.drain();
        let n = pending.len();
        for p in pending {
            self.dispatch(p).await;
        }
        n
    }

    async fn drain(mut self) -> usize {
        self.rx.close();
        while let Some(cmd) = self.rx.recv().await {
            self.handle(cmd).await;
        }
        self.flush_all().await
    }
}
