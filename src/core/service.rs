//! # Event service: registry, coalescing cache and dispatch behind one handle.
//!
//! [`EventService`] is the explicit context object of the subsystem. It owns
//! the handler registry (shared with the event loop), the monitor [`Bus`] and
//! the command queue into the event loop, which owns the cache and runs every
//! chain.
//!
//! ## Architecture
//! ```text
//! callers ── register / deregister ──► RwLock<Registry> ◄── read plan / release ──┐
//!    │                                                                          │
//!    └── report / flush / window ──► mpsc queue ──► EventLoop ─► EventCache     │
//!                                                      │       (DelayQueue)      │
//!                                                      └─► Dispatcher ───────────┘
//!                                                             └─► handlers (one at a time)
//!                                                             └─► completions (exactly once)
//!
//! every step ──► Bus (MonitorEvent) ──► subscribe()
//! ```
//!
//! ## Shutdown path
//! ```text
//! shutdown()
//!   └─► Bus.publish(ShutdownRequested)
//!   └─► token.cancel()          → new reports/registrations fail with ShutdownInProgress
//!   └─► event loop drains       → queued reports merged, every pending entry dispatched
//!   └─► registry.teardown()     → Err(HandlersInUse) if a chain still holds an entry
//!   └─► Bus.publish(ShutdownComplete)
//! ```
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eventvisor::{
//!     Config, EventService, Flow, HandlerFn, HandlerSpec, Notification, ProcId, Report,
//!     StatusCode,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventvisor::EventError> {
//!     let mut cfg = Config::default();
//!     cfg.coalescing_window = Duration::from_millis(10);
//!     let svc = EventService::builder(cfg).build()?;
//!
//!     svc.register_handler(
//!         HandlerSpec::new("faults", HandlerFn::arc(|n: &mut Notification| {
//!             println!("{} raised by {} processes", n.code(), n.payload().source_count());
//!             Ok(Flow::Continue)
//!         }))
//!         .with_code(StatusCode(7)),
//!     )
//!     .await?;
//!
//!     let receipt = svc
//!         .report_with_receipt(Report::new(StatusCode(7), ProcId::new("job", 0)))
//!         .await?;
//!     let delivery = receipt.await.expect("delivery");
//!     assert!(delivery.is_handled());
//!
//!     svc.shutdown().await
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{
    builder::EventServiceBuilder,
    cache::Report,
    chain::Delivery,
    config::Config,
    event_loop::Command,
    handle::EventHandle,
};
use crate::error::EventError;
use crate::handlers::HandlerSpec;
use crate::monitor::{Bus, MonitorEvent, MonitorKind};
use crate::registry::{HandlerId, Registry, Removal};
use crate::types::StatusCode;

/// Event notification and dispatch service.
pub struct EventService {
    cfg: Config,
    bus: Bus,
    registry: Arc<RwLock<Registry>>,
    handle: EventHandle,
    token: CancellationToken,
    worker: Mutex<Option<JoinHandle<usize>>>,
}

impl EventService {
    /// Returns a builder; see [`EventServiceBuilder::build`].
    pub fn builder(cfg: Config) -> EventServiceBuilder {
        EventServiceBuilder::new(cfg)
    }

    pub(crate) fn new_internal(
        cfg: Config,
        bus: Bus,
        registry: Arc<RwLock<Registry>>,
        handle: EventHandle,
        token: CancellationToken,
        worker: JoinHandle<usize>,
    ) -> Self {
        Self {
            cfg,
            bus,
            registry,
            handle,
            token,
            worker: Mutex::new(Some(worker)),
        }
    }

    // ---------------------------
    // Registry
    // ---------------------------

    /// Registers a handler.
    ///
    /// Fails with [`EventError::DuplicateName`] if the name is taken and with
    /// [`EventError::ShutdownInProgress`] once shutdown has begun.
    pub async fn register_handler(&self, spec: HandlerSpec) -> Result<HandlerId, EventError> {
        self.ensure_open()?;
        let entry = self.registry.write().await.register(spec)?;

        tracing::debug!(
            handler = %entry.name(),
            id = %entry.id(),
            codes = ?entry.codes(),
            placement = ?entry.placement(),
            locator = entry.locator().unwrap_or("-"),
            "handler registered"
        );
        self.bus.publish(
            MonitorEvent::new(MonitorKind::HandlerRegistered).with_handler(Arc::clone(entry.name())),
        );
        Ok(entry.id())
    }

    /// Removes a registration by handle.
    ///
    /// If a chain currently holds the handler, it is unlinked now (later events
    /// never reach it) and its record is dropped when that chain finishes.
    pub async fn deregister_handler(&self, id: HandlerId) -> Result<(), EventError> {
        let mut registry = self.registry.write().await;
        let name = registry.get(id).map(|e| Arc::clone(e.name()));
        let removal = registry.deregister(id)?;
        drop(registry);

        self.after_removal(name.unwrap_or_else(|| id.to_string().into()), removal);
        Ok(())
    }

    /// Removes a registration by name; see [`EventService::deregister_handler`].
    pub async fn deregister_by_name(&self, name: &str) -> Result<(), EventError> {
        let (_, removal) = self.registry.write().await.deregister_by_name(name)?;
        self.after_removal(name.into(), removal);
        Ok(())
    }

    /// True if at least one live handler subscribes to `code`.
    pub async fn is_active(&self, code: StatusCode) -> bool {
        self.registry.read().await.active().is_active(code)
    }

    /// Number of live handlers subscribed to `code` (default handlers excluded).
    pub async fn active_count(&self, code: StatusCode) -> usize {
        self.registry.read().await.active().count(code)
    }

    /// Sorted names of live registrations.
    pub async fn handler_names(&self) -> Vec<String> {
        self.registry.read().await.names()
    }

    // ---------------------------
    // Reporting
    // ---------------------------

    /// Queues a report, waiting for queue space.
    pub async fn report_event(&self, report: Report) -> Result<(), EventError> {
        self.handle.report(report).await
    }

    /// Queues a report without waiting; fails with [`EventError::QueueFull`].
    pub fn try_report_event(&self, report: Report) -> Result<(), EventError> {
        self.handle.try_report(report)
    }

    /// Queues a report and returns a receiver for its final [`Delivery`].
    ///
    /// The receiver resolves once the (possibly coalesced) chain completes.
    pub async fn report_with_receipt(
        &self,
        mut report: Report,
    ) -> Result<oneshot::Receiver<Delivery>, EventError> {
        let (tx, rx) = oneshot::channel();
        report.push_completion(Box::new(move |d: &Delivery| {
            let _ = tx.send(d.clone());
        }));
        self.report_event(report).await?;
        Ok(rx)
    }

    /// Changes the coalescing window for subsequent reports and merges.
    ///
    /// Windows longer than 365 days are clamped to 365 days.
    pub async fn set_coalescing_window(&self, window: Duration) -> Result<(), EventError> {
        self.handle.send(Command::SetWindow(window)).await
    }

    /// Dispatches the pending entry for `code` now.
    ///
    /// Returns false if nothing was pending. Resolves after the chain finished;
    /// do not await it from inside a handler.
    pub async fn flush(&self, code: StatusCode) -> Result<bool, EventError> {
        let (reply, rx) = oneshot::channel();
        self.handle.send(Command::Flush { code, reply }).await?;
        rx.await.map_err(|_| EventError::ShutdownInProgress)
    }

    /// Dispatches every pending entry now and returns how many chains ran.
    ///
    /// Resolves after those chains finished; do not await it from inside a handler.
    pub async fn force_flush_all(&self) -> Result<usize, EventError> {
        let (reply, rx) = oneshot::channel();
        self.handle.send(Command::FlushAll { reply }).await?;
        rx.await.map_err(|_| EventError::ShutdownInProgress)
    }

    // ---------------------------
    // Lifecycle
    // ---------------------------

    /// Stops accepting work, dispatches everything pending and tears the
    /// registry down.
    ///
    /// Fails with [`EventError::ShutdownInProgress`] if already called, with
    /// [`EventError::EventLoopFailed`] if the event loop did not drain cleanly,
    /// and with [`EventError::HandlersInUse`] if teardown finds a handler still
    /// held by a chain. Must not be awaited from inside a handler.
    pub async fn shutdown(&self) -> Result<(), EventError> {
        let worker = self
            .worker
            .lock()
            .await
            .take()
            .ok_or(EventError::ShutdownInProgress)?;
        tracing::info!("shutdown requested");
        self.bus
            .publish(MonitorEvent::new(MonitorKind::ShutdownRequested));
        self.token.cancel();

        let drained = worker.await.map_err(|e| {
            tracing::error!(error = %e, "event loop terminated abnormally");
            EventError::EventLoopFailed {
                reason: e.to_string(),
            }
        });
        let flushed = drained.as_ref().map_or(0, |n| *n);
        let teardown = self.registry.write().await.teardown();

        let mut ev = MonitorEvent::new(MonitorKind::ShutdownComplete).with_count(flushed);
        let res = drained.and(teardown);
        match &res {
            Ok(removed) => tracing::info!(flushed, removed, "shutdown complete"),
            Err(e) => {
                tracing::error!(flushed, error = %e, "shutdown incomplete");
                ev = ev.with_reason(e.as_message());
            }
        }
        self.bus.publish(ev);
        res.map(|_| ())
    }

    /// True once shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns a cloneable reporting handle.
    pub fn handle(&self) -> EventHandle {
        self.handle.clone()
    }

    /// Subscribes to monitor events.
    pub fn subscribe(&self) -> broadcast::Receiver<MonitorEvent> {
        self.bus.subscribe()
    }

    /// Configuration the service was built with.
    pub fn config(&self) -> &Config {
        &self.cfg
    }

    fn ensure_open(&self) -> Result<(), EventError> {
        if self.token.is_cancelled() {
            Err(EventError::ShutdownInProgress)
        } else {
            Ok(())
        }
    }

    fn after_removal(&self, name: Arc<str>, removal: Removal) {
        let kind = match removal {
            Removal::Removed => {
                tracing::debug!(handler = %name, "handler deregistered");
                MonitorKind::HandlerDeregistered
            }
            Removal::Deferred => {
                tracing::debug!(handler = %name, "handler in use, removal deferred");
                MonitorKind::RemovalDeferred
            }
        };
        self.bus.publish(MonitorEvent::new(kind).with_handler(name));
    }
}

impl Drop for EventService {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tokio::time::{self, Instant};

    use super::*;
    use crate::core::chain::Outcome;
    use crate::handlers::{Flow, HandlerFn, Notification};
    use crate::policies::DefaultDelivery;
    use crate::types::{Info, ProcId, keys};

    const W: Duration = Duration::from_millis(100);

    type Seen = Arc<Mutex<Vec<(String, Vec<String>, Instant)>>>;

    fn service(window: Duration) -> Arc<EventService> {
        let cfg = Config {
            coalescing_window: window,
            ..Config::default()
        };
        EventService::builder(cfg).build().unwrap()
    }

    /// Handler that records its name, the payload sources and the time it ran.
    fn recorder(seen: &Seen, name: &'static str) -> HandlerSpec {
        let seen = Arc::clone(seen);
        HandlerSpec::new(
            name,
            HandlerFn::arc(move |n: &mut Notification| {
                let sources = n.payload().sources().map(|s| s.to_string()).collect();
                seen.lock().unwrap().push((name.to_string(), sources, Instant::now()));
                Ok(Flow::Continue)
            }),
        )
    }

    fn names(seen: &Seen) -> Vec<String> {
        seen.lock().unwrap().iter().map(|(n, _, _)| n.clone()).collect()
    }

    fn proc(rank: u32) -> ProcId {
        ProcId::new("job", rank)
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_coalesces_into_one_chain() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "h").with_code(StatusCode(7)))
            .await
            .unwrap();

        let receipt = svc
            .report_with_receipt(Report::new(7, proc(0)))
            .await
            .unwrap();
        for rank in 1..5 {
            time::sleep(Duration::from_millis(30)).await;
            svc.report_event(Report::new(7, proc(rank))).await.unwrap();
        }
        let delivery = receipt.await.unwrap();

        assert_eq!(names(&seen), ["h"]);
        assert_eq!(delivery.source, proc(0));
        let sources: Vec<String> = delivery.payload.sources().map(|s| s.to_string()).collect();
        assert_eq!(sources, ["job:4", "job:3", "job:2", "job:1", "job:0"]);

        let flat = delivery.payload.flatten();
        let n = flat.len();
        assert_eq!(n, 5 + 2);
        assert_eq!(&*flat[n - 2].key, keys::HANDLER_NAME);
        assert_eq!(&*flat[n - 1].key, keys::RETURN_OBJECT);
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_extends_deadline() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "h").with_code(StatusCode(7)))
            .await
            .unwrap();

        let t0 = Instant::now();
        let receipt = svc
            .report_with_receipt(Report::new(7, proc(0)))
            .await
            .unwrap();
        time::sleep(Duration::from_millis(80)).await;
        svc.report_event(Report::new(7, proc(1))).await.unwrap();
        receipt.await.unwrap();

        let ran_at = seen.lock().unwrap()[0].2;
        assert_eq!(ran_at - t0, Duration::from_millis(180));
    }

    #[tokio::test(start_paused = true)]
    async fn test_report_after_flush_starts_fresh_burst() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "h").with_code(StatusCode(7)))
            .await
            .unwrap();

        svc.report_event(Report::new(7, proc(0))).await.unwrap();
        time::sleep(W * 2).await;
        svc.report_event(Report::new(7, proc(1))).await.unwrap();
        time::sleep(W * 2).await;

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].1, ["job:0"]);
        assert_eq!(seen[1].1, ["job:1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_flush_all_dispatches_every_pending_entry() {
        let svc = service(Duration::from_secs(60));
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "dflt")).await.unwrap();

        let t0 = Instant::now();
        for code in [1, 2, 3] {
            svc.report_event(Report::new(code, proc(0))).await.unwrap();
        }
        svc.report_event(Report::new(2, proc(1))).await.unwrap();

        assert_eq!(svc.force_flush_all().await.unwrap(), 3);
        assert_eq!(names(&seen).len(), 3);
        assert_eq!(Instant::now(), t0);
        assert_eq!(svc.force_flush_all().await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_single_code() {
        let svc = service(Duration::from_secs(60));
        svc.report_event(Report::new(7, proc(0))).await.unwrap();
        svc.report_event(Report::new(8, proc(0))).await.unwrap();

        assert!(svc.flush(StatusCode(7)).await.unwrap());
        assert!(!svc.flush(StatusCode(7)).await.unwrap());
        assert_eq!(svc.force_flush_all().await.unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_then_default_scenario() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "H1").with_code(StatusCode(7)))
            .await
            .unwrap();

        let d = svc
            .report_with_receipt(Report::new(7, proc(1)))
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(d.visited, [Arc::<str>::from("H1")]);
        assert!(d.payload.sources().any(|s| *s == proc(1)));

        svc.register_handler(recorder(&seen, "H2")).await.unwrap();
        let d = svc
            .report_with_receipt(Report::new(9, proc(1)))
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(d.visited, [Arc::<str>::from("H2")]);
        assert!(d.error().is_none());

        // Code 7 is claimed by H1, so the default stays quiet.
        let d = svc
            .report_with_receipt(Report::new(7, proc(1)))
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(d.visited, [Arc::<str>::from("H1")]);
        assert_eq!(names(&seen), ["H1", "H2", "H1"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_defaults_always_per_report() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "dflt")).await.unwrap();
        svc.register_handler(recorder(&seen, "s").with_code(StatusCode(7)))
            .await
            .unwrap();

        let report = Report::new(7, proc(0)).with_defaults(DefaultDelivery::Always);
        svc.report_with_receipt(report).await.unwrap().await.unwrap();
        assert_eq!(names(&seen), ["s", "dflt"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhandled_event_reports_no_matching_handler() {
        let svc = service(W);
        let d = svc
            .report_with_receipt(Report::new(9, proc(0)))
            .await
            .unwrap()
            .await
            .unwrap();

        assert_eq!(d.outcome, Outcome::Unhandled);
        assert_eq!(d.error(), Some(EventError::NoMatchingHandler { code: StatusCode(9) }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_report_starts_new_chain() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        let handle = svc.handle();
        svc.register_handler(
            HandlerSpec::new(
                "escalate",
                HandlerFn::arc(move |n: &mut Notification| {
                    let follow_up = Report::new(8, n.source().clone())
                        .with_info(Info::new("cause", i64::from(n.code().get())));
                    handle
                        .try_report(follow_up)
                        .map_err(|e| crate::error::HandlerError::fail(e.as_message()))?;
                    Ok(Flow::Continue)
                }),
            )
            .with_code(StatusCode(7)),
        )
        .await
        .unwrap();
        svc.register_handler(recorder(&seen, "h8").with_code(StatusCode(8)))
            .await
            .unwrap();

        let d = svc
            .report_with_receipt(Report::new(7, proc(3)))
            .await
            .unwrap()
            .await
            .unwrap();
        assert!(d.failed.is_empty());
        assert!(names(&seen).is_empty());

        time::sleep(W * 2).await;
        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].1, ["job:3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_change_applies_to_next_report() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "h").with_code(StatusCode(7)))
            .await
            .unwrap();
        svc.set_coalescing_window(Duration::from_millis(10))
            .await
            .unwrap();

        let t0 = Instant::now();
        svc.report_with_receipt(Report::new(7, proc(0)))
            .await
            .unwrap()
            .await
            .unwrap();
        assert_eq!(Instant::now() - t0, Duration::from_millis(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_try_report_fails_when_queue_full() {
        let cfg = Config {
            queue_capacity: 1,
            ..Config::default()
        };
        let svc = EventService::builder(cfg).build().unwrap();

        svc.try_report_event(Report::new(7, proc(0))).unwrap();
        assert_eq!(
            svc.try_report_event(Report::new(7, proc(1))),
            Err(EventError::QueueFull)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_operations() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        let a = svc
            .register_handler(recorder(&seen, "a").with_codes([StatusCode(7), StatusCode(8)]))
            .await
            .unwrap();
        svc.register_handler(recorder(&seen, "b").with_code(StatusCode(7)))
            .await
            .unwrap();

        assert_eq!(
            svc.register_handler(recorder(&seen, "a")).await,
            Err(EventError::DuplicateName { name: "a".into() })
        );
        assert_eq!(svc.active_count(StatusCode(7)).await, 2);
        assert_eq!(svc.handler_names().await, ["a", "b"]);

        svc.deregister_handler(a).await.unwrap();
        assert!(!svc.is_active(StatusCode(8)).await);
        assert!(matches!(
            svc.deregister_handler(a).await,
            Err(EventError::NotFound { .. })
        ));

        svc.deregister_by_name("b").await.unwrap();
        assert_eq!(svc.active_count(StatusCode(7)).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_flushes_pending_and_rejects_new_work() {
        let svc = service(Duration::from_secs(60));
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "h").with_code(StatusCode(7)))
            .await
            .unwrap();

        let t0 = Instant::now();
        let receipt = svc
            .report_with_receipt(Report::new(7, proc(0)))
            .await
            .unwrap();
        svc.report_event(Report::new(7, proc(1))).await.unwrap();

        svc.shutdown().await.unwrap();
        let d = receipt.await.unwrap();
        assert_eq!(d.payload.source_count(), 2);
        assert_eq!(Instant::now(), t0);

        assert!(svc.is_shutting_down());
        assert_eq!(
            svc.report_event(Report::new(7, proc(2))).await,
            Err(EventError::ShutdownInProgress)
        );
        assert_eq!(
            svc.register_handler(recorder(&seen, "late")).await,
            Err(EventError::ShutdownInProgress)
        );
        assert_eq!(svc.shutdown().await, Err(EventError::ShutdownInProgress));
        assert!(svc.handler_names().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_shutdowns_succeed_once() {
        let svc = service(W);
        let (a, b) = tokio::join!(svc.shutdown(), svc.shutdown());

        let mut results = [a, b];
        results.sort_by_key(|r| r.is_err());
        assert_eq!(results, [Ok(()), Err(EventError::ShutdownInProgress)]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_reports_crashed_event_loop() {
        let token = CancellationToken::new();
        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let worker = tokio::spawn(async { Option::<usize>::None.expect("event loop crashed") });
        let svc = EventService::new_internal(
            Config::default(),
            Bus::new(8),
            Arc::new(RwLock::new(Registry::new())),
            EventHandle::new(tx, token.clone()),
            token,
            worker,
        );
        let mut rx = svc.subscribe();

        let err = svc.shutdown().await.unwrap_err();
        assert_eq!(err.as_label(), "event_loop_failed");

        let last = std::iter::from_fn(|| rx.try_recv().ok()).last().unwrap();
        assert_eq!(last.kind, MonitorKind::ShutdownComplete);
        assert!(last.reason.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_oversized_window_still_delivers() {
        let svc = service(W);
        let seen: Seen = Arc::default();
        svc.register_handler(recorder(&seen, "h").with_code(StatusCode(7)))
            .await
            .unwrap();

        let three_years = Duration::from_secs(3 * 365 * 24 * 60 * 60);
        svc.set_coalescing_window(three_years).await.unwrap();
        let receipt = svc
            .report_with_receipt(Report::new(7, proc(0)))
            .await
            .unwrap();

        assert_eq!(svc.force_flush_all().await, Ok(1));
        assert!(receipt.await.unwrap().is_handled());
        assert_eq!(names(&seen), ["h"]);
        svc.shutdown().await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_monitor_sequence() {
        let svc = service(W);
        let mut rx = svc.subscribe();
        svc.register_handler(recorder(&Seen::default(), "h").with_code(StatusCode(7)))
            .await
            .unwrap();
        svc.report_with_receipt(Report::new(7, proc(0)))
            .await
            .unwrap()
            .await
            .unwrap();

        let mut kinds = Vec::new();
        while let Ok(ev) = rx.try_recv() {
            kinds.push(ev.kind);
        }
        assert_eq!(
            kinds,
            [
                MonitorKind::HandlerRegistered,
                MonitorKind::EventCached,
                MonitorKind::ChainStarted,
                MonitorKind::ChainCompleted,
            ]
        );
    }
}
