//! # Dispatch chain: one walk through the matching handlers of one event.
//!
//! An [`EventChain`] is created from a flushed cache entry. It asks the
//! registry for the ordered plan, pins every planned entry (in-use counter),
//! then invokes the handlers one at a time with a shared [`Notification`].
//!
//! ```text
//! begin(pending) ─► plan = registry.lookup_matching(code, source, defaults)
//!                   acquire(plan)
//! advance() ──────► prepare slots ─► handler.on_event(&mut notification)
//!                     ├─ Ok(Continue)  → next handler
//!                     ├─ Ok(EndChain)  → stop
//!                     └─ Err / timeout / panic → record, log, next handler
//! finish() ───────► Delivery ─► every completion exactly once
//!                   release(plan) → deferred removals complete
//! ```
//!
//! ## Rules
//! - A handler is invoked at most once per chain.
//! - A failing handler never stops the chain; only `Flow::EndChain` does.
//! - An empty plan completes right away with [`Outcome::Unhandled`].
//! - Completions run exactly once, in report order, even if one of them panics.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::RwLock;
use tokio::time;

use crate::core::cache::PendingEvent;
use crate::error::{EventError, HandlerError};
use crate::handlers::{Flow, Notification};
use crate::monitor::{Bus, MonitorEvent, MonitorKind};
use crate::policies::DefaultDelivery;
use crate::registry::{HandlerEntry, Registry};
use crate::types::{Info, Payload, ProcId, Range, StatusCode};

/// Completion called once with the final [`Delivery`] of a chain.
pub type Completion = Box<dyn FnOnce(&Delivery) + Send + 'static>;

/// How a chain ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Every planned handler was visited.
    Completed,
    /// A handler returned [`Flow::EndChain`].
    Ended { by: Arc<str> },
    /// Nothing matched, not even a default handler.
    Unhandled,
}

/// Final state of a chain, handed to every completion.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub code: StatusCode,
    /// First reporter of the (possibly coalesced) event.
    pub source: ProcId,
    pub range: Range,
    /// Payload as the last invoked handler saw it.
    pub payload: Payload,
    /// Results appended by handlers, in order.
    pub results: Vec<Info>,
    /// Names of the invoked handlers, in order.
    pub visited: Vec<Arc<str>>,
    /// Handlers that failed, with their error.
    pub failed: Vec<(Arc<str>, HandlerError)>,
    pub outcome: Outcome,
}

impl Delivery {
    /// Status to report back: `NoMatchingHandler` when nothing handled the event.
    pub fn error(&self) -> Option<EventError> {
        match self.outcome {
            Outcome::Unhandled => Some(EventError::NoMatchingHandler { code: self.code }),
            _ => None,
        }
    }

    /// Handler failures of this chain as [`EventError::HandlerFailed`], in order.
    pub fn failures(&self) -> Vec<EventError> {
        self.failed
            .iter()
            .map(|(name, err)| err.clone().into_event_error(Arc::clone(name)))
            .collect()
    }

    /// True if at least one handler was invoked.
    pub fn is_handled(&self) -> bool {
        !matches!(self.outcome, Outcome::Unhandled)
    }
}

/// Shared context the event loop dispatches with.
#[derive(Clone)]
pub(crate) struct Dispatcher {
    pub(crate) registry: Arc<RwLock<Registry>>,
    pub(crate) bus: Bus,
    pub(crate) handler_timeout: Option<Duration>,
    pub(crate) default_delivery: DefaultDelivery,
}

impl Dispatcher {
    /// Runs one pending event through its chain to completion.
    pub(crate) async fn dispatch(&self, pending: PendingEvent) -> Outcome {
        let mut chain = {
            let registry = self.registry.read().await;
            EventChain::begin(pending, &registry, self.default_delivery)
        };
        while chain.advance(self.handler_timeout, &self.bus).await {}

        let (delivery, plan) = chain.finish(&self.bus);
        let finished = self.registry.write().await.release(&plan);
        for name in finished {
            tracing::debug!(handler = %name, "deferred removal complete");
            self.bus
                .publish(MonitorEvent::new(MonitorKind::HandlerDeregistered).with_handler(name));
        }
        delivery.outcome
    }
}

/// In-flight delivery of one event.
pub(crate) struct EventChain {
    notification: Notification,
    plan: Vec<Arc<HandlerEntry>>,
    cursor: usize,
    ended_by: Option<Arc<str>>,
    visited: Vec<Arc<str>>,
    failed: Vec<(Arc<str>, HandlerError)>,
    completions: Vec<Completion>,
}

impl EventChain {
    /// Computes the plan and pins its entries.
    pub(crate) fn begin(
        pending: PendingEvent,
        registry: &Registry,
        fallback: DefaultDelivery,
    ) -> Self {
        let defaults = pending.defaults.unwrap_or(fallback);
        let plan = registry.lookup_matching(pending.code, &pending.source, defaults);
        registry.acquire(&plan);

        Self {
            notification: Notification::new(
                pending.code,
                pending.source,
                pending.range,
                pending.payload,
            ),
            plan,
            cursor: 0,
            ended_by: None,
            visited: Vec::new(),
            failed: Vec::new(),
            completions: pending.completions,
        }
    }

    pub(crate) fn plan_len(&self) -> usize {
        self.plan.len()
    }

    /// Invokes the next handler; returns false once the chain is done.
    pub(crate) async fn advance(&mut self, timeout: Option<Duration>, bus: &Bus) -> bool {
        if self.ended_by.is_some() {
            return false;
        }
        let Some(entry) = self.plan.get(self.cursor).cloned() else {
            return false;
        };
        self.cursor += 1;
        if self.cursor == 1 {
            bus.publish(
                MonitorEvent::new(MonitorKind::ChainStarted)
                    .with_code(self.notification.code())
                    .with_source(self.notification.source().clone())
                    .with_count(self.plan.len()),
            );
        }

        self.notification.prepare(&entry);
        self.visited.push(Arc::clone(entry.name()));

        match invoke(&entry, &mut self.notification, timeout).await {
            Ok(Flow::Continue) => {}
            Ok(Flow::EndChain) => {
                tracing::debug!(code = %self.notification.code(), handler = %entry.name(), "chain ended by handler");
                bus.publish(
                    MonitorEvent::new(MonitorKind::ChainEnded)
                        .with_code(self.notification.code())
                        .with_handler(Arc::clone(entry.name())),
                );
                self.ended_by = Some(Arc::clone(entry.name()));
                return false;
            }
            Err(err) => {
                tracing::warn!(
                    code = %self.notification.code(),
                    handler = %entry.name(),
                    locator = entry.locator().unwrap_or("-"),
                    error = %err,
                    "handler failed"
                );
                bus.publish(
                    MonitorEvent::new(MonitorKind::HandlerFailed)
                        .with_code(self.notification.code())
                        .with_handler(Arc::clone(entry.name()))
                        .with_reason(err.as_message()),
                );
                self.failed.push((Arc::clone(entry.name()), err));
            }
        }
        self.cursor < self.plan.len()
    }

    /// Builds the delivery and runs every completion once.
    ///
    /// Returns the plan so the caller can release it under the registry lock.
    pub(crate) fn finish(self, bus: &Bus) -> (Delivery, Vec<Arc<HandlerEntry>>) {
        let code = self.notification.code();
        let source = self.notification.source().clone();
        let range = self.notification.range().clone();
        let (payload, results) = self.notification.into_parts();

        let outcome = if self.plan.is_empty() {
            tracing::warn!(code = %code, source = %source, "no handler matched event");
            bus.publish(
                MonitorEvent::new(MonitorKind::NoMatchingHandler)
                    .with_code(code)
                    .with_source(source.clone()),
            );
            Outcome::Unhandled
        } else {
            match self.ended_by {
                Some(by) => Outcome::Ended { by },
                None => Outcome::Completed,
            }
        };

        let delivery = Delivery {
            code,
            source,
            range,
            payload,
            results,
            visited: self.visited,
            failed: self.failed,
            outcome,
        };

        for completion in self.completions {
            if std::panic::catch_unwind(AssertUnwindSafe(|| completion(&delivery))).is_err() {
                tracing::error!(code = %code, "completion panicked");
            }
        }
        bus.publish(
            MonitorEvent::new(MonitorKind::ChainCompleted)
                .with_code(code)
                .with_count(delivery.visited.len()),
        );

        (delivery, self.plan)
    }
}

/// Calls one handler with timeout and panic isolation.
async fn invoke(
    entry: &HandlerEntry,
    notification: &mut Notification,
    timeout: Option<Duration>,
) -> Result<Flow, HandlerError> {
    let fut = AssertUnwindSafe(entry.handler().on_event(notification)).catch_unwind();

    let res = match timeout {
        Some(dur) => match time::timeout(dur, fut).await {
            Ok(r) => r,
            Err(_elapsed) => return Err(HandlerError::Timeout { timeout: dur }),
        },
        None => fut.await,
    };

    res.unwrap_or_else(|panic| {
        let info = if let Some(msg) = panic.downcast_ref::<&'static str>() {
            (*msg).to_string()
        } else if let Some(msg) = panic.downcast_ref::<String>() {
            msg.clone()
        } else {
            "unknown panic".to_string()
        };
        Err(HandlerError::Panicked { info })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::cache::{EventCache, Report};
    use crate::handlers::{HandlerFn, HandlerSpec};
    use crate::types::keys;

    type Calls = Arc<Mutex<Vec<String>>>;

    fn recorder(calls: &Calls, name: &'static str, flow: Flow) -> HandlerSpec {
        let calls = Arc::clone(calls);
        HandlerSpec::new(
            name,
            HandlerFn::arc(move |n: &mut Notification| {
                calls.lock().unwrap().push(name.to_string());
                n.push_result(Info::new("seen-by", name));
                Ok(flow)
            }),
        )
    }

    fn dispatcher(registry: Registry) -> Dispatcher {
        Dispatcher {
            registry: Arc::new(RwLock::new(registry)),
            bus: Bus::new(64),
            handler_timeout: Some(Duration::from_millis(50)),
            default_delivery: DefaultDelivery::WhenUnclaimed,
        }
    }

    fn pending(report: Report) -> PendingEvent {
        let mut cache = EventCache::new(Duration::from_secs(1), None);
        let code = report.code();
        cache.report(report);
        cache.flush(code).unwrap()
    }

    fn capture(report: Report) -> (Report, Arc<Mutex<Vec<Delivery>>>) {
        let out = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&out);
        let report = report.on_complete(move |d| sink.lock().unwrap().push(d.clone()));
        (report, out)
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_chain_stops_walk_and_completes_once() {
        let calls: Calls = Arc::default();
        let mut reg = Registry::new();
        reg.register(recorder(&calls, "a", Flow::Continue).with_code(StatusCode(7)))
            .unwrap();
        reg.register(recorder(&calls, "b", Flow::EndChain).with_codes([StatusCode(7), StatusCode(8)]))
            .unwrap();
        reg.register(
            recorder(&calls, "c", Flow::Continue).with_placement(crate::Placement::Last),
        )
        .unwrap();

        let (report, out) = capture(Report::new(7, ProcId::new("job", 0)));
        let outcome = dispatcher(reg).dispatch(pending(report)).await;

        assert_eq!(outcome, Outcome::Ended { by: "b".into() });
        assert_eq!(*calls.lock().unwrap(), ["a", "b"]);
        let out = out.lock().unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].results.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_are_absorbed() {
        let calls: Calls = Arc::default();
        let mut reg = Registry::new();
        reg.register(
            HandlerSpec::new(
                "broken",
                HandlerFn::arc(|_n: &mut Notification| Err(HandlerError::fail("boom"))),
            )
            .with_code(StatusCode(7))
            .with_placement(crate::Placement::Precedence(1)),
        )
        .unwrap();
        reg.register(
            HandlerSpec::new(
                "panics",
                HandlerFn::arc(|_n: &mut Notification| -> Result<Flow, HandlerError> {
                    panic!("bad handler")
                }),
            )
            .with_code(StatusCode(7))
            .with_placement(crate::Placement::Precedence(2)),
        )
        .unwrap();
        reg.register(recorder(&calls, "ok", Flow::Continue).with_code(StatusCode(7)))
            .unwrap();

        let (report, out) = capture(Report::new(7, ProcId::new("job", 0)));
        let outcome = dispatcher(reg).dispatch(pending(report)).await;

        assert_eq!(outcome, Outcome::Completed);
        assert_eq!(*calls.lock().unwrap(), ["ok"]);
        let out = out.lock().unwrap();
        let failed: Vec<_> = out[0].failed.iter().map(|(n, e)| (n.to_string(), e.as_label())).collect();
        assert_eq!(
            failed,
            [
                ("broken".to_string(), "handler_fail"),
                ("panics".to_string(), "handler_panicked")
            ]
        );
        assert!(out[0].error().is_none());
        assert_eq!(
            out[0].failures()[0],
            EventError::HandlerFailed {
                handler: "broken".into(),
                reason: "error: boom".into(),
            }
        );
        assert_eq!(out[0].failures()[1].as_label(), "handler_failed");
    }

    struct Slow;

    #[async_trait::async_trait]
    impl crate::handlers::Handler for Slow {
        async fn on_event(&self, _n: &mut Notification) -> Result<Flow, HandlerError> {
            time::sleep(Duration::from_secs(5)).await;
            Ok(Flow::EndChain)
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_counts_as_failure() {
        let calls: Calls = Arc::default();
        let mut reg = Registry::new();
        reg.register(
            HandlerSpec::new("slow", Arc::new(Slow))
                .with_code(StatusCode(7))
                .with_placement(crate::Placement::First),
        )
        .unwrap();
        reg.register(recorder(&calls, "next", Flow::Continue).with_code(StatusCode(7)))
            .unwrap();

        let (report, out) = capture(Report::new(7, ProcId::new("job", 0)));
        dispatcher(reg).dispatch(pending(report)).await;

        assert_eq!(*calls.lock().unwrap(), ["next"]);
        let out = out.lock().unwrap();
        assert_eq!(
            out[0].failed[0].1,
            HandlerError::Timeout {
                timeout: Duration::from_millis(50)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_unhandled_completes_with_no_matching_handler() {
        let (report, out) = capture(Report::new(9, ProcId::new("job", 0)));
        let outcome = dispatcher(Registry::new()).dispatch(pending(report)).await;

        assert_eq!(outcome, Outcome::Unhandled);
        let out = out.lock().unwrap();
        assert_eq!(
            out[0].error(),
            Some(EventError::NoMatchingHandler { code: StatusCode(9) })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_handler_sees_its_own_slots() {
        let seen: Arc<Mutex<Vec<(String, Option<u32>)>>> = Arc::default();
        let mut reg = Registry::new();
        for (name, obj) in [("h1", 1u32), ("h2", 2u32)] {
            let seen = Arc::clone(&seen);
            reg.register(
                HandlerSpec::new(
                    name,
                    HandlerFn::arc(move |n: &mut Notification| {
                        let p = n.payload();
                        seen.lock().unwrap().push((
                            p.handler_name().unwrap_or_default().to_string(),
                            p.return_object_as::<u32>().copied(),
                        ));
                        Ok(Flow::Continue)
                    }),
                )
                .with_code(StatusCode(7))
                .with_return_object(Arc::new(obj)),
            )
            .unwrap();
        }

        let (report, out) = capture(Report::new(7, ProcId::new("job", 0)));
        dispatcher(reg).dispatch(pending(report)).await;

        assert_eq!(
            *seen.lock().unwrap(),
            [("h1".to_string(), Some(1)), ("h2".to_string(), Some(2))]
        );
        let out = out.lock().unwrap();
        let flat = out[0].payload.flatten();
        assert_eq!(&*flat[flat.len() - 2].key, keys::HANDLER_NAME);
        assert_eq!(flat[flat.len() - 2].value.as_str(), Some("h2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_panic_does_not_skip_others() {
        let (report, out) = capture(
            Report::new(9, ProcId::new("job", 0)).on_complete(|_| panic!("bad completion")),
        );
        let report = report.on_complete({
            let out = Arc::clone(&out);
            move |d| out.lock().unwrap().push(d.clone())
        });
        dispatcher(Registry::new()).dispatch(pending(report)).await;

        assert_eq!(out.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deregistered_mid_chain_is_released_after() {
        let mut reg = Registry::new();
        let id = reg
            .register(HandlerSpec::new(
                "victim",
                HandlerFn::arc(|_n: &mut Notification| Ok(Flow::Continue)),
            )
            .with_code(StatusCode(7)))
            .unwrap()
            .id();
        let d = dispatcher(reg);

        let mut chain = {
            let r = d.registry.read().await;
            EventChain::begin(
                pending(Report::new(7, ProcId::new("job", 0))),
                &r,
                DefaultDelivery::WhenUnclaimed,
            )
        };
        assert_eq!(chain.plan_len(), 1);
        assert_eq!(
            d.registry.write().await.deregister(id).unwrap(),
            crate::Removal::Deferred
        );

        // The in-flight chain still calls the unlinked handler.
        while chain.advance(None, &d.bus).await {}
        let (delivery, plan) = chain.finish(&d.bus);
        assert_eq!(delivery.visited.len(), 1);

        let finished = d.registry.write().await.release(&plan);
        assert_eq!(finished.len(), 1);
    }
}
