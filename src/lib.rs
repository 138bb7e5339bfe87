//! # eventvisor
//!
//! **Eventvisor** routes status events raised inside a process-management
//! runtime to the handlers that registered interest in them.
//!
//! Components report an event as a status code plus the reporting process.
//! Handlers subscribe to one code, several codes or none (fallback), may be
//! scoped to a set of processes and ordered by precedence. Repeated reports of
//! the same code arriving close together are coalesced into one delivery that
//! lists every reporting process.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   report_event(code, source, info)          register_handler(spec)
//!                 │                                    │
//!                 ▼                                    ▼
//!         ┌───────────────┐                 ┌─────────────────────┐
//!         │ command queue │                 │      Registry       │
//!         └───────┬───────┘                 │ first / single /    │
//!                 ▼                         │ multi / default /   │
//! ┌──────────────────────────────────┐      │ last + ActiveCodes  │
//! │ EventLoop (one task)             │      └──────────▲──────────┘
//! │  EventCache: one entry per code  │                 │ lookup_matching
//! │   merge → prepend source,        │                 │ acquire / release
//! │           reset timer to now + W │                 │
//! │  timer fires / flush ────────────┼──► EventChain ──┘
//! └──────────────────────────────────┘        │
//!                                             ├─► handler 1 ─► handler 2 ─► … (EndChain stops)
//!                                             └─► completions (exactly once) ─► Delivery
//!
//! every step ──► Bus (MonitorEvent) ──► subscribe()
//! ```
//!
//! ### Dispatch order
//! ```text
//! pinned first ─► single-code ─► multi-code ─► default* ─► pinned last
//!                  (precedence, registration order inside each category)
//! * only when nothing code-specific matched, unless the report asks for Always
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types                                   |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Service**       | Register handlers, report events, flush, shut down.          | [`EventService`], [`EventHandle`], [`Report`] |
//! | **Handlers**      | Async trait or plain closure, registration bundle.           | [`Handler`], [`HandlerFn`], [`HandlerSpec`] |
//! | **Ordering**      | Pinning, precedence and default-handler policy.              | [`Placement`], [`DefaultDelivery`]          |
//! | **Results**       | Final state of a chain, handed to every completion.          | [`Delivery`], [`Outcome`]                   |
//! | **Scope**         | Process identities and ranges.                               | [`ProcId`], [`Range`]                       |
//! | **Monitoring**    | Broadcast of everything the service does.                    | [`MonitorEvent`], [`MonitorKind`]           |
//! | **Errors**        | Typed errors for registry, reporting and handlers.           | [`EventError`], [`HandlerError`]            |
//! | **Configuration** | Window, bounds, timeouts, capacities.                        | [`Config`]                                  |
//!
//! ## Optional features
//! - `logging`: exports [`LogHandler`], a default-category handler that logs
//!   unclaimed events through `tracing`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use eventvisor::{
//!     Config, EventService, Flow, HandlerFn, HandlerSpec, Notification, Placement, ProcId,
//!     Report, StatusCode,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), eventvisor::EventError> {
//!     let mut cfg = Config::default();
//!     cfg.coalescing_window = Duration::from_millis(20);
//!
//!     let svc = EventService::builder(cfg)
//!         .with_handler(
//!             HandlerSpec::new("audit", HandlerFn::arc(|n: &mut Notification| {
//!                 println!("audit: {} from {}", n.code(), n.source());
//!                 Ok(Flow::Continue)
//!             }))
//!             .with_placement(Placement::First),
//!         )
//!         .build()?;
//!
//!     svc.register_handler(
//!         HandlerSpec::new("link-down", HandlerFn::arc(|n: &mut Notification| {
//!             let ranks: Vec<String> = n.payload().sources().map(|p| p.to_string()).collect();
//!             println!("link down on {ranks:?}");
//!             Ok(Flow::EndChain)
//!         }))
//!         .with_code(StatusCode(42)),
//!     )
//!     .await?;
//!
//!     // Three ranks report the same fault: one delivery lists all of them.
//!     let receipt = svc
//!         .report_with_receipt(Report::new(StatusCode(42), ProcId::new("job", 0)))
//!         .await?;
//!     svc.report_event(Report::new(StatusCode(42), ProcId::new("job", 1))).await?;
//!     svc.report_event(Report::new(StatusCode(42), ProcId::new("job", 2))).await?;
//!
//!     let delivery = receipt.await.expect("chain completed");
//!     assert_eq!(delivery.payload.source_count(), 3);
//!
//!     svc.shutdown().await
//! }
//! ```
mod core;
mod error;
mod handlers;
mod monitor;
mod policies;
mod registry;
mod types;

// ---- Public re-exports ----

pub use crate::core::{
    Completion, Config, Delivery, EventHandle, EventService, EventServiceBuilder, Outcome, Report,
};
pub use error::{EventError, HandlerError};
pub use handlers::{Flow, Handler, HandlerFn, HandlerRef, HandlerSpec, Notification};
pub use monitor::{Bus, MonitorEvent, MonitorKind};
pub use policies::{DEFAULT_PRECEDENCE, DefaultDelivery, Placement};
pub use registry::{ActiveCodes, Category, HandlerEntry, HandlerId, Registry, Removal};
pub use types::{
    Info, InfoValue, Payload, ProcId, ProcSet, Rank, Range, ReturnObject, StatusCode, keys,
};

// Optional: a built-in default handler that logs unclaimed events.
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use handlers::LogHandler;
