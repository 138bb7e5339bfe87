//! Service monitoring: event types and broadcast bus.
//!
//! The dispatch service reports what it does (registrations, cache activity,
//! chain progress, shutdown) as [`MonitorEvent`]s on a [`Bus`]. Nothing inside
//! the service depends on anyone listening; the bus exists for tests, metrics
//! exporters and debugging tools.
//!
//! ## Contents
//! - [`MonitorKind`], [`MonitorEvent`] classification and metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `EventService` (registry calls, shutdown) and its event loop
//!   (cache, chains).
//! - **Consumers**: anything holding a receiver from
//!   [`EventService::subscribe`](crate::EventService::subscribe).

mod bus;
mod event;

pub use bus::Bus;
pub use event::{MonitorEvent, MonitorKind};
