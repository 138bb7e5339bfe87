//! Service core: coalescing, dispatch and lifecycle.
//!
//! The public surface is [`EventService`] (with its builder and [`Config`]),
//! the cloneable [`EventHandle`], [`Report`] and the [`Delivery`] handed to
//! completions.
//!
//! Internal modules:
//! - [`cache`]: per-code coalescing with trailing-edge timers;
//! - [`chain`]: one ordered walk through the matching handlers of one event;
//! - [`event_loop`]: the task owning the cache and running every chain;
//! - [`service`]: registry access, reporting API, shutdown;
//! - [`handle`]: reporting handle for handlers and other tasks.

mod builder;
mod cache;
mod chain;
mod config;
mod event_loop;
mod handle;
mod service;

pub use builder::EventServiceBuilder;
pub use cache::Report;
pub use chain::{Completion, Delivery, Outcome};
pub use config::Config;
pub use handle::EventHandle;
pub use service::EventService;
