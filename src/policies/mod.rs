//! Dispatch ordering policies.
//!
//! This module groups the knobs that control **in which order** handlers see
//! an event and **whether** default handlers see it at all.
//!
//! ## Contents
//! - [`Placement`] where a handler sits (pinned first / pinned last / precedence)
//! - [`DefaultDelivery`] whether default handlers see already-claimed events
//!
//! ## Quick wiring
//! ```text
//! HandlerSpec { placement: Placement, .. }
//!      └─► Registry keeps pinned sequences + per-category (precedence, index) order
//! Report { defaults: Option<DefaultDelivery>, .. }
//!      └─► Registry::lookup_matching skips defaults unless allowed
//! ```
//!
//! ## Defaults
//! - `Placement::Precedence(DEFAULT_PRECEDENCE)` (= 128).
//! - `DefaultDelivery::WhenUnclaimed`.

mod delivery;
mod placement;

pub use delivery::DefaultDelivery;
pub use placement::{DEFAULT_PRECEDENCE, Placement};
