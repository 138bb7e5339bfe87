//! # Handler registry.
//!
//! Holds every registration and answers "who sees this event, in which order".
//!
//! ## Architecture
//! ```text
//! Registry
//!   ├─ entries:  HandlerId → Arc<HandlerEntry>        (owned records)
//!   ├─ names:    name → HandlerId                     (uniqueness, removal by name)
//!   ├─ first / last: Vec<HandlerId>                   (pinned sequences)
//!   ├─ single:   code → {(precedence, id)}            (exactly one code)
//!   ├─ multi:    {(precedence, id)}                   (two or more codes)
//!   ├─ defaults: {(precedence, id)}                   (no code)
//!   └─ active:   ActiveCodes (code → registrations)   (fast "anyone listening?")
//! ```
//!
//! ## Rules
//! - Names are unique; a second registration under a live name is rejected.
//! - Category membership is an index set, never a pointer link: removing an
//!   entry never invalidates a chain that already holds it.
//! - A handler referenced by an in-flight chain is unlinked at once but
//!   dropped only when the last chain releases it.

mod active;
mod entry;
mod table;

pub use active::ActiveCodes;
pub use entry::{Category, HandlerEntry, HandlerId};
pub use table::{Registry, Removal};
