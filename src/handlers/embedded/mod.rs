//! # Built-in handlers
//!
//! Small, self-contained handlers useful for demos and as a safety net.
//!
//! - [`LogHandler`]: logs events through `tracing` (register it as a default handler).

mod log;

pub use log::LogHandler;
