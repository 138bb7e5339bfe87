//! Value types shared across the registry, cache and dispatch chain.
//!
//! ## Contents
//! - [`StatusCode`] identifies an event kind (fault, state change, resource condition)
//! - [`ProcId`], [`Rank`] identify the reporting process
//! - [`Range`] the set of processes a registration cares about (range matcher)
//! - [`Info`], [`InfoValue`], [`Payload`] the metadata carried by an event

mod info;
mod proc;
mod range;
mod status;

pub use info::{Info, InfoValue, Payload, ReturnObject, keys};
pub use proc::{ProcId, Rank};
pub use range::{ProcSet, Range};
pub use status::StatusCode;
