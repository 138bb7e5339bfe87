//! # Handler view of an in-flight event.
//!
//! A [`Notification`] lives inside one dispatch chain and is lent to each
//! handler in turn. Before every invocation the chain rewrites the payload's
//! trailing slots with the handler's own name and return object, so a handler
//! always sees *its* registration in those slots.
//!
//! Results pushed by a handler stay visible to every later handler of the same
//! chain and are returned to the reporter in the final
//! [`Delivery`](crate::Delivery).

use std::sync::Arc;

use crate::registry::HandlerEntry;
use crate::types::{Info, Payload, ProcId, Range, StatusCode};

/// Event as seen by a handler.
#[derive(Debug, Clone)]
pub struct Notification {
    code: StatusCode,
    source: ProcId,
    range: Range,
    payload: Payload,
    results: Vec<Info>,
    claimed: bool,
}

impl Notification {
    pub(crate) fn new(code: StatusCode, source: ProcId, range: Range, payload: Payload) -> Self {
        Self {
            code,
            source,
            range,
            payload,
            results: Vec::new(),
            claimed: false,
        }
    }

    /// Status code of the event.
    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// First process that reported the event.
    pub fn source(&self) -> &ProcId {
        &self.source
    }

    /// Range the reporter gave the event.
    pub fn range(&self) -> &Range {
        &self.range
    }

    /// Event metadata, including every coalesced source.
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Results appended by earlier handlers of this chain.
    pub fn results(&self) -> &[Info] {
        &self.results
    }

    /// Appends a result entry.
    pub fn push_result(&mut self, info: Info) {
        self.results.push(info);
    }

    /// True once a code-specific handler has been invoked in this chain.
    pub fn is_claimed(&self) -> bool {
        self.claimed
    }

    /// Points the trailing slots at `entry` and records code-specific interest.
    pub(crate) fn prepare(&mut self, entry: &HandlerEntry) {
        self.payload
            .set_slots(Arc::clone(entry.name()), entry.return_object().cloned());
        if !entry.codes().is_empty() {
            self.claimed = true;
        }
    }

    pub(crate) fn into_parts(self) -> (Payload, Vec<Info>) {
        (self.payload, self.results)
    }
}
