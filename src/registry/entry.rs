//! # Handler records.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::handlers::{HandlerRef, HandlerSpec};
use crate::policies::Placement;
use crate::types::{ProcId, Range, ReturnObject, StatusCode};

/// Stable handle of a registration; also its insertion index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(pub(crate) u64);

impl HandlerId {
    /// Insertion index (monotonic per registry).
    pub fn index(self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Category a registration falls into, by the size of its code list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Exactly one code.
    Single(StatusCode),
    /// Two or more codes.
    Multi,
    /// No code: fallback handler.
    Default,
}

/// One registration.
pub struct HandlerEntry {
    id: HandlerId,
    name: Arc<str>,
    handler: HandlerRef,
    codes: Vec<StatusCode>,
    placement: Placement,
    range: Range,
    locator: Option<Arc<str>>,
    return_object: Option<ReturnObject>,
    /// Number of in-flight chains holding this entry in their plan.
    in_use: AtomicUsize,
}

impl HandlerEntry {
    pub(crate) fn new(id: HandlerId, spec: HandlerSpec) -> Self {
        Self {
            id,
            name: spec.name,
            handler: spec.handler,
            codes: spec.codes,
            placement: spec.placement,
            range: spec.range,
            locator: spec.locator,
            return_object: spec.return_object,
            in_use: AtomicUsize::new(0),
        }
    }

    pub fn id(&self) -> HandlerId {
        self.id
    }

    pub fn name(&self) -> &Arc<str> {
        &self.name
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    pub fn codes(&self) -> &[StatusCode] {
        &self.codes
    }

    pub fn placement(&self) -> Placement {
        self.placement
    }

    pub fn range(&self) -> &Range {
        &self.range
    }

    pub fn locator(&self) -> Option<&str> {
        self.locator.as_deref()
    }

    pub fn return_object(&self) -> Option<&ReturnObject> {
        self.return_object.as_ref()
    }

    pub fn category(&self) -> Category {
        match self.codes.as_slice() {
            [] => Category::Default,
            [code] => Category::Single(*code),
            _ => Category::Multi,
        }
    }

    /// Ordering key inside a category: ascending precedence, then insertion.
    #[inline]
    pub(crate) fn sort_key(&self) -> (u8, HandlerId) {
        (self.placement.precedence(), self.id)
    }

    /// True if the entry wants `code` (a default entry wants every code) from `source`.
    pub fn wants(&self, code: StatusCode, source: &ProcId) -> bool {
        (self.codes.is_empty() || self.codes.contains(&code)) && self.range.matches(source)
    }

    /// Number of in-flight chains referencing this entry.
    pub fn in_use(&self) -> usize {
        self.in_use.load(Ordering::Acquire)
    }

    pub(crate) fn acquire(&self) {
        self.in_use.fetch_add(1, Ordering::AcqRel);
    }

    /// Returns the remaining reference count.
    pub(crate) fn release(&self) -> usize {
        let prev = self.in_use.fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0, "handler '{}' released more often than acquired", self.name);
        prev.saturating_sub(1)
    }
}

impl fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("codes", &self.codes)
            .field("placement", &self.placement)
            .field("range", &self.range)
            .field("locator", &self.locator)
            .field("in_use", &self.in_use())
            .finish_non_exhaustive()
    }
}
