//! # Handler registration.
//!
//! Defines [`HandlerSpec`], the bundle handed to
//! [`EventService::register_handler`](crate::EventService::register_handler).
//!
//! The number of subscribed codes picks the handler's category:
//! ```text
//! codes = []        → default category (sees unclaimed events)
//! codes = [c]       → single-code category
//! codes = [c1, c2…] → multi-code category
//! ```
//!
//! ## Example
//! ```rust
//! use eventvisor::{Flow, HandlerFn, HandlerSpec, Notification, Placement, ProcId, Range, StatusCode};
//!
//! let spec = HandlerSpec::new("abort-watch", HandlerFn::arc(|_n: &mut Notification| Ok(Flow::Continue)))
//!     .with_codes([StatusCode(7), StatusCode(9)])
//!     .with_range(Range::procs([ProcId::wildcard("job-1")]).unwrap())
//!     .with_placement(Placement::First)
//!     .with_locator("examples/doc");
//!
//! assert_eq!(spec.codes().len(), 2);
//! assert_eq!(spec.placement(), Placement::First);
//! ```

use std::sync::Arc;

use crate::handlers::HandlerRef;
use crate::policies::Placement;
use crate::types::{Range, ReturnObject, StatusCode};

/// Registration of one handler.
#[derive(Clone)]
pub struct HandlerSpec {
    pub(crate) name: Arc<str>,
    pub(crate) handler: HandlerRef,
    pub(crate) codes: Vec<StatusCode>,
    pub(crate) placement: Placement,
    pub(crate) range: Range,
    pub(crate) locator: Option<Arc<str>>,
    pub(crate) return_object: Option<ReturnObject>,
}

impl HandlerSpec {
    /// Creates a default-category registration covering every process.
    ///
    /// ### Parameters
    /// - `name`: unique name, used for lookup/removal and logs
    /// - `handler`: the callback
    pub fn new(name: impl Into<Arc<str>>, handler: HandlerRef) -> Self {
        Self {
            name: name.into(),
            handler,
            codes: Vec::new(),
            placement: Placement::default(),
            range: Range::All,
            locator: None,
            return_object: None,
        }
    }

    /// Subscribes to one more status code (duplicates are ignored).
    pub fn with_code(mut self, code: StatusCode) -> Self {
        if !self.codes.contains(&code) {
            self.codes.push(code);
        }
        self
    }

    /// Subscribes to the given status codes (duplicates are ignored).
    pub fn with_codes(self, codes: impl IntoIterator<Item = StatusCode>) -> Self {
        codes.into_iter().fold(self, Self::with_code)
    }

    /// Restricts the handler to events from `range`.
    pub fn with_range(mut self, range: Range) -> Self {
        self.range = range;
        self
    }

    /// Sets the dispatch placement.
    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Attaches a free-form origin tag, shown in logs.
    pub fn with_locator(mut self, locator: impl Into<Arc<str>>) -> Self {
        self.locator = Some(locator.into());
        self
    }

    /// Attaches an object handed back in the payload's return-object slot.
    pub fn with_return_object(mut self, object: ReturnObject) -> Self {
        self.return_object = Some(object);
        self
    }

    /// Returns the registration name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the subscribed codes (empty for a default handler).
    pub fn codes(&self) -> &[StatusCode] {
        &self.codes
    }

    /// Returns the placement.
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Returns the range.
    pub fn range(&self) -> &Range {
        &self.range
    }
}
