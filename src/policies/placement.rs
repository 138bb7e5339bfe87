//! # Handler placement.
//!
//! [`Placement`] decides where a handler sits in the visiting order of a
//! dispatch chain.
//!
//! - [`Placement::First`] pins the handler ahead of every category.
//! - [`Placement::Last`] pins the handler behind every category.
//! - [`Placement::Precedence`] orders the handler inside its category
//!   (single-code, multi-code or default): ascending precedence, ties broken by
//!   registration order.
//!
//! ## Visiting order
//! ```text
//! pinned First  ──► single-code ──► multi-code ──► default ──► pinned Last
//! (reg. order)      (prec, idx)     (prec, idx)    (prec, idx)  (reg. order)
//! ```

/// Precedence used when a registration does not ask for one.
pub const DEFAULT_PRECEDENCE: u8 = 128;

/// Position of a handler in the dispatch order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Placement {
    /// Visited before all category handlers.
    First,
    /// Visited after all category handlers.
    Last,
    /// Ordered inside its category; lower values are visited earlier.
    Precedence(u8),
}

impl Placement {
    /// Returns true for [`Placement::First`] and [`Placement::Last`].
    #[inline]
    pub fn is_pinned(self) -> bool {
        matches!(self, Placement::First | Placement::Last)
    }

    /// Precedence byte used for ordering inside a category.
    ///
    /// Pinned placements map to the extremes so that sorting by this value is
    /// still meaningful when pinned entries are listed together with others.
    #[inline]
    pub fn precedence(self) -> u8 {
        match self {
            Placement::First => u8::MIN,
            Placement::Last => u8::MAX,
            Placement::Precedence(p) => p,
        }
    }
}

impl Default for Placement {
    /// Returns `Placement::Precedence(DEFAULT_PRECEDENCE)`.
    fn default() -> Self {
        Placement::Precedence(DEFAULT_PRECEDENCE)
    }
}
