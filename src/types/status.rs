use std::fmt;

/// Integer identifying an event kind.
///
/// The crate never interprets the value: it is only used as a key for handler
/// lookup, active-code counting and coalescing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatusCode(pub i32);

impl StatusCode {
    /// Wraps a raw status value.
    #[inline]
    pub const fn new(code: i32) -> Self {
        Self(code)
    }

    /// Returns the raw status value.
    #[inline]
    pub const fn get(self) -> i32 {
        self.0
    }
}

impl From<i32> for StatusCode {
    fn from(code: i32) -> Self {
        Self(code)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
