//! # Range matcher.
//!
//! A [`Range`] is the scope of a registration: either every process, or an
//! explicit, non-empty set of process identities. "All" is its own variant and
//! never a sentinel value inside the set.
//!
//! ## Matching
//! ```text
//! Range::All                 matches any source
//! Range::Procs([a:1, b:*])   matches a:1 and every rank of b
//! ```

use std::fmt;
use std::sync::Arc;

use crate::error::EventError;
use crate::types::ProcId;

/// Scope of a registration or of a reported event.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Range {
    /// Every process.
    #[default]
    All,
    /// An explicit set of processes; built with [`Range::procs`].
    Procs(ProcSet),
}

/// Non-empty set of process identities inside [`Range::Procs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcSet(Arc<[ProcId]>);

impl ProcSet {
    /// Members in the order they were given.
    pub fn iter(&self) -> impl Iterator<Item = &ProcId> {
        self.0.iter()
    }
}

impl Range {
    /// Builds an explicit range.
    ///
    /// Returns [`EventError::EmptyRange`] when `procs` yields nothing.
    pub fn procs(procs: impl IntoIterator<Item = ProcId>) -> Result<Self, EventError> {
        let procs: Vec<ProcId> = procs.into_iter().collect();
        if procs.is_empty() {
            return Err(EventError::EmptyRange);
        }
        Ok(Range::Procs(ProcSet(procs.into())))
    }

    /// Returns true if `source` falls inside this range.
    pub fn matches(&self, source: &ProcId) -> bool {
        match self {
            Range::All => true,
            Range::Procs(set) => set.iter().any(|p| p.matches(source)),
        }
    }

    /// Returns true for [`Range::All`].
    #[inline]
    pub fn is_all(&self) -> bool {
        matches!(self, Range::All)
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Range::All => f.write_str("all"),
            Range::Procs(set) => {
                f.write_str("[")?;
                for (i, p) in set.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{p}")?;
                }
                f.write_str("]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_matches_everything() {
        assert!(Range::All.matches(&ProcId::new("x", 0)));
        assert!(Range::default().is_all());
    }

    #[test]
    fn test_explicit_set_must_not_be_empty() {
        let err = Range::procs(Vec::new()).unwrap_err();
        assert!(matches!(err, EventError::EmptyRange));
    }

    #[test]
    fn test_explicit_set_membership() {
        let r = Range::procs([ProcId::new("a", 1), ProcId::wildcard("b")]).unwrap();
        assert!(r.matches(&ProcId::new("a", 1)));
        assert!(!r.matches(&ProcId::new("a", 2)));
        assert!(r.matches(&ProcId::new("b", 42)));
        assert!(!r.matches(&ProcId::new("c", 1)));
        assert_eq!(r.to_string(), "[a:1,b:*]");
    }

    #[test]
    fn test_explicit_set_keeps_members() {
        let Range::Procs(set) = Range::procs([ProcId::new("a", 1)]).unwrap() else {
            panic!("expected an explicit range");
        };
        let members: Vec<_> = set.iter().collect();
        assert_eq!(members, [&ProcId::new("a", 1)]);
    }
}
