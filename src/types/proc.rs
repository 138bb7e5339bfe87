//! # Process identity.
//!
//! A [`ProcId`] names one process of the runtime: a namespace (job) plus a rank
//! inside it. The rank may be [`Rank::Wildcard`], which stands for every rank of
//! the namespace when used inside a [`Range`](crate::Range).
//!
//! ## String form
//! ```text
//! "job-1:3"  → ProcId { nspace: "job-1", rank: Rank::Id(3) }
//! "job-1:*"  → ProcId { nspace: "job-1", rank: Rank::Wildcard }
//! ```
//!
//! ## Example
//! ```rust
//! use eventvisor::{ProcId, Rank};
//!
//! let p: ProcId = "job-1:3".parse().unwrap();
//! assert_eq!(p, ProcId::new("job-1", 3));
//! assert!(ProcId::wildcard("job-1").matches(&p));
//! assert_eq!(p.to_string(), "job-1:3");
//! assert_eq!(ProcId::wildcard("job-1").rank, Rank::Wildcard);
//! ```

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::EventError;

/// Rank of a process inside its namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rank {
    /// A concrete rank.
    Id(u32),
    /// Every rank of the namespace.
    Wildcard,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rank::Id(r) => write!(f, "{r}"),
            Rank::Wildcard => f.write_str("*"),
        }
    }
}

/// Identity of a process: namespace + rank.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ProcId {
    /// Namespace (job) the process belongs to.
    pub nspace: Arc<str>,
    /// Rank inside the namespace.
    pub rank: Rank,
}

impl ProcId {
    /// Creates the identity of one concrete process.
    pub fn new(nspace: impl Into<Arc<str>>, rank: u32) -> Self {
        Self {
            nspace: nspace.into(),
            rank: Rank::Id(rank),
        }
    }

    /// Creates an identity that stands for every rank of `nspace`.
    pub fn wildcard(nspace: impl Into<Arc<str>>) -> Self {
        Self {
            nspace: nspace.into(),
            rank: Rank::Wildcard,
        }
    }

    /// Returns true if this identity covers `other`.
    ///
    /// Namespaces must be equal; a wildcard rank on either side matches any rank.
    pub fn matches(&self, other: &ProcId) -> bool {
        if self.nspace != other.nspace {
            return false;
        }
        match (self.rank, other.rank) {
            (Rank::Wildcard, _) | (_, Rank::Wildcard) => true,
            (Rank::Id(a), Rank::Id(b)) => a == b,
        }
    }
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.nspace, self.rank)
    }
}

impl FromStr for ProcId {
    type Err = EventError;

    /// Parses `"nspace:rank"`; the rank is split at the **last** `:` so namespaces
    /// may contain colons.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EventError::InvalidIdentity {
            input: s.to_string(),
        };
        let (nspace, rank) = s.rsplit_once(':').ok_or_else(invalid)?;
        if nspace.is_empty() {
            return Err(invalid());
        }
        let rank = match rank {
            "*" => Rank::Wildcard,
            r => Rank::Id(r.parse().map_err(|_| invalid())?),
        };
        Ok(Self {
            nspace: nspace.into(),
            rank,
        })
    }
}
