//! # Default-handler delivery policy.
//!
//! Default handlers (no code subscription) are a safety net: by default they
//! only see an event when no code-specific handler claimed it. A report can
//! override this per event.
//!
//! ```text
//! WhenUnclaimed: specific match? ──yes──► skip defaults
//!                                └─no──► deliver to defaults
//! Always:        deliver to defaults regardless
//! ```

/// Policy controlling whether default handlers see an already-claimed event.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DefaultDelivery {
    /// Skip default handlers once a code-specific handler matched (default).
    #[default]
    WhenUnclaimed,
    /// Always deliver to default handlers.
    Always,
}

impl DefaultDelivery {
    /// Combines the policies of two coalesced reports: `Always` wins.
    #[inline]
    pub fn merge(self, other: DefaultDelivery) -> DefaultDelivery {
        match (self, other) {
            (DefaultDelivery::Always, _) | (_, DefaultDelivery::Always) => {
                DefaultDelivery::Always
            }
            _ => DefaultDelivery::WhenUnclaimed,
        }
    }

    /// Returns true if defaults must be visited even when a specific handler matched.
    #[inline]
    pub fn is_always(self) -> bool {
        matches!(self, DefaultDelivery::Always)
    }
}
