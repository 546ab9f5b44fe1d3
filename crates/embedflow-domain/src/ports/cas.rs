//! Compare-and-set primitives.
//!
//! Every coordination write in the system - progress status updates and
//! scheduler claims - goes through a conditional update: "write attributes
//! X only if predicate P holds on the current item, and report whether the
//! write occurred". Lost races are an expected outcome, not an error.

/// Result of a conditional write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CasOutcome {
    /// The condition held and the write was applied
    Applied,
    /// The condition failed; nothing was written
    ConditionFailed,
}

impl CasOutcome {
    /// Returns `true` if the write was applied.
    #[must_use]
    pub fn applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}
