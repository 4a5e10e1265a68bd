//! Shared outcome types for harness orchestration.

use crate::core::classifier::ErrorKind;

/// How a single tick ended. Reported for observability only; the host never
/// sees a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The kernel ran to completion.
    Completed,
    /// Tick work was abandoned after a classified failure.
    Failed(ErrorKind),
}

impl TickOutcome {
    pub fn is_completed(self) -> bool {
        matches!(self, TickOutcome::Completed)
    }
}
