//! Outcome of a single bounded call attempt.

/// The three-way result of running one operation under a deadline.
///
/// Produced once per attempt and never mutated. Timeouts and errors are
/// distinct kinds so the retry policy can classify exhaustion without
/// knowing how cancellation is implemented.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// The operation completed within the deadline
    Success(String),

    /// The deadline elapsed; any late result was discarded
    TimedOut,

    /// The operation itself failed
    Failed(String),
}

impl CallOutcome {
    /// Check whether this outcome is a timeout
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }
}
