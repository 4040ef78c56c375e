//! Domain types for drift measurement runs.
//!
//! This module contains the core data structures:
//! - CallOutcome: the three-way result of one bounded call attempt
//! - StageResult / ItemResult: provenance of a sentence through the chain
//! - RunState: accumulated results for one pipeline execution
//! - Statistics: aggregate figures over cosine distances

pub mod outcome;
pub mod result;
pub mod stats;

// Re-export commonly used types
pub use outcome::CallOutcome;
pub use result::{ItemResult, RunState, StageResult};
pub use stats::Statistics;
