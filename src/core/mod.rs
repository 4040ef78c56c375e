//! Pipeline core.
//!
//! This module contains:
//! - executor: bounded execution of one call under a wall-clock deadline
//! - retry: fixed-attempt, fixed-delay retry around the executor
//! - chain: the ordered translation chain applied to one sentence
//! - checkpoint: atomic JSON persistence of run results
//! - orchestrator: the run loop driving sentences through the chain

pub mod chain;
pub mod checkpoint;
pub mod executor;
pub mod orchestrator;
pub mod retry;

// Re-export commonly used types
pub use chain::{ChainFailure, Stage, StageChain};
pub use checkpoint::{CheckpointWriter, PersistenceError};
pub use orchestrator::{AbortReason, Orchestrator, RunCompletion, RunSettings};
pub use retry::{RetryExhausted, RetryPolicy};
