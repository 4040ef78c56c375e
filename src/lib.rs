//! semdrift - measures semantic drift across chained translation hops
//!
//! Generated English sentences are round-tripped through a fixed chain
//! of translation stages (EN → RU → HE → EN by default) and the output
//! is scored against the original with embedding cosine distance. The
//! interesting part is the resilient pipeline: every stage call runs
//! under a hard wall-clock deadline with a fixed-delay retry loop, and
//! accumulated results are checkpointed so progress is never lost to a
//! failed provider or a killed process.
//!
//! # Modules
//!
//! - `adapters`: external collaborators (Gemini client, traits)
//! - `core`: executor, retry, chain, checkpointing, orchestrator
//! - `domain`: data structures (CallOutcome, ItemResult, Statistics)
//! - `config`: YAML configuration with defaults
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Execute a run (prompts for confirmation)
//! GOOGLE_API_KEY=... semdrift run
//!
//! # Show resolved configuration
//! semdrift config
//! ```

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;

// Re-export main types at crate root for convenience
pub use adapters::{Scorer, SentenceSource, TransformError, Translator};
pub use config::Config;
pub use core::{
    AbortReason, ChainFailure, CheckpointWriter, Orchestrator, PersistenceError, RetryExhausted,
    RetryPolicy, RunCompletion, RunSettings, Stage, StageChain,
};
pub use domain::{CallOutcome, ItemResult, RunState, StageResult, Statistics};
