//! Per-stage and per-sentence results, and the run-level state that
//! accumulates them.

use std::time::Duration;

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Output of one successful stage application.
///
/// An ordered sequence of these forms the provenance of a sentence
/// through the chain: each entry's `input` equals the previous entry's
/// `output` (or the original sentence for the first entry).
#[derive(Debug, Clone, PartialEq)]
pub struct StageResult {
    /// Zero-based position of the stage in the chain
    pub stage_index: usize,

    /// Text handed to the stage
    pub input: String,

    /// Text the stage produced
    pub output: String,

    /// Wall-clock time the stage took, retries included
    pub elapsed: Duration,
}

/// One fully processed sentence.
///
/// Created exactly once per completed sentence and never mutated after
/// it is appended to the run's results.
#[derive(Debug, Clone)]
pub struct ItemResult {
    /// 1-based index, strictly increasing and contiguous within a run
    pub index: usize,

    /// The generated sentence fed into the chain
    pub original: String,

    /// One output per stage, in chain order
    pub stage_outputs: Vec<String>,

    /// Cosine distance between `original` and the final stage output
    pub cosine_distance: f64,

    /// Wall-clock time for the whole chain plus scoring
    pub processing_time: Duration,

    /// When this sentence finished processing
    pub timestamp: DateTime<Utc>,
}

impl ItemResult {
    /// The round-tripped sentence scored against the original
    pub fn final_sentence(&self) -> &str {
        self.stage_outputs
            .last()
            .map(String::as_str)
            .unwrap_or(&self.original)
    }
}

/// Accumulated state for one pipeline execution.
///
/// Owned exclusively by the orchestrator; `results` is append-only and
/// `ended_at` is set once, on completion or at the moment of an abort.
#[derive(Debug)]
pub struct RunState {
    /// Unique identifier for this run
    pub run_id: Uuid,

    /// Completed sentences in input order
    pub results: Vec<ItemResult>,

    /// When the run started
    pub started_at: DateTime<Utc>,

    /// When the run finished (normal completion or abort)
    pub ended_at: Option<DateTime<Utc>>,
}

impl RunState {
    /// Create state for a fresh run
    pub fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            results: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    /// Cosine distances of all completed sentences, in order
    pub fn distances(&self) -> Vec<f64> {
        self.results.iter().map(|r| r.cosine_distance).collect()
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_final_sentence_is_last_stage_output() {
        let item = ItemResult {
            index: 1,
            original: "one".to_string(),
            stage_outputs: vec!["two".to_string(), "three".to_string()],
            cosine_distance: 0.1,
            processing_time: Duration::from_secs(1),
            timestamp: Utc::now(),
        };

        assert_eq!(item.final_sentence(), "three");
    }

    #[test]
    fn test_fresh_run_state() {
        let state = RunState::new();

        assert!(state.results.is_empty());
        assert!(state.ended_at.is_none());
    }
}
