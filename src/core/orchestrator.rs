//! The run loop driving sentences through the chain.
//!
//! Items are processed strictly sequentially; downstream stages are
//! rate-limited external services and checkpoint indices must stay
//! stable. One orchestrator instance executes exactly one run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tracing::{error, info, warn};

use crate::adapters::Scorer;
use crate::domain::{ItemResult, RunState, Statistics};

use super::chain::{ChainFailure, StageChain};
use super::checkpoint::{CheckpointWriter, PersistenceError};
use super::retry::RetryPolicy;

/// Orchestrator tunables beyond the retry policy.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Write a checkpoint every N completed sentences
    pub checkpoint_interval: usize,

    /// Fixed pause after each sentence (rate limiting); zero disables
    pub inter_item_delay: Duration,
}

/// Why a run stopped before completing every sentence.
#[derive(Debug)]
pub enum AbortReason {
    /// A stage exhausted its retries
    Chain(ChainFailure),

    /// The scorer failed for the item at `index`
    Scoring { index: usize, message: String },

    /// The operator interrupted the run
    Interrupted,
}

impl std::fmt::Display for AbortReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Chain(failure) => write!(f, "{failure}"),
            Self::Scoring { index, message } => {
                write!(f, "scoring sentence {index} failed: {message}")
            }
            Self::Interrupted => write!(f, "interrupted by operator"),
        }
    }
}

/// Terminal outcome of one run.
#[derive(Debug)]
pub enum RunCompletion {
    /// Every sentence was processed and the final result file written
    Completed {
        results: Vec<ItemResult>,
        statistics: Statistics,
    },

    /// The run stopped early; a partial file holds what completed
    Aborted {
        results: Vec<ItemResult>,
        reason: AbortReason,
    },
}

/// Drives every sentence through the chain and accumulates results.
pub struct Orchestrator {
    chain: StageChain,
    scorer: Arc<dyn Scorer>,
    policy: RetryPolicy,
    settings: RunSettings,
    writer: CheckpointWriter,
    state: RunState,
}

impl Orchestrator {
    /// Create an orchestrator for one run
    pub fn new(
        chain: StageChain,
        scorer: Arc<dyn Scorer>,
        policy: RetryPolicy,
        settings: RunSettings,
        writer: CheckpointWriter,
    ) -> Self {
        Self {
            chain,
            scorer,
            policy,
            settings,
            writer,
            state: RunState::new(),
        }
    }

    /// Process every sentence in input order.
    ///
    /// Returns `Err` only when the final result file of a successful
    /// run cannot be written; every processing failure is an `Aborted`
    /// completion with a best-effort partial checkpoint.
    pub async fn run(mut self, sentences: Vec<String>) -> Result<RunCompletion, PersistenceError> {
        let expected = sentences.len();
        info!(
            run_id = %self.state.run_id,
            sentences = expected,
            stages = self.chain.len(),
            "starting drift measurement run"
        );

        let interval = self.settings.checkpoint_interval.max(1);
        let mut interrupt = Box::pin(tokio::signal::ctrl_c());

        for (idx, sentence) in sentences.iter().enumerate() {
            let index = idx + 1;

            let processed = tokio::select! {
                _ = &mut interrupt => None,
                item = self.process_item(index, sentence) => Some(item),
            };

            let item = match processed {
                None => {
                    warn!(completed = self.state.results.len(), "run interrupted");
                    return Ok(self.abort(expected, AbortReason::Interrupted));
                }
                Some(Ok(item)) => item,
                Some(Err(reason)) => {
                    error!(sentence = index, %reason, "run aborted");
                    return Ok(self.abort(expected, reason));
                }
            };

            info!(
                sentence = index,
                total = expected,
                cosine_distance = item.cosine_distance,
                elapsed_ms = item.processing_time.as_millis() as u64,
                "sentence processed"
            );
            self.state.results.push(item);

            if self.state.results.len() % interval == 0 {
                // Protects against process death; failure here is
                // reported but never stops the run
                match self.writer.write_intermediate(&self.state.results) {
                    Ok(path) => info!(path = %path.display(), "checkpoint written"),
                    Err(err) => warn!(error = %err, "checkpoint write failed"),
                }
            }

            if index < expected && !self.settings.inter_item_delay.is_zero() {
                tokio::time::sleep(self.settings.inter_item_delay).await;
            }
        }

        self.state.ended_at = Some(Utc::now());
        let statistics =
            Statistics::from_distances(&self.state.distances()).unwrap_or_default();

        // The one fatal persistence path: a finished run whose results
        // cannot be saved
        let path = self.writer.write_final(&self.state, &statistics)?;
        info!(
            run_id = %self.state.run_id,
            path = %path.display(),
            mean = statistics.mean,
            "run completed"
        );

        Ok(RunCompletion::Completed {
            results: self.state.results,
            statistics,
        })
    }

    /// Run the chain and score one sentence.
    async fn process_item(&self, index: usize, sentence: &str) -> Result<ItemResult, AbortReason> {
        let started = Instant::now();

        let stage_results = self
            .chain
            .run_chain(&self.policy, sentence)
            .await
            .map_err(AbortReason::Chain)?;

        let final_sentence = stage_results
            .last()
            .map(|r| r.output.as_str())
            .unwrap_or(sentence);

        let cosine_distance = self
            .scorer
            .distance(sentence, final_sentence)
            .await
            .map_err(|err| AbortReason::Scoring {
                index,
                message: err.to_string(),
            })?;

        Ok(ItemResult {
            index,
            original: sentence.to_string(),
            stage_outputs: stage_results.into_iter().map(|r| r.output).collect(),
            cosine_distance,
            processing_time: started.elapsed(),
            timestamp: Utc::now(),
        })
    }

    /// Finalize an aborted run with a best-effort partial checkpoint.
    fn abort(mut self, expected: usize, reason: AbortReason) -> RunCompletion {
        self.state.ended_at = Some(Utc::now());

        if self.state.results.is_empty() {
            info!("no sentences completed, skipping partial save");
        } else {
            match self
                .writer
                .write_partial(&self.state, expected, &reason.to_string())
            {
                Ok(path) => info!(
                    completed = self.state.results.len(),
                    expected,
                    path = %path.display(),
                    "partial results saved"
                ),
                Err(err) => error!(error = %err, "failed to save partial results"),
            }
        }

        RunCompletion::Aborted {
            results: self.state.results,
            reason,
        }
    }
}
