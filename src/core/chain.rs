//! The ordered translation chain applied to one sentence.

use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info};

use crate::adapters::Translator;
use crate::domain::StageResult;

use super::retry::{RetryExhausted, RetryPolicy};

/// One named hop in the chain.
#[derive(Clone)]
pub struct Stage {
    /// Key used in result files, e.g. "russian" -> "russian_translation"
    pub name: String,

    /// Human-readable label for logs, e.g. "English → Russian"
    pub label: String,

    /// The transformation backend for this hop
    pub translator: Arc<dyn Translator>,
}

/// A stage exhausted its retries; the item and the run stop here.
#[derive(Debug, Error)]
#[error("stage '{stage_label}' gave up: {cause}")]
pub struct ChainFailure {
    /// Label of the stage that exhausted its retries
    pub stage_label: String,

    /// Results of the stages that did complete, in order
    pub completed: Vec<StageResult>,

    /// The terminal retry failure
    #[source]
    pub cause: RetryExhausted,
}

/// The fixed ordered list of stages applied to every sentence.
pub struct StageChain {
    stages: Vec<Stage>,
}

impl StageChain {
    /// Create a chain from an ordered list of stages
    pub fn new(stages: Vec<Stage>) -> Self {
        Self { stages }
    }

    /// Number of stages in the chain
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the chain has no stages
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Result-field names of the stages, in chain order
    pub fn stage_names(&self) -> Vec<String> {
        self.stages.iter().map(|s| s.name.clone()).collect()
    }

    /// Thread `input` through every stage in order.
    ///
    /// Retry scope is strictly per stage: on success the running value
    /// advances and the previous stage is never revisited; on
    /// exhaustion later stages are never attempted.
    pub async fn run_chain(
        &self,
        policy: &RetryPolicy,
        input: &str,
    ) -> Result<Vec<StageResult>, ChainFailure> {
        let mut completed = Vec::with_capacity(self.stages.len());
        let mut current = input.to_string();

        for (stage_index, stage) in self.stages.iter().enumerate() {
            let started = Instant::now();
            let translator = Arc::clone(&stage.translator);
            let text = current.clone();

            let attempt = policy
                .call_with_retry(&stage.label, move || {
                    let translator = Arc::clone(&translator);
                    let text = text.clone();
                    async move { translator.translate(&text).await }
                })
                .await;

            match attempt {
                Ok(output) => {
                    let elapsed = started.elapsed();
                    debug!(
                        stage = %stage.label,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "stage completed"
                    );
                    completed.push(StageResult {
                        stage_index,
                        input: current,
                        output: output.clone(),
                        elapsed,
                    });
                    current = output;
                }
                Err(cause) => {
                    info!(
                        stage = %stage.label,
                        completed = completed.len(),
                        "chain aborted"
                    );
                    return Err(ChainFailure {
                        stage_label: stage.label.clone(),
                        completed,
                        cause,
                    });
                }
            }
        }

        Ok(completed)
    }
}
