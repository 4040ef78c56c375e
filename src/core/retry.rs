//! Fixed-attempt, fixed-delay retry around the bounded executor.

use std::future::Future;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::warn;

use crate::adapters::TransformError;
use crate::domain::CallOutcome;

use super::executor;

/// Terminal failure after every configured attempt was spent.
///
/// The kind follows the *last* attempt's failure: a run of timeouts
/// ending in a provider error is `Error`, and vice versa.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RetryExhausted {
    /// The final attempt timed out
    #[error("timed out after {attempts} attempts ({per_attempt:?} each)")]
    Timeout { attempts: u32, per_attempt: Duration },

    /// The final attempt failed with a non-timeout error
    #[error("failed after {attempts} attempts, last error: {last_error}")]
    Error { attempts: u32, last_error: String },
}

impl RetryExhausted {
    /// Number of attempts that were spent
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Timeout { attempts, .. } | Self::Error { attempts, .. } => *attempts,
        }
    }
}

/// Retry configuration for one stage call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempts, including the first (>= 1)
    pub max_attempts: u32,

    /// Wall-clock deadline per attempt
    pub timeout: Duration,

    /// Fixed delay between attempts; never applied after the final
    /// attempt or after a success
    pub retry_delay: Duration,
}

/// One attempt's bookkeeping; discarded once the call resolves.
struct AttemptRecord {
    attempt: u32,
    elapsed: Duration,
    outcome: CallOutcome,
}

impl RetryPolicy {
    /// Drive `operation` until it succeeds or attempts run out.
    ///
    /// `operation` is a factory invoked once per attempt. Each failed
    /// attempt is reported via `tracing::warn!` before the delay.
    pub async fn call_with_retry<F, Fut>(
        &self,
        label: &str,
        mut operation: F,
    ) -> Result<String, RetryExhausted>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<String, TransformError>> + Send + 'static,
    {
        let max = self.max_attempts.max(1);
        let mut last_timed_out = false;
        let mut last_error = String::new();

        for attempt in 1..=max {
            let started = Instant::now();
            let outcome = executor::execute(operation(), self.timeout).await;
            let record = AttemptRecord {
                attempt,
                elapsed: started.elapsed(),
                outcome,
            };

            match record.outcome {
                CallOutcome::Success(value) => return Ok(value),
                CallOutcome::TimedOut => {
                    last_timed_out = true;
                    warn!(
                        stage = label,
                        attempt = record.attempt,
                        max,
                        elapsed_ms = record.elapsed.as_millis() as u64,
                        "attempt timed out"
                    );
                }
                CallOutcome::Failed(message) => {
                    last_timed_out = false;
                    warn!(
                        stage = label,
                        attempt = record.attempt,
                        max,
                        error = %message,
                        "attempt failed"
                    );
                    last_error = message;
                }
            }

            if attempt < max {
                tokio::time::sleep(self.retry_delay).await;
            }
        }

        if last_timed_out {
            Err(RetryExhausted::Timeout {
                attempts: max,
                per_attempt: self.timeout,
            })
        } else {
            Err(RetryExhausted::Error {
                attempts: max,
                last_error,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            timeout: Duration::from_secs(5),
            retry_delay: Duration::from_millis(100),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_first_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = policy(3)
            .call_with_retry("stage", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok("ok".to_string()) }
            })
            .await;

        assert_eq!(result.unwrap(), "ok");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_on_final_attempt_uses_all_attempts_and_delays() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);
        let retry_delay = Duration::from_millis(100);

        let started = tokio::time::Instant::now();
        let result = policy(3)
            .call_with_retry("stage", move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        Err(TransformError::Provider(format!("attempt {n}")))
                    } else {
                        Ok("late win".to_string())
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "late win");
        assert_eq!(calls.load(Ordering::SeqCst), 3);

        // Exactly two inter-attempt delays under the paused clock
        let elapsed = started.elapsed();
        assert!(elapsed >= retry_delay * 2, "elapsed {elapsed:?}");
        assert!(elapsed < retry_delay * 3, "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_timeouts_classified_as_timeout_exhaustion() {
        let result = policy(3)
            .call_with_retry("stage", || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok("too late".to_string())
            })
            .await;

        match result {
            Err(RetryExhausted::Timeout { attempts, per_attempt }) => {
                assert_eq!(attempts, 3);
                assert_eq!(per_attempt, Duration::from_secs(5));
            }
            other => panic!("expected timeout exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_classification_follows_last_attempt() {
        // Attempts 1-2 time out, attempt 3 fails with a provider error
        let calls = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&calls);

        let result = policy(3)
            .call_with_retry("stage", move || {
                let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
                async move {
                    if n < 3 {
                        tokio::time::sleep(Duration::from_secs(60)).await;
                        Ok("never".to_string())
                    } else {
                        Err(TransformError::Provider("final failure".to_string()))
                    }
                }
            })
            .await;

        match result {
            Err(RetryExhausted::Error { attempts, last_error }) => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("final failure"));
            }
            other => panic!("expected error exhaustion, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_attempt_policy_never_sleeps() {
        let started = tokio::time::Instant::now();

        let result = policy(1)
            .call_with_retry("stage", || async {
                Err(TransformError::Provider("once".to_string()))
            })
            .await;

        assert!(matches!(result, Err(RetryExhausted::Error { attempts: 1, .. })));
        assert!(started.elapsed() < Duration::from_millis(100));
    }
}
