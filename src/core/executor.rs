//! Bounded execution of a single fallible call.
//!
//! The operation runs on its own tokio task so the deadline holds even
//! when the call itself is not cooperatively cancellable. On expiry the
//! task is aborted and any late result is discarded; a timeout outcome
//! is never overwritten.

use std::future::Future;
use std::time::Duration;

use crate::adapters::TransformError;
use crate::domain::CallOutcome;

/// Run `operation` to completion or until `deadline` elapses.
///
/// All failure modes surface through the returned outcome; this
/// function never returns an error and does not log.
pub async fn execute<F>(operation: F, deadline: Duration) -> CallOutcome
where
    F: Future<Output = Result<String, TransformError>> + Send + 'static,
{
    let mut worker = tokio::spawn(operation);

    match tokio::time::timeout(deadline, &mut worker).await {
        Ok(Ok(Ok(value))) => CallOutcome::Success(value),
        Ok(Ok(Err(err))) => CallOutcome::Failed(err.to_string()),
        Ok(Err(join_err)) => CallOutcome::Failed(format!("stage worker panicked: {join_err}")),
        Err(_elapsed) => {
            worker.abort();
            CallOutcome::TimedOut
        }
    }
}
