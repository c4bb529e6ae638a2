use async_trait::async_trait;

use crate::error::OutpostResult;

/// A unit of work executed by the dispatch executor.
///
/// Tasks are opaque to the executor: it runs them, observes success or
/// failure, and retries failures within the configured bounds. Return values
/// are not a concept here; a task that produces data must deliver it through
/// its own channels.
///
/// A task may suggest how long to wait before the next attempt, which takes
/// precedence over the executor's backoff strategy. This is how transports
/// propagate server-driven backpressure into the retry schedule.
#[async_trait]
pub trait Task: Send + Sync {
    /// Executes the task.
    ///
    /// Failures are observed by the executor and retried while attempts
    /// remain. The future may be dropped at an await point when the executor
    /// is shut down immediately, so tasks must not rely on running to
    /// completion.
    async fn run(&self) -> OutpostResult<()>;

    /// Suggested delay, in milliseconds, before the next attempt.
    ///
    /// Any negative value means "no suggestion" and defers to the executor's
    /// backoff strategy. Zero is a concrete suggestion to retry immediately,
    /// not an absent one.
    fn suggested_retry_delay_millis(&self) -> i64 {
        -1
    }
}
