use std::fmt;
use std::sync::Arc;

use tokio::time::Instant;

use crate::error::OutpostResult;
use crate::executor::handle::SubmitHandle;
use crate::task::Task;

/// Executor-internal wrapper around a submitted task.
///
/// An envelope carries the task, the number of retries already performed
/// before it, and the instant at which it becomes due. An envelope runs at
/// most once: a retry is a fresh envelope over the same task with the counter
/// advanced, and the failed envelope is discarded.
pub(crate) struct TaskEnvelope {
    task: Arc<dyn Task>,
    attempt: u32,
    deadline: Instant,
    handle: SubmitHandle,
}

impl TaskEnvelope {
    /// Wraps a freshly submitted task, due immediately.
    ///
    /// Returns the envelope and the completion handle handed back to the
    /// submitter.
    pub fn first(task: Arc<dyn Task>) -> (Self, SubmitHandle) {
        let handle = SubmitHandle::new();
        let envelope = Self {
            task,
            attempt: 0,
            deadline: Instant::now(),
            handle: handle.clone(),
        };

        (envelope, handle)
    }

    /// Creates the follow-up envelope for a failed attempt.
    ///
    /// The new envelope references the same task, advances the attempt
    /// counter, and gets fresh completion state; the handle returned at
    /// submission stays bound to the attempt it was created for.
    pub fn retry(&self, deadline: Instant) -> Self {
        Self {
            task: self.task.clone(),
            attempt: self.attempt + 1,
            deadline,
            handle: SubmitHandle::new(),
        }
    }

    /// Runs the underlying task.
    pub async fn run(&self) -> OutpostResult<()> {
        self.task.run().await
    }

    /// Number of retries performed before this envelope.
    ///
    /// Zero for the first envelope of a task; the run of this envelope is
    /// attempt number `attempt() + 1`.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The instant at which this envelope becomes due.
    pub fn deadline(&self) -> Instant {
        self.deadline
    }

    pub fn task(&self) -> &Arc<dyn Task> {
        &self.task
    }

    pub fn handle(&self) -> &SubmitHandle {
        &self.handle
    }
}

impl fmt::Debug for TaskEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskEnvelope")
            .field("attempt", &self.attempt)
            .field("deadline", &self.deadline)
            .finish()
    }
}
