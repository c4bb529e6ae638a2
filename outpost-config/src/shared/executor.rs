use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Configuration for the dispatch executor's worker pool and retry bounds.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ExecutorConfig {
    /// Number of worker tasks servicing the delay queue.
    pub core_pool_size: u16,
    /// Maximum number of retries per task. A task runs at most
    /// `max_retries + 1` times.
    pub max_retries: u32,
    /// Upper bound on queued plus running envelopes. Submissions beyond this
    /// soft cap are rejected.
    pub max_queue_size: usize,
}

impl ExecutorConfig {
    /// Validates the [`ExecutorConfig`].
    ///
    /// Returns [`ValidationError::CorePoolSizeZero`] or
    /// [`ValidationError::MaxQueueSizeZero`] when the respective bound is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.core_pool_size == 0 {
            return Err(ValidationError::CorePoolSizeZero);
        }

        if self.max_queue_size == 0 {
            return Err(ValidationError::MaxQueueSizeZero);
        }

        Ok(())
    }
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            core_pool_size: 1,
            max_retries: 3,
            max_queue_size: 30,
        }
    }
}
