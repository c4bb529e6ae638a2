use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// The worker pool cannot be empty.
    #[error("`core_pool_size` cannot be zero")]
    CorePoolSizeZero,
    /// Admitting zero tasks makes the executor useless.
    #[error("`max_queue_size` cannot be zero")]
    MaxQueueSizeZero,
    /// A zero ceiling would clamp every computed delay to nothing.
    #[error("`max_delay_ms` cannot be zero")]
    MaxDelayZero,
}
