use serde::{Deserialize, Serialize};

use crate::shared::ValidationError;

/// Backoff configuration used when a failed task does not suggest its own
/// retry delay.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct BackoffConfig {
    /// Delay, in milliseconds, before the first retry.
    pub base_delay_ms: u64,
    /// Ceiling on the computed delay between retries.
    pub max_delay_ms: u64,
}

impl BackoffConfig {
    /// Validates the [`BackoffConfig`].
    ///
    /// Returns [`ValidationError::MaxDelayZero`] if the ceiling is zero.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_delay_ms == 0 {
            return Err(ValidationError::MaxDelayZero);
        }

        Ok(())
    }
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            base_delay_ms: 1_000,
            max_delay_ms: 60_000,
        }
    }
}
