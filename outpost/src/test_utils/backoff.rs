use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::executor::BackoffStrategy;

/// A linear backoff that counts how often it is consulted.
///
/// `delay(attempt) = (attempt + 1) * step_ms`. The call counter is shared so
/// tests keep a handle to it after the strategy moves into the executor.
pub struct RecordingBackoff {
    step_ms: u64,
    calls: Arc<AtomicU32>,
}

impl RecordingBackoff {
    pub fn new(step_ms: u64, calls: Arc<AtomicU32>) -> Self {
        Self { step_ms, calls }
    }
}

impl BackoffStrategy for RecordingBackoff {
    fn delay(&self, attempt: u32) -> u64 {
        self.calls.fetch_add(1, Ordering::AcqRel);
        (u64::from(attempt) + 1) * self.step_ms
    }
}
