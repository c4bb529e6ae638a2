#![allow(dead_code)]

use std::time::Duration;

use outpost_config::shared::ExecutorConfig;

/// Builds an executor configuration for tests.
pub fn executor_config(
    core_pool_size: u16,
    max_retries: u32,
    max_queue_size: usize,
) -> ExecutorConfig {
    ExecutorConfig {
        core_pool_size,
        max_retries,
        max_queue_size,
    }
}

/// Polls `condition` until it holds or `timeout` elapses.
pub async fn wait_until(condition: impl Fn() -> bool, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;

    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    condition()
}
