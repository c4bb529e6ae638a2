use async_trait::async_trait;

use crate::error::OutpostResult;
use crate::protocol::Event;

mod memory;

pub use memory::MemoryTransport;

/// Outbound channel for captured events.
///
/// The client wraps every captured event into a dispatch task that calls
/// [`Transport::send_event`]; the executor retries failed sends within its
/// configured bounds. Implementations own serialization and the wire
/// protocol; the core knows neither.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Ships one event to the ingestion endpoint.
    async fn send_event(&self, event: Event) -> OutpostResult<()>;

    /// Suggested delay, in milliseconds, before retrying a failed send.
    ///
    /// Transports that observe server-driven backpressure report it here;
    /// negative means "no suggestion" and defers to the executor's backoff.
    fn suggested_retry_delay_millis(&self) -> i64 {
        -1
    }
}
