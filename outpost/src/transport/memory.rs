use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::info;

use crate::error::OutpostResult;
use crate::protocol::Event;
use crate::transport::Transport;

/// In-memory transport for testing and development purposes.
///
/// [`MemoryTransport`] stores all dispatched events in memory instead of
/// shipping them anywhere, making it ideal for testing capture behavior and
/// for development workflows. All data is lost when the process terminates.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    inner: Arc<Mutex<Vec<Event>>>,
}

impl MemoryTransport {
    /// Creates a new empty memory transport.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a copy of all events dispatched to this transport.
    pub async fn events(&self) -> Vec<Event> {
        let inner = self.inner.lock().await;
        inner.clone()
    }

    /// Clears all stored events.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.clear();
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send_event(&self, event: Event) -> OutpostResult<()> {
        info!("storing event {} in memory", event.event_id);

        let mut inner = self.inner.lock().await;
        inner.push(event);

        Ok(())
    }
}
