//! Process-wide capture facade.
//!
//! A single main client lives in an explicit global slot; capture calls go
//! through it and become no-ops when no client is installed. The slot is
//! process-wide shared state, not thread-local: every thread observes the
//! same client, and handing clients around explicitly remains possible by
//! using [`crate::client::Client`] directly.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use crate::client::{Client, ClientOptions};
use crate::error::OutpostResult;
use crate::executor::FlushHandle;
use crate::protocol::{Event, EventId, Level};
use crate::transport::Transport;

static MAIN_CLIENT: RwLock<Option<Arc<Client>>> = RwLock::new(None);

/// Installs a new main client built from the given options and transport.
///
/// A previously installed client is closed after the replacement, so capture
/// calls never observe an empty slot during re-initialization.
pub async fn init(options: ClientOptions, transport: Arc<dyn Transport>) -> OutpostResult<()> {
    let client = Arc::new(Client::new(options, transport)?);

    let previous = MAIN_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .replace(client);

    if let Some(previous) = previous {
        previous.close().await;
    }

    Ok(())
}

/// Closes and removes the main client.
///
/// Capture calls made afterwards are no-ops returning nil event ids.
pub async fn close() {
    let previous = MAIN_CLIENT
        .write()
        .unwrap_or_else(PoisonError::into_inner)
        .take();

    if let Some(previous) = previous {
        previous.close().await;
    }
}

/// Returns whether a main client is installed.
pub fn is_enabled() -> bool {
    MAIN_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .is_some()
}

/// Captures an event through the main client.
///
/// Returns the nil id when no client is installed.
pub fn capture_event(event: Event) -> EventId {
    with_client(|client| client.capture_event(event)).unwrap_or_else(EventId::nil)
}

/// Captures a message event through the main client.
pub fn capture_message(message: impl Into<String>, level: Level) -> EventId {
    with_client(|client| client.capture_message(message, level)).unwrap_or_else(EventId::nil)
}

/// Captures an error event through the main client.
pub fn capture_error(error: &dyn std::error::Error) -> EventId {
    with_client(|client| client.capture_error(error)).unwrap_or_else(EventId::nil)
}

/// Flushes the main client's in-flight dispatches.
///
/// Returns [`None`] when no client is installed.
pub fn flush(timeout: Duration) -> Option<FlushHandle> {
    with_client(|client| client.flush(timeout))
}

fn with_client<R>(f: impl FnOnce(&Client) -> R) -> Option<R> {
    let client = MAIN_CLIENT
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    client.map(|client| f(&client))
}
