//! The event-capturing client.
//!
//! A [`Client`] owns the dispatch executor and the transport: capture calls
//! wrap the event into a dispatch task and submit it, returning immediately.
//! Delivery, retries and backpressure are the executor's business.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::info;

use crate::bail;
use crate::diagnostics::DiagnosticLogger;
use crate::dsn::Dsn;
use crate::error::{ErrorKind, OutpostResult};
use crate::executor::{ExponentialBackoff, FlushHandle, RetryExecutor};
use crate::protocol::{Event, EventId, Level};
use crate::task::Task;
use crate::transport::Transport;
use outpost_config::shared::{BackoffConfig, ExecutorConfig};

/// Options controlling client construction.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// The DSN naming the ingestion endpoint and credentials. Required.
    pub dsn: Option<String>,
    /// Whether SDK-internal diagnostics are recorded.
    pub debug: bool,
    /// Minimum severity of recorded diagnostics.
    pub diagnostic_level: Level,
    /// Dispatch executor sizing.
    pub executor: ExecutorConfig,
    /// Fallback retry backoff.
    pub backoff: BackoffConfig,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            dsn: None,
            debug: false,
            diagnostic_level: Level::Debug,
            executor: ExecutorConfig::default(),
            backoff: BackoffConfig::default(),
        }
    }
}

/// An event-capturing client bound to one ingestion endpoint.
pub struct Client {
    dsn: Dsn,
    transport: Arc<dyn Transport>,
    executor: RetryExecutor,
    diagnostics: DiagnosticLogger,
}

impl Client {
    /// Creates a client and starts its dispatch executor.
    ///
    /// Fails when the DSN is missing or invalid, or the executor
    /// configuration does not validate. Must be called from within a Tokio
    /// runtime since the executor spawns its workers immediately.
    pub fn new(options: ClientOptions, transport: Arc<dyn Transport>) -> OutpostResult<Self> {
        let Some(dsn) = options.dsn.as_deref() else {
            bail!(ErrorKind::ConfigError, "A DSN is required to build a client");
        };
        let dsn: Dsn = dsn.parse()?;

        options.backoff.validate()?;
        let backoff = ExponentialBackoff::from(options.backoff.clone());
        let executor = RetryExecutor::start(options.executor.clone(), backoff)?;

        info!("initializing client for project {}", dsn.project_id());

        Ok(Self {
            dsn,
            transport,
            executor,
            diagnostics: DiagnosticLogger::new(options.debug, options.diagnostic_level),
        })
    }

    /// The DSN this client dispatches to.
    pub fn dsn(&self) -> &Dsn {
        &self.dsn
    }

    /// Captures an event for asynchronous dispatch.
    ///
    /// Assigns an id when the event carries none and returns it immediately;
    /// delivery happens in the background. Events rejected by the dispatch
    /// queue's soft cap are dropped with a diagnostic.
    pub fn capture_event(&self, mut event: Event) -> EventId {
        if event.event_id.is_nil() {
            event.event_id = EventId::new();
        }
        let event_id = event.event_id;

        let task = Arc::new(EventDispatchTask {
            event,
            transport: self.transport.clone(),
        });
        let handle = self.executor.submit(task);

        if handle.is_canceled() {
            self.diagnostics.log(
                Level::Warning,
                format_args!("event {event_id} dropped, dispatch queue is full"),
            );
        }

        event_id
    }

    /// Captures a message event at the given severity.
    pub fn capture_message(&self, message: impl Into<String>, level: Level) -> EventId {
        self.capture_event(Event::from_message(message, level))
    }

    /// Captures an error event.
    pub fn capture_error(&self, error: &dyn std::error::Error) -> EventId {
        self.capture_event(Event::from_error(error))
    }

    /// Waits for in-flight dispatches to settle, up to `timeout`.
    pub fn flush(&self, timeout: Duration) -> FlushHandle {
        self.executor.flush(timeout)
    }

    /// Shuts the client down, draining queued dispatches first.
    pub async fn close(&self) {
        info!("closing client for project {}", self.dsn.project_id());
        self.executor.shutdown().await;
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client").field("dsn", &self.dsn).finish()
    }
}

/// Dispatch task shipping one event through the transport.
///
/// Retry backpressure reported by the transport flows to the executor
/// through the task's delay suggestion.
struct EventDispatchTask {
    event: Event,
    transport: Arc<dyn Transport>,
}

#[async_trait]
impl Task for EventDispatchTask {
    async fn run(&self) -> OutpostResult<()> {
        self.transport.send_event(self.event.clone()).await
    }

    fn suggested_retry_delay_millis(&self) -> i64 {
        self.transport.suggested_retry_delay_millis()
    }
}
