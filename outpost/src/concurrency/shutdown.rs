use tokio::sync::watch;

use crate::concurrency::signal::{SignalRx, SignalTx, create_signal};

/// Transmitter side of a shutdown coordination channel.
///
/// [`ShutdownTx`] broadcasts a shutdown signal to every subscribed worker at
/// once. The executor keeps two of these: one with drain semantics (finish
/// queued work, then stop) and one with interrupt semantics (abandon the
/// in-flight run at the next await point).
#[derive(Debug, Clone)]
pub struct ShutdownTx(SignalTx);

impl ShutdownTx {
    /// Wraps a signal transmitter with shutdown semantics.
    pub fn wrap(tx: SignalTx) -> Self {
        Self(tx)
    }

    /// Signals shutdown to all subscribed workers.
    ///
    /// Workers observe the signal at their next wait or await point. Sending
    /// fails only when every receiver has already been dropped, which callers
    /// may safely ignore.
    pub fn shutdown(&self) -> Result<(), watch::error::SendError<()>> {
        self.0.send(())
    }

    /// Creates a new shutdown receiver for worker subscription.
    ///
    /// Each worker calls this to get its own receiver. Multiple receivers can
    /// be created from the same transmitter.
    pub fn subscribe(&self) -> ShutdownRx {
        self.0.subscribe()
    }
}

/// Receiver side of a shutdown coordination channel.
///
/// [`ShutdownRx`] is used by workers to detect that shutdown was requested.
pub type ShutdownRx = SignalRx;

/// Creates a new shutdown coordination channel.
pub fn create_shutdown_channel() -> (ShutdownTx, ShutdownRx) {
    let (tx, rx) = create_signal();
    (ShutdownTx::wrap(tx), rx)
}
