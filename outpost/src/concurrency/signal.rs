use tokio::sync::watch;

/// Transmitter side of a coordination signal channel.
///
/// [`SignalTx`] abstracts a watch channel transmitter for sending coordination
/// signals between the executor and its workers. The signal carries no data
/// payload, it is purely a notification that some event occurred.
pub type SignalTx = watch::Sender<()>;

/// Receiver side of a coordination signal channel.
///
/// [`SignalRx`] abstracts a watch channel receiver for detecting coordination
/// signals. Workers can use this to wait for events without polling.
pub type SignalRx = watch::Receiver<()>;

/// Creates a new coordination signal channel.
///
/// Watch channels are used for coordination because every receiver observes
/// the same signal, unlike mpsc channels where one receiver consumes it.
pub fn create_signal() -> (SignalTx, SignalRx) {
    let (tx, rx) = watch::channel(());
    (tx, rx)
}
