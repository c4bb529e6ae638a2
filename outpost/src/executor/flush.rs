use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};
use std::time::Duration;

use tokio::sync::Notify;
use tracing::{Instrument, debug};

use crate::concurrency::countdown::Countdown;
use crate::executor::queue::DispatchQueue;

/// Single-flight drain barrier over the executor's in-flight runs.
///
/// A flush waits for exactly the runs that were in flight when the drainer
/// started. The snapshot is taken inside the drainer, not at handle creation,
/// so runs finishing in between cannot leave the countdown waiting for
/// completions that already happened.
///
/// At most one flush is active at a time; concurrent callers receive the
/// active handle. The handoff between a cancel racing the drainer start is
/// arbitrated by a single `cleanup_handled` flag so that exactly one side
/// releases the slot.
pub(crate) struct FlushBarrier {
    state: Arc<BarrierState>,
}

struct BarrierState {
    /// The active flush, if any. Cleared by whichever side owns teardown.
    slot: Mutex<Option<FlushHandle>>,
    /// Countdown for the active drain, cloned out by completion cleanup.
    /// Owned by the drainer; the slot only shares it.
    countdown: Mutex<Option<Arc<Countdown>>>,
}

impl FlushBarrier {
    pub fn new() -> Self {
        Self {
            state: Arc::new(BarrierState {
                slot: Mutex::new(None),
                countdown: Mutex::new(None),
            }),
        }
    }

    /// Records one run completion against the active drain, if any.
    ///
    /// The countdown is cloned out of the shared cell before use, so a drain
    /// tearing down concurrently cannot invalidate it mid-call; a completion
    /// recorded against a finished drain is simply absorbed by the countdown's
    /// zero floor.
    pub fn record_completion(&self) {
        let countdown = lock(&self.state.countdown).clone();
        if let Some(countdown) = countdown {
            countdown.count_down();
        }
    }

    /// Starts a flush, or joins the one already in progress.
    ///
    /// The returned handle resolves when the snapshot of in-flight runs has
    /// drained, the timeout elapses, or the handle is canceled. Timeout expiry
    /// is a normal completion, not an error.
    pub fn flush(&self, timeout: Duration, queue: Arc<DispatchQueue>) -> FlushHandle {
        // Quick check before allocating anything; re-checked under the lock.
        if let Some(existing) = lock(&self.state.slot).as_ref() {
            return existing.clone();
        }

        let handle = FlushHandle::new(Arc::downgrade(&self.state));

        {
            let mut slot = lock(&self.state.slot);
            if let Some(existing) = slot.as_ref() {
                // Another caller won the race to start the flush; share its
                // handle and discard ours.
                return existing.clone();
            }
            *slot = Some(handle.clone());
        }

        let shared = handle.shared.clone();
        let state = self.state.clone();
        let span = tracing::info_span!("flush_drainer");
        tokio::spawn(
            async move {
                run_drainer(shared, state, timeout, queue).await;
            }
            .instrument(span),
        );

        handle
    }
}

impl fmt::Debug for FlushBarrier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushBarrier").finish()
    }
}

async fn run_drainer(
    shared: Arc<FlushShared>,
    state: Arc<BarrierState>,
    timeout: Duration,
    queue: Arc<DispatchQueue>,
) {
    if shared
        .cleanup_handled
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        // The handle was canceled before this drainer got to run; the cancel
        // path already released the slot.
        return;
    }

    // Snapshot the in-flight count only now that the drainer owns teardown.
    let countdown = Arc::new(Countdown::new(queue.running()));
    *lock(&state.countdown) = Some(countdown.clone());

    debug!(snapshot = countdown.remaining(), "flush drainer started");

    tokio::select! {
        _ = countdown.wait() => {
            debug!("flush drained the snapshot");
        }
        _ = tokio::time::sleep(timeout) => {
            debug!("flush timed out, remaining work proceeds normally");
        }
        _ = shared.cancel_notify.notified() => {
            debug!("flush canceled while draining");
        }
    }

    *lock(&state.countdown) = None;
    *lock(&state.slot) = None;
    shared.complete();
}

/// Handle to a flush in progress.
///
/// Clones observe the same flush; every concurrent caller of flush gets a
/// clone of the one active handle.
#[derive(Clone)]
pub struct FlushHandle {
    shared: Arc<FlushShared>,
    barrier: Weak<BarrierState>,
}

struct FlushShared {
    /// Arbitrates teardown between the cancel path and the drainer body.
    cleanup_handled: AtomicBool,
    canceled: AtomicBool,
    done: AtomicBool,
    done_notify: Notify,
    cancel_notify: Notify,
}

impl FlushShared {
    fn complete(&self) {
        self.done.store(true, Ordering::Release);
        self.done_notify.notify_waiters();
    }
}

impl FlushHandle {
    fn new(barrier: Weak<BarrierState>) -> Self {
        Self {
            shared: Arc::new(FlushShared {
                cleanup_handled: AtomicBool::new(false),
                canceled: AtomicBool::new(false),
                done: AtomicBool::new(false),
                done_notify: Notify::new(),
                cancel_notify: Notify::new(),
            }),
            barrier,
        }
    }

    /// Creates a handle that is already canceled and done.
    ///
    /// Returned for flushes requested after the executor stopped.
    pub(crate) fn already_terminated() -> Self {
        let handle = Self::new(Weak::new());
        handle.shared.cleanup_handled.store(true, Ordering::Release);
        handle.shared.canceled.store(true, Ordering::Release);
        handle.shared.done.store(true, Ordering::Release);
        handle
    }

    /// Cancels the flush.
    ///
    /// If the drainer has not started yet, this path wins the teardown and
    /// releases the flush slot itself; the drainer body then no-ops. If the
    /// drainer is already draining, its wait is interrupted and it performs
    /// the teardown.
    pub fn cancel(&self) {
        if self.shared.done.load(Ordering::Acquire) {
            return;
        }

        self.shared.canceled.store(true, Ordering::Release);

        if self
            .shared
            .cleanup_handled
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            if let Some(state) = self.barrier.upgrade() {
                *lock(&state.countdown) = None;
                *lock(&state.slot) = None;
            }
            self.shared.complete();
        } else {
            // notify_one stores a permit, so the drainer observes the
            // cancellation even if it has not reached its wait yet.
            self.shared.cancel_notify.notify_one();
        }
    }

    /// Returns whether the flush was canceled.
    pub fn is_canceled(&self) -> bool {
        self.shared.canceled.load(Ordering::Acquire)
    }

    /// Returns whether the flush resolved, by draining, timeout, or cancel.
    pub fn is_done(&self) -> bool {
        self.shared.done.load(Ordering::Acquire)
    }

    /// Waits until the flush resolves.
    pub async fn wait(&self) {
        loop {
            if self.shared.done.load(Ordering::Acquire) {
                return;
            }

            let notified = self.shared.done_notify.notified();

            if self.shared.done.load(Ordering::Acquire) {
                return;
            }

            notified.await;
        }
    }
}

/// Two handles are equal when they observe the same flush.
impl PartialEq for FlushHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl Eq for FlushHandle {}

impl fmt::Debug for FlushHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlushHandle")
            .field("canceled", &self.is_canceled())
            .field("done", &self.is_done())
            .finish()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
