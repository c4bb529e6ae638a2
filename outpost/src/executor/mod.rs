//! The asynchronous dispatch core.
//!
//! [`RetryExecutor`] runs submitted [`Task`]s on a bounded worker pool,
//! retries failures with per-task or strategy-driven delays, and exposes a
//! single-flight flush barrier that waits for in-flight work to settle.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info};

use crate::concurrency::shutdown::{ShutdownRx, ShutdownTx, create_shutdown_channel};
use crate::error::OutpostResult;
use crate::executor::envelope::TaskEnvelope;
use crate::executor::flush::FlushBarrier;
use crate::executor::queue::DispatchQueue;
use crate::task::Task;
use outpost_config::shared::ExecutorConfig;

mod backoff;
mod envelope;
mod flush;
mod handle;
mod queue;

pub use backoff::{BackoffStrategy, ExponentialBackoff};
pub use flush::FlushHandle;
pub use handle::SubmitHandle;

/// Hook invoked when a shutdown path forces the rejection of a task.
///
/// Not invoked for soft-cap rejections; those are silent at this level.
pub type RejectedTaskHook = Box<dyn Fn(Arc<dyn Task>) + Send + Sync>;

const STATE_RUNNING: u8 = 0;
const STATE_DRAINING: u8 = 1;
const STATE_STOPPED: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecutorState {
    /// Accepting and executing work.
    Running,
    /// Refusing new work, finishing queued envelopes.
    Draining,
    /// Terminated.
    Stopped,
}

impl ExecutorState {
    fn from_u8(value: u8) -> Self {
        match value {
            STATE_RUNNING => Self::Running,
            STATE_DRAINING => Self::Draining,
            _ => Self::Stopped,
        }
    }
}

/// A bounded, retrying, flushable task executor.
///
/// A pool of worker tasks services a delay-ordered queue. Submissions pass an
/// advisory admission check over `queued + running`; accepted tasks run
/// immediately, failures are retried with the task's suggested delay or the
/// injected [`BackoffStrategy`], up to the configured retry bound. Task
/// failures are never propagated to submitters; the only observability is
/// through completion handles and the flush barrier.
pub struct RetryExecutor {
    inner: Arc<ExecutorInner>,
    workers: tokio::sync::Mutex<Vec<JoinHandle<()>>>,
}

struct ExecutorInner {
    max_retries: u32,
    max_queue_size: usize,
    backoff: Box<dyn BackoffStrategy>,
    rejected_hook: Option<RejectedTaskHook>,
    queue: Arc<DispatchQueue>,
    state: AtomicU8,
    drain_tx: ShutdownTx,
    interrupt_tx: ShutdownTx,
    flush: FlushBarrier,
}

impl ExecutorInner {
    fn state(&self) -> ExecutorState {
        ExecutorState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn reject(&self, task: Arc<dyn Task>) {
        if let Some(hook) = &self.rejected_hook {
            hook(task);
        }
    }

    /// Enqueues a retry envelope, unless the executor left the running state
    /// in the meantime; retries scheduled during shutdown are rejected the
    /// same way late submissions are.
    fn reschedule(&self, envelope: TaskEnvelope) {
        if self.state() != ExecutorState::Running {
            debug!("dropping retry scheduled during shutdown");
            envelope.handle().mark_canceled();
            self.reject(envelope.task().clone());
            return;
        }

        self.queue.schedule(envelope);
    }
}

impl RetryExecutor {
    /// Starts an executor with the given configuration and backoff strategy.
    ///
    /// Spawns `core_pool_size` workers immediately, so this must be called
    /// from within a Tokio runtime.
    pub fn start(
        config: ExecutorConfig,
        backoff: impl BackoffStrategy + 'static,
    ) -> OutpostResult<Self> {
        Self::start_inner(config, Box::new(backoff), None)
    }

    /// Starts an executor with a hook observing shutdown-path rejections.
    pub fn start_with_rejected_hook(
        config: ExecutorConfig,
        backoff: impl BackoffStrategy + 'static,
        rejected_hook: impl Fn(Arc<dyn Task>) + Send + Sync + 'static,
    ) -> OutpostResult<Self> {
        Self::start_inner(config, Box::new(backoff), Some(Box::new(rejected_hook)))
    }

    fn start_inner(
        config: ExecutorConfig,
        backoff: Box<dyn BackoffStrategy>,
        rejected_hook: Option<RejectedTaskHook>,
    ) -> OutpostResult<Self> {
        config.validate()?;

        let (drain_tx, drain_rx) = create_shutdown_channel();
        let (interrupt_tx, interrupt_rx) = create_shutdown_channel();

        let inner = Arc::new(ExecutorInner {
            max_retries: config.max_retries,
            max_queue_size: config.max_queue_size,
            backoff,
            rejected_hook,
            queue: Arc::new(DispatchQueue::new()),
            state: AtomicU8::new(STATE_RUNNING),
            drain_tx,
            interrupt_tx,
            flush: FlushBarrier::new(),
        });

        let mut workers = Vec::with_capacity(config.core_pool_size as usize);
        for worker_id in 0..config.core_pool_size {
            let span = tracing::info_span!("dispatch_worker", worker_id);
            let worker = worker_loop(inner.clone(), drain_rx.clone(), interrupt_rx.clone());
            workers.push(tokio::spawn(worker.instrument(span)));
        }

        info!(
            core_pool_size = config.core_pool_size,
            max_retries = config.max_retries,
            max_queue_size = config.max_queue_size,
            "dispatch executor started"
        );

        Ok(Self {
            inner,
            workers: tokio::sync::Mutex::new(workers),
        })
    }

    /// Submits a task for immediate execution.
    ///
    /// Returns a completion handle supporting only cancellation and done
    /// queries. Submissions over the soft cap or after shutdown get an
    /// already-canceled handle; only the shutdown path invokes the
    /// rejected-task hook.
    pub fn submit(&self, task: Arc<dyn Task>) -> SubmitHandle {
        if self.inner.state() != ExecutorState::Running {
            debug!("rejecting task submitted after shutdown");
            self.inner.reject(task);
            return SubmitHandle::rejected();
        }

        if !self.inner.queue.try_admit(self.inner.max_queue_size) {
            return SubmitHandle::rejected();
        }

        let (envelope, handle) = TaskEnvelope::first(task);
        self.inner.queue.schedule(envelope);

        handle
    }

    /// Starts a flush, or joins the one already in progress.
    ///
    /// The flush waits up to `timeout` for the runs in flight at drainer
    /// start to complete. After shutdown this returns a canceled-but-done
    /// handle immediately.
    pub fn flush(&self, timeout: Duration) -> FlushHandle {
        if self.inner.state() == ExecutorState::Stopped {
            return FlushHandle::already_terminated();
        }

        self.inner.flush.flush(timeout, self.inner.queue.clone())
    }

    /// Gracefully shuts down: refuses new work, finishes queued envelopes,
    /// then stops the workers.
    pub async fn shutdown(&self) {
        info!("shutting down dispatch executor, draining queued work");

        // Do not downgrade an immediate shutdown that already happened.
        let _ = self.inner.state.compare_exchange(
            STATE_RUNNING,
            STATE_DRAINING,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        let _ = self.inner.drain_tx.shutdown();

        self.join_workers().await;
        self.inner.state.store(STATE_STOPPED, Ordering::Release);

        info!("dispatch executor stopped");
    }

    /// Immediately shuts down: cancels queued envelopes and interrupts
    /// in-flight runs at their next await point.
    pub async fn shutdown_now(&self) {
        info!("shutting down dispatch executor immediately");

        self.inner.state.store(STATE_STOPPED, Ordering::Release);

        let drained = self.inner.queue.drain();
        for envelope in &drained {
            envelope.handle().mark_canceled();
            self.inner.reject(envelope.task().clone());
        }
        if !drained.is_empty() {
            debug!(count = drained.len(), "canceled queued envelopes");
        }

        let _ = self.inner.interrupt_tx.shutdown();

        self.join_workers().await;

        info!("dispatch executor stopped");
    }

    /// Number of envelopes accepted but not yet picked up by a worker.
    pub fn queued_count(&self) -> usize {
        self.inner.queue.queued()
    }

    /// Number of envelopes currently executing.
    pub fn running_count(&self) -> usize {
        self.inner.queue.running()
    }

    async fn join_workers(&self) {
        let workers = {
            let mut guard = self.workers.lock().await;
            std::mem::take(&mut *guard)
        };

        for worker in workers {
            // A worker that panicked already tore itself down; joining the
            // remaining ones is all that matters here.
            let _ = worker.await;
        }
    }
}

impl fmt::Debug for RetryExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryExecutor")
            .field("queued", &self.queued_count())
            .field("running", &self.running_count())
            .finish()
    }
}

/// Outcome of one envelope run, observed by the after-run step.
enum RunOutcome {
    Completed,
    Failed(crate::error::OutpostError),
    Canceled,
    Interrupted,
}

async fn worker_loop(
    inner: Arc<ExecutorInner>,
    mut drain_rx: ShutdownRx,
    mut interrupt_rx: ShutdownRx,
) {
    debug!("dispatch worker started");

    loop {
        match inner.state() {
            ExecutorState::Stopped => break,
            ExecutorState::Draining if inner.queue.is_queue_empty() => break,
            _ => {}
        }

        let Some(deadline) = inner.queue.next_deadline() else {
            // Nothing queued: wait for work or a lifecycle signal.
            tokio::select! {
                _ = inner.queue.work_available() => {}
                _ = drain_rx.changed() => {}
                _ = interrupt_rx.changed() => {}
            }
            continue;
        };

        let now = tokio::time::Instant::now();
        if deadline > now {
            // Earliest envelope is not due yet; sleep until it is, but wake
            // early for newly scheduled work or a lifecycle signal.
            tokio::select! {
                _ = tokio::time::sleep_until(deadline) => {}
                _ = inner.queue.work_available() => {}
                _ = drain_rx.changed() => {}
                _ = interrupt_rx.changed() => {}
            }
            continue;
        }

        // Another worker may have taken the due envelope in the meantime.
        let Some(envelope) = inner.queue.pop_due(now) else {
            continue;
        };

        let interrupted = run_envelope(&inner, envelope, &mut interrupt_rx).await;
        if interrupted {
            break;
        }
    }

    debug!("dispatch worker stopped");
}

/// Runs one envelope through the before-run / run / after-run / cleanup
/// protocol. Returns whether the worker was interrupted and must stop.
async fn run_envelope(
    inner: &Arc<ExecutorInner>,
    envelope: TaskEnvelope,
    interrupt_rx: &mut ShutdownRx,
) -> bool {
    // The running counter was incremented when the envelope was popped.
    let outcome = if envelope.handle().is_canceled() {
        RunOutcome::Canceled
    } else {
        tokio::select! {
            biased;
            _ = interrupt_rx.changed() => RunOutcome::Interrupted,
            result = envelope.run() => match result {
                Ok(()) => RunOutcome::Completed,
                Err(err) => RunOutcome::Failed(err),
            },
        }
    };

    let interrupted = matches!(outcome, RunOutcome::Interrupted);

    match outcome {
        RunOutcome::Completed => {
            envelope.handle().mark_done();
        }
        RunOutcome::Canceled => {
            envelope.handle().mark_canceled();
        }
        RunOutcome::Interrupted => {
            // The run was abandoned mid-flight; it is neither retried nor
            // reported as a failure.
            envelope.handle().mark_canceled();
        }
        RunOutcome::Failed(err) => {
            envelope.handle().mark_done();

            if envelope.handle().is_canceled() {
                debug!("not retrying canceled task");
            } else if envelope.attempt() < inner.max_retries {
                let delay = next_retry_delay(inner, &envelope);
                debug!(
                    attempt = envelope.attempt() + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "task failed, scheduling retry"
                );
                inner.reschedule(envelope.retry(tokio::time::Instant::now() + delay));
            } else {
                debug!(
                    attempts = envelope.attempt() + 1,
                    error = %err,
                    "task failed, retries exhausted"
                );
            }
        }
    }

    // Cleanup runs on every exit path; the completion record is the only
    // signal the flush barrier observes.
    inner.queue.finish_run();
    inner.flush.record_completion();

    interrupted
}

/// Computes the delay before the next attempt: the task's suggestion when it
/// has one, the backoff strategy otherwise. Zero is a concrete suggestion,
/// only negative values mean "no suggestion".
fn next_retry_delay(inner: &ExecutorInner, envelope: &TaskEnvelope) -> Duration {
    let suggested = envelope.task().suggested_retry_delay_millis();
    let delay_ms = if suggested < 0 {
        inner.backoff.delay(envelope.attempt())
    } else {
        suggested as u64
    };

    Duration::from_millis(delay_ms)
}
