use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use tokio::sync::{Notify, watch};
use tokio::time::Instant;

use crate::error::{ErrorKind, OutpostError, OutpostResult};
use crate::task::Task;

/// A task scripted to fail a fixed number of times before succeeding.
///
/// Records every run's start instant, so tests can assert on retry gaps, and
/// optionally serves a queue of retry-delay suggestions.
pub struct ScriptedTask {
    failures_remaining: AtomicU32,
    suggestions: Mutex<VecDeque<i64>>,
    runs: AtomicU32,
    run_times: Mutex<Vec<Instant>>,
    run_notify: Notify,
}

impl ScriptedTask {
    /// A task that succeeds on its first attempt.
    pub fn succeeding() -> Arc<Self> {
        Self::failing(0)
    }

    /// A task that fails `failures` times, then succeeds.
    pub fn failing(failures: u32) -> Arc<Self> {
        Arc::new(Self {
            failures_remaining: AtomicU32::new(failures),
            suggestions: Mutex::new(VecDeque::new()),
            runs: AtomicU32::new(0),
            run_times: Mutex::new(Vec::new()),
            run_notify: Notify::new(),
        })
    }

    /// A task that never succeeds.
    pub fn always_failing() -> Arc<Self> {
        Self::failing(u32::MAX)
    }

    /// A failing task serving the given retry-delay suggestions, one per
    /// failure. Once exhausted it reports "no suggestion".
    pub fn failing_with_suggestions(failures: u32, suggestions: Vec<i64>) -> Arc<Self> {
        let task = Self::failing(failures);
        *lock(&task.suggestions) = suggestions.into();
        task
    }

    /// Number of times the task ran.
    pub fn runs(&self) -> u32 {
        self.runs.load(Ordering::Acquire)
    }

    /// Start instants of every run, in order.
    pub fn run_times(&self) -> Vec<Instant> {
        lock(&self.run_times).clone()
    }

    /// Waits until the task has run at least `count` times.
    pub async fn wait_for_runs(&self, count: u32) {
        loop {
            if self.runs() >= count {
                return;
            }

            let notified = self.run_notify.notified();

            if self.runs() >= count {
                return;
            }

            notified.await;
        }
    }
}

#[async_trait]
impl Task for ScriptedTask {
    async fn run(&self) -> OutpostResult<()> {
        lock(&self.run_times).push(Instant::now());
        self.runs.fetch_add(1, Ordering::AcqRel);
        self.run_notify.notify_waiters();

        let failed = self
            .failures_remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                remaining.checked_sub(1)
            })
            .is_ok();

        if failed {
            return Err(OutpostError::new(ErrorKind::TaskFailed, "scripted failure"));
        }

        Ok(())
    }

    fn suggested_retry_delay_millis(&self) -> i64 {
        lock(&self.suggestions).pop_front().unwrap_or(-1)
    }
}

/// Creates the gate shared by a group of [`GatedTask`]s.
///
/// Send `true` to release every task blocked on the gate.
pub fn create_gate() -> (watch::Sender<bool>, watch::Receiver<bool>) {
    watch::channel(false)
}

/// A task that blocks until its gate opens.
///
/// Used to pin down the executor's running set in tests: submit, wait for
/// the task to start, then open the gate when the scenario calls for it.
pub struct GatedTask {
    gate: watch::Receiver<bool>,
    started: AtomicU32,
    started_notify: Notify,
    completed: AtomicU32,
}

impl GatedTask {
    pub fn new(gate: watch::Receiver<bool>) -> Arc<Self> {
        Arc::new(Self {
            gate,
            started: AtomicU32::new(0),
            started_notify: Notify::new(),
            completed: AtomicU32::new(0),
        })
    }

    /// Number of times the task entered execution.
    pub fn started(&self) -> u32 {
        self.started.load(Ordering::Acquire)
    }

    /// Number of times the task ran to completion.
    pub fn completed(&self) -> u32 {
        self.completed.load(Ordering::Acquire)
    }

    /// Waits until the task has entered execution at least `count` times.
    pub async fn wait_until_started(&self, count: u32) {
        loop {
            if self.started() >= count {
                return;
            }

            let notified = self.started_notify.notified();

            if self.started() >= count {
                return;
            }

            notified.await;
        }
    }
}

#[async_trait]
impl Task for GatedTask {
    async fn run(&self) -> OutpostResult<()> {
        self.started.fetch_add(1, Ordering::AcqRel);
        self.started_notify.notify_waiters();

        // A dropped sender releases the gate rather than wedging the task.
        let mut gate = self.gate.clone();
        let _ = gate.wait_for(|open| *open).await;

        self.completed.fetch_add(1, Ordering::AcqRel);

        Ok(())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
