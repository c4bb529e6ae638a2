use std::cmp::Ordering as CmpOrdering;
use std::collections::BinaryHeap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;
use tokio::time::Instant;

use crate::executor::envelope::TaskEnvelope;

/// Delay-ordered queue of envelopes plus the two admission counters.
///
/// `queued` counts envelopes accepted but not yet picked up by a worker;
/// `running` counts envelopes between pickup and completion. The admission
/// check over their sum is advisory: it does not reserve a slot, so a
/// transient overshoot of one slot per concurrently submitting thread is
/// possible, and the cap is a soft one.
#[derive(Debug)]
pub(crate) struct DispatchQueue {
    heap: Mutex<BinaryHeap<Scheduled>>,
    work_notify: Notify,
    queued: AtomicUsize,
    running: AtomicUsize,
}

impl DispatchQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            work_notify: Notify::new(),
            queued: AtomicUsize::new(0),
            running: AtomicUsize::new(0),
        }
    }

    /// Returns whether a new submission fits under the soft cap.
    pub fn try_admit(&self, max_queue_size: usize) -> bool {
        self.queued.load(Ordering::Acquire) + self.running.load(Ordering::Acquire) < max_queue_size
    }

    /// Enqueues an envelope and wakes one worker.
    pub fn schedule(&self, envelope: TaskEnvelope) {
        self.queued.fetch_add(1, Ordering::AcqRel);
        self.lock_heap().push(Scheduled(envelope));
        self.work_notify.notify_one();
    }

    /// Returns the deadline of the earliest scheduled envelope.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.lock_heap().peek().map(|entry| entry.0.deadline())
    }

    /// Pops the earliest envelope if it is due.
    ///
    /// Popping moves the envelope from queued to running in one step, so the
    /// counter sum observed by admission never dips mid-transition.
    pub fn pop_due(&self, now: Instant) -> Option<TaskEnvelope> {
        let mut heap = self.lock_heap();
        if heap.peek().is_none_or(|entry| entry.0.deadline() > now) {
            return None;
        }

        let envelope = heap.pop().map(|entry| entry.0);
        self.running.fetch_add(1, Ordering::AcqRel);
        self.queued.fetch_sub(1, Ordering::AcqRel);

        envelope
    }

    /// Records the completion of a run.
    pub fn finish_run(&self) {
        self.running.fetch_sub(1, Ordering::AcqRel);
    }

    /// Removes and returns every queued envelope.
    pub fn drain(&self) -> Vec<TaskEnvelope> {
        let mut heap = self.lock_heap();
        let drained: Vec<_> = std::mem::take(&mut *heap)
            .into_iter()
            .map(|entry| entry.0)
            .collect();
        self.queued.fetch_sub(drained.len(), Ordering::AcqRel);

        drained
    }

    /// Completes when new work may be available.
    pub async fn work_available(&self) {
        self.work_notify.notified().await;
    }

    pub fn is_queue_empty(&self) -> bool {
        self.queued.load(Ordering::Acquire) == 0
    }

    pub fn queued(&self) -> usize {
        self.queued.load(Ordering::Acquire)
    }

    pub fn running(&self) -> usize {
        self.running.load(Ordering::Acquire)
    }

    fn lock_heap(&self) -> std::sync::MutexGuard<'_, BinaryHeap<Scheduled>> {
        self.heap
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Heap entry ordering envelopes by deadline, earliest first.
#[derive(Debug)]
struct Scheduled(TaskEnvelope);

impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.0.deadline() == other.0.deadline()
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // BinaryHeap is a max-heap; invert so the earliest deadline surfaces.
        other.0.deadline().cmp(&self.0.deadline())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::error::OutpostResult;
    use crate::task::Task;

    struct NoopTask;

    #[async_trait]
    impl Task for NoopTask {
        async fn run(&self) -> OutpostResult<()> {
            Ok(())
        }
    }

    fn envelope_due_in(delay: Duration) -> TaskEnvelope {
        let (envelope, _) = TaskEnvelope::first(Arc::new(NoopTask));
        envelope.retry(Instant::now() + delay)
    }

    #[tokio::test]
    async fn admission_counts_queued_plus_running() {
        let queue = DispatchQueue::new();
        assert!(queue.try_admit(2));

        let (envelope, _) = TaskEnvelope::first(Arc::new(NoopTask));
        queue.schedule(envelope);
        assert!(queue.try_admit(2));

        let popped = queue.pop_due(Instant::now()).expect("envelope is due");
        assert_eq!(queue.queued(), 0);
        assert_eq!(queue.running(), 1);
        assert!(queue.try_admit(2));

        let (envelope, _) = TaskEnvelope::first(Arc::new(NoopTask));
        queue.schedule(envelope);
        assert!(!queue.try_admit(2));

        queue.finish_run();
        assert!(queue.try_admit(2));
        drop(popped);
    }

    #[tokio::test]
    async fn pops_in_deadline_order() {
        let queue = DispatchQueue::new();
        queue.schedule(envelope_due_in(Duration::from_millis(30)));
        queue.schedule(envelope_due_in(Duration::from_millis(10)));
        queue.schedule(envelope_due_in(Duration::from_millis(20)));

        let far_future = Instant::now() + Duration::from_secs(1);
        let first = queue.pop_due(far_future).unwrap();
        let second = queue.pop_due(far_future).unwrap();
        let third = queue.pop_due(far_future).unwrap();

        assert!(first.deadline() <= second.deadline());
        assert!(second.deadline() <= third.deadline());
    }

    #[tokio::test]
    async fn undue_envelopes_are_not_popped() {
        let queue = DispatchQueue::new();
        queue.schedule(envelope_due_in(Duration::from_secs(60)));

        assert!(queue.pop_due(Instant::now()).is_none());
        assert_eq!(queue.queued(), 1);
        assert_eq!(queue.running(), 0);
    }

    #[tokio::test]
    async fn drain_empties_the_queue() {
        let queue = DispatchQueue::new();
        queue.schedule(envelope_due_in(Duration::from_secs(10)));
        queue.schedule(envelope_due_in(Duration::from_secs(20)));

        let drained = queue.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(queue.queued(), 0);
        assert!(queue.is_queue_empty());
    }
}
