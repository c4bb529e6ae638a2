use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Completion handle returned by task submission.
///
/// The handle's whole contract is `cancel` / `is_canceled` / `is_done`; it
/// carries no value. It observes only the attempt it was created for: when a
/// failed task is rescheduled, the fresh envelope gets fresh internal state
/// and this handle reports done. Callers that need to wait for in-flight work
/// use the flush barrier instead.
#[derive(Debug, Clone)]
pub struct SubmitHandle {
    state: Arc<HandleState>,
}

#[derive(Debug, Default)]
pub(crate) struct HandleState {
    canceled: AtomicBool,
    done: AtomicBool,
}

impl SubmitHandle {
    pub(crate) fn new() -> Self {
        Self {
            state: Arc::new(HandleState::default()),
        }
    }

    /// Creates a handle that is already canceled and done.
    ///
    /// Returned for submissions the executor refuses: soft-cap rejections and
    /// submissions after shutdown.
    pub(crate) fn rejected() -> Self {
        let state = HandleState::default();
        state.canceled.store(true, Ordering::Release);
        state.done.store(true, Ordering::Release);

        Self {
            state: Arc::new(state),
        }
    }

    /// Requests cancellation of the pending attempt.
    ///
    /// Returns `false` if the attempt already completed. Cancellation cannot
    /// revoke an in-progress run, but it prevents a not-yet-started run and
    /// suppresses any retry of a failed one.
    pub fn cancel(&self) -> bool {
        if self.state.done.load(Ordering::Acquire) {
            return false;
        }

        self.state.canceled.store(true, Ordering::Release);
        true
    }

    /// Returns whether cancellation was requested.
    pub fn is_canceled(&self) -> bool {
        self.state.canceled.load(Ordering::Acquire)
    }

    /// Returns whether the attempt reached a terminal state.
    pub fn is_done(&self) -> bool {
        self.state.done.load(Ordering::Acquire)
    }

    pub(crate) fn mark_done(&self) {
        self.state.done.store(true, Ordering::Release);
    }

    pub(crate) fn mark_canceled(&self) {
        self.state.canceled.store(true, Ordering::Release);
        self.state.done.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_handle_is_canceled_and_done() {
        let handle = SubmitHandle::rejected();
        assert!(handle.is_canceled());
        assert!(handle.is_done());
        assert!(!handle.cancel());
    }

    #[test]
    fn cancel_before_completion_succeeds() {
        let handle = SubmitHandle::new();
        assert!(!handle.is_canceled());
        assert!(handle.cancel());
        assert!(handle.is_canceled());
        assert!(!handle.is_done());
    }

    #[test]
    fn cancel_after_completion_fails() {
        let handle = SubmitHandle::new();
        handle.mark_done();
        assert!(!handle.cancel());
        assert!(!handle.is_canceled());
    }
}
