use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

/// An atomic countdown that can be awaited until it reaches zero.
///
/// [`Countdown`] is the drain primitive behind flush: it is initialized with
/// the number of in-flight runs observed by the drainer, each completing run
/// records one completion, and the drainer awaits zero. Completions beyond
/// the initial count are ignored rather than underflowing, so work admitted
/// after the snapshot cannot corrupt the counter.
#[derive(Debug)]
pub struct Countdown {
    remaining: AtomicUsize,
    notify: Notify,
}

impl Countdown {
    /// Creates a countdown that completes after `count` completions.
    ///
    /// A zero `count` is already complete.
    pub fn new(count: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(count),
            notify: Notify::new(),
        }
    }

    /// Records one completion.
    ///
    /// Saturates at zero. Wakes all waiters when the counter reaches zero.
    pub fn count_down(&self) {
        let mut current = self.remaining.load(Ordering::Acquire);
        loop {
            if current == 0 {
                return;
            }

            match self.remaining.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    if current == 1 {
                        self.notify.notify_waiters();
                    }
                    return;
                }
                Err(observed) => current = observed,
            }
        }
    }

    /// Returns the number of completions still outstanding.
    pub fn remaining(&self) -> usize {
        self.remaining.load(Ordering::Acquire)
    }

    /// Waits until the counter reaches zero.
    ///
    /// Returns immediately if the countdown is already complete.
    pub async fn wait(&self) {
        loop {
            if self.remaining.load(Ordering::Acquire) == 0 {
                return;
            }

            let notified = self.notify.notified();

            // The counter may have hit zero between the check above and the
            // waiter registration, in which case the wakeup already happened.
            if self.remaining.load(Ordering::Acquire) == 0 {
                return;
            }

            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn zero_countdown_is_already_complete() {
        let countdown = Countdown::new(0);
        countdown.wait().await;
        assert_eq!(countdown.remaining(), 0);
    }

    #[tokio::test]
    async fn wait_resolves_after_all_completions() {
        let countdown = Arc::new(Countdown::new(3));

        let waiter = {
            let countdown = countdown.clone();
            tokio::spawn(async move { countdown.wait().await })
        };

        countdown.count_down();
        countdown.count_down();
        assert!(!waiter.is_finished());

        countdown.count_down();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve")
            .unwrap();
    }

    #[tokio::test]
    async fn excess_completions_saturate_at_zero() {
        let countdown = Countdown::new(1);
        countdown.count_down();
        countdown.count_down();
        countdown.count_down();
        assert_eq!(countdown.remaining(), 0);
        countdown.wait().await;
    }
}
