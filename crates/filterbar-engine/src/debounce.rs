//! Single-slot trailing-edge debounce timer.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Owns at most one pending timer task. Arming aborts the previous task,
/// and dropping the timer aborts whatever is still pending.
#[derive(Debug, Default)]
pub struct DebounceTimer {
    handle: Option<JoinHandle<()>>,
}

impl DebounceTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `fire` after `delay` unless the timer is re-armed or cancelled
    /// first. Must be called from within a tokio runtime.
    pub fn arm<F>(&mut self, delay: Duration, fire: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire.await;
        }));
    }

    /// Abort the pending task. Returns whether one was still pending.
    pub fn cancel(&mut self) -> bool {
        match self.handle.take() {
            Some(handle) => {
                let pending = !handle.is_finished();
                handle.abort();
                pending
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }
}

impl Drop for DebounceTimer {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn rearming_keeps_only_the_last_fire() {
        let fired = Arc::new(AtomicUsize::new(0));
        let mut timer = DebounceTimer::new();

        for value in 1..=3 {
            let fired = Arc::clone(&fired);
            timer.arm(Duration::from_millis(250), async move {
                fired.store(value, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        assert!(timer.is_pending());
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 3);
        assert!(!timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn dropping_the_timer_cancels_it() {
        let fired = Arc::new(AtomicUsize::new(0));
        {
            let mut timer = DebounceTimer::new();
            let fired = Arc::clone(&fired);
            timer.arm(Duration::from_millis(250), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
        }

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_reports_pending_state() {
        let mut timer = DebounceTimer::new();
        assert!(!timer.cancel());

        timer.arm(Duration::from_millis(250), async {});
        assert!(timer.cancel());
        assert!(!timer.is_pending());
    }
}
