//! Cancellable one-shot timers.

use std::future::Future;

use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Owns a spawned timer task. Dropping the handle aborts the task.
#[derive(Debug)]
pub(crate) struct TimerHandle {
    task: Option<JoinHandle<()>>,
}

impl TimerHandle {
    /// Runs `on_fire` once `at` has been reached.
    ///
    /// The deadline is fixed here, before the task is first polled, so a
    /// busy runtime delays the callback but never shifts the deadline.
    pub(crate) fn spawn<F>(at: Instant, on_fire: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let task = tokio::spawn(async move {
            tokio::time::sleep_until(at).await;
            on_fire.await;
        });
        Self { task: Some(task) }
    }

    /// Releases the task without aborting it.
    ///
    /// A timer task that clears its own handle must detach it, otherwise the
    /// drop would abort the task it is running in.
    pub(crate) fn detach(mut self) {
        self.task.take();
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn fires_at_deadline() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let at = Instant::now() + Duration::from_secs(30);
        let _timer = TimerHandle::spawn(at, async move {
            flag.store(true, Ordering::SeqCst);
        });

        tokio::time::sleep(Duration::from_secs(29)).await;
        assert!(!fired.load(Ordering::SeqCst));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn drop_cancels() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let timer = TimerHandle::spawn(Instant::now() + Duration::from_secs(5), async move {
            flag.store(true, Ordering::SeqCst);
        });

        drop(timer);
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(!fired.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn detach_keeps_running() {
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();
        let timer = TimerHandle::spawn(Instant::now() + Duration::from_secs(5), async move {
            flag.store(true, Ordering::SeqCst);
        });

        timer.detach();
        tokio::time::sleep(Duration::from_secs(10)).await;

        assert!(fired.load(Ordering::SeqCst));
    }
}
