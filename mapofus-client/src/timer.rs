use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Single-slot delayed task: `restart` supersedes whatever was waiting,
/// `cancel` drops it. Only the wait is cancellable; once the delay elapses
/// the task runs to completion.
#[derive(Default)]
pub struct CancellableTimer {
    pending: Mutex<Option<CancellationToken>>,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restart<F>(&self, delay: Duration, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = CancellationToken::new();
        if let Some(previous) = self.pending.lock().replace(token.clone()) {
            previous.cancel();
        }

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            task.await;
        });
    }

    pub fn cancel(&self) {
        if let Some(token) = self.pending.lock().take() {
            token.cancel();
        }
    }
}

impl Drop for CancellableTimer {
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
    async fn test_restart_supersedes_pending_task() {
        let timer = CancellableTimer::new();
        let fired = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let fired = fired.clone();
            timer.restart(Duration::from_millis(100), async move {
                fired.fetch_add(1, Ordering::SeqCst);
            });
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_and_drop() {
        let fired = Arc::new(AtomicUsize::new(0));

        let timer = CancellableTimer::new();
        let f = fired.clone();
        timer.restart(Duration::from_millis(100), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        timer.cancel();

        let dropped = CancellableTimer::new();
        let f = fired.clone();
        dropped.restart(Duration::from_millis(100), async move {
            f.fetch_add(1, Ordering::SeqCst);
        });
        drop(dropped);

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }
}
