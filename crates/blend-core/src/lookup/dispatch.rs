use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep_until, Instant};
use tracing::trace;

/// Serialized gate that spaces outbound calls at least `min_interval` apart.
///
/// Callers pass the gate in submission order (the lock is FIFO-fair). Only the
/// dispatch is serialized: the task itself runs after the gate is released, so
/// a slow or failing call never holds up the ones queued behind it.
#[derive(Debug)]
pub struct DispatchQueue {
    min_interval: Duration,
    last_dispatch: Mutex<Option<Instant>>,
    dispatched: AtomicU64,
}

impl DispatchQueue {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_dispatch: Mutex::new(None),
            dispatched: AtomicU64::new(0),
        }
    }

    /// Interval of `ceil(1000 / max_calls_per_second)` milliseconds.
    pub fn per_second(max_calls_per_second: u32) -> Self {
        let calls = u64::from(max_calls_per_second.max(1));
        Self::new(Duration::from_millis((1000 + calls - 1) / calls))
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of calls released so far.
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    /// Wait for this caller's turn and record the dispatch instant.
    pub async fn acquire(&self) {
        let mut last = self.last_dispatch.lock().await;
        if let Some(previous) = *last {
            let ready_at = previous + self.min_interval;
            let wait = ready_at.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                trace!(wait_ms = wait.as_millis() as u64, "Throttling dispatch");
                sleep_until(ready_at).await;
            }
        }
        *last = Some(Instant::now());
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    /// Run `task` once the gate lets this caller through.
    pub async fn run<F, T>(&self, task: F) -> T
    where
        F: Future<Output = T>,
    {
        self.acquire().await;
        task.await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::future::join_all;
    use std::sync::Arc;

    #[test]
    fn test_interval_from_rate() {
        assert_eq!(DispatchQueue::per_second(40).min_interval(), Duration::from_millis(25));
        assert_eq!(DispatchQueue::per_second(3).min_interval(), Duration::from_millis(334));
        assert_eq!(DispatchQueue::per_second(0).min_interval(), Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dispatches_are_spaced() {
        let queue = Arc::new(DispatchQueue::per_second(40));
        let start = Instant::now();

        let stamps = join_all((0..10).map(|_| {
            let queue = queue.clone();
            async move { queue.run(async { Instant::now() }).await }
        }))
        .await;

        let first = stamps.iter().min().copied().unwrap();
        let last = stamps.iter().max().copied().unwrap();
        assert_eq!(first, start);
        assert!(last - first >= Duration::from_millis(25) * 9);
        assert_eq!(queue.dispatched(), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_submission_order_preserved() {
        let queue = DispatchQueue::per_second(10);
        let order = Mutex::new(Vec::new());

        join_all((0..5).map(|i| {
            let queue = &queue;
            let order = &order;
            async move {
                queue.run(async { order.lock().await.push(i) }).await;
            }
        }))
        .await;

        assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_does_not_stall_queue() {
        let queue = DispatchQueue::per_second(40);

        let failed: Result<(), &str> = queue.run(async { Err("boom") }).await;
        assert!(failed.is_err());

        let ok: Result<u32, &str> = queue.run(async { Ok(7) }).await;
        assert_eq!(ok, Ok(7));
        assert_eq!(queue.dispatched(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_wait_after_idle() {
        let queue = DispatchQueue::per_second(1);
        queue.acquire().await;
        tokio::time::advance(Duration::from_secs(5)).await;

        let before = Instant::now();
        queue.acquire().await;
        assert_eq!(Instant::now(), before);
    }
}
