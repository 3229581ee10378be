//! The two throttled work lanes that gate all upstream traffic.
//!
//! A lane owns a FIFO of submitted jobs and a worker task that dispatches
//! them. The search lane runs strictly sequentially with a minimum interval
//! between starts; the download lane runs a bounded number of jobs
//! concurrently with a minimum stagger between any two starts. Transient
//! failures are retried by re-inserting the job at the *front* of its own
//! queue, invisible to the caller except as latency.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::{oneshot, Mutex, Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::catalog::CatalogError;
use crate::metrics;

/// A lane job: re-invocable so the lane can retry it.
pub type JobFn<T> = Box<dyn Fn() -> BoxFuture<'static, Result<T, CatalogError>> + Send + Sync>;

struct QueuedJob<T> {
    run: JobFn<T>,
    reply: oneshot::Sender<Result<T, CatalogError>>,
    attempts: u32,
}

struct LaneShared<T> {
    name: &'static str,
    queue: Mutex<VecDeque<QueuedJob<T>>>,
    notify: Notify,
    retry_limit: u32,
}

impl<T> LaneShared<T> {
    fn new(name: &'static str, retry_limit: u32) -> Self {
        Self {
            name,
            queue: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            retry_limit,
        }
    }

    async fn pop(&self) -> QueuedJob<T> {
        loop {
            if let Some(job) = self.queue.lock().await.pop_front() {
                return job;
            }
            self.notify.notified().await;
        }
    }

    async fn requeue_front(&self, job: QueuedJob<T>) {
        self.queue.lock().await.push_front(job);
        self.notify.notify_one();
    }

    /// Settle a finished attempt: retry transient failures while attempts
    /// remain, otherwise answer the caller.
    async fn settle(&self, job: QueuedJob<T>, result: Result<T, CatalogError>) {
        match result {
            Err(err) if err.is_transient() && job.attempts < self.retry_limit => {
                debug!(
                    lane = self.name,
                    attempt = job.attempts + 1,
                    error = %err,
                    "retrying job"
                );
                metrics::RETRY_ATTEMPTS.inc();
                self.requeue_front(QueuedJob {
                    attempts: job.attempts + 1,
                    ..job
                })
                .await;
            }
            Err(err) if err.is_transient() => {
                metrics::UPSTREAM_REQUESTS
                    .with_label_values(&[self.name, "exhausted"])
                    .inc();
                let _ = job.reply.send(Err(CatalogError::RetriesExhausted {
                    attempts: job.attempts + 1,
                    last: err.to_string(),
                }));
            }
            Err(err) => {
                metrics::UPSTREAM_REQUESTS
                    .with_label_values(&[self.name, "error"])
                    .inc();
                let _ = job.reply.send(Err(err));
            }
            Ok(value) => {
                metrics::UPSTREAM_REQUESTS
                    .with_label_values(&[self.name, "ok"])
                    .inc();
                let _ = job.reply.send(Ok(value));
            }
        }
    }
}

/// One throttled work queue. Dropping the lane aborts its worker; jobs
/// already handed to the network still run to completion.
pub struct Lane<T: Send + 'static> {
    shared: Arc<LaneShared<T>>,
    worker: JoinHandle<()>,
}

impl<T: Send + 'static> Lane<T> {
    /// Strictly sequential lane: a job may not start until `min_interval`
    /// has elapsed since the previous job started.
    pub fn sequential(name: &'static str, min_interval: Duration, retry_limit: u32) -> Self {
        let shared = Arc::new(LaneShared::new(name, retry_limit));
        let worker = tokio::spawn(run_sequential(Arc::clone(&shared), min_interval));
        Self { shared, worker }
    }

    /// Bounded-parallel lane: at most `concurrency` jobs run at once and any
    /// two starts are at least `stagger` apart.
    pub fn staggered(
        name: &'static str,
        concurrency: usize,
        stagger: Duration,
        retry_limit: u32,
    ) -> Self {
        let shared = Arc::new(LaneShared::new(name, retry_limit));
        let worker = tokio::spawn(run_staggered(Arc::clone(&shared), concurrency, stagger));
        Self { shared, worker }
    }

    /// Submit a job and await its outcome. Retries happen inside the lane;
    /// the returned error is already classified.
    pub async fn submit(&self, run: JobFn<T>) -> Result<T, CatalogError> {
        let (reply, outcome) = oneshot::channel();
        self.shared.queue.lock().await.push_back(QueuedJob {
            run,
            reply,
            attempts: 0,
        });
        self.shared.notify.notify_one();
        outcome.await.unwrap_or(Err(CatalogError::Cancelled))
    }

    /// Reject every queued-but-not-started job with a cancellation outcome.
    /// Jobs already dispatched are unaffected and run to completion.
    pub async fn clear(&self) -> usize {
        let drained: Vec<QueuedJob<T>> = {
            let mut queue = self.shared.queue.lock().await;
            queue.drain(..).collect()
        };
        let cleared = drained.len();
        for job in drained {
            let _ = job.reply.send(Err(CatalogError::Cancelled));
        }
        if cleared > 0 {
            metrics::QUEUE_CANCELLED.inc_by(cleared as u64);
            debug!(lane = self.shared.name, cleared, "lane cleared");
        }
        cleared
    }

    #[cfg(test)]
    pub(crate) async fn queued_len(&self) -> usize {
        self.shared.queue.lock().await.len()
    }
}

impl<T: Send + 'static> Drop for Lane<T> {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

async fn run_sequential<T: Send + 'static>(shared: Arc<LaneShared<T>>, min_interval: Duration) {
    let mut last_start: Option<Instant> = None;
    loop {
        let job = shared.pop().await;
        if let Some(at) = last_start {
            tokio::time::sleep_until(at + min_interval).await;
        }
        last_start = Some(Instant::now());
        let result = (job.run)().await;
        shared.settle(job, result).await;
    }
}

async fn run_staggered<T: Send + 'static>(
    shared: Arc<LaneShared<T>>,
    concurrency: usize,
    stagger: Duration,
) {
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut last_start: Option<Instant> = None;
    loop {
        // Take the capacity slot before the job so queued jobs stay
        // clearable until they can actually start.
        let permit = Arc::clone(&permits)
            .acquire_owned()
            .await
            .expect("lane semaphore closed");
        let job = shared.pop().await;
        if let Some(at) = last_start {
            tokio::time::sleep_until(at + stagger).await;
        }
        last_start = Some(Instant::now());

        let shared = Arc::clone(&shared);
        tokio::spawn(async move {
            let _permit = permit;
            let result = (job.run)().await;
            shared.settle(job, result).await;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn ok_job(value: i32) -> JobFn<i32> {
        Box::new(move || Box::pin(async move { Ok(value) }))
    }

    fn counting_job(counter: Arc<AtomicU32>, value: i32) -> JobFn<i32> {
        Box::new(move || {
            let counter = Arc::clone(&counter);
            Box::pin(async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            })
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_preserves_submission_order() {
        let lane = Arc::new(Lane::sequential("search", Duration::from_secs(1), 2));
        let order = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for value in 0..5 {
            let lane = Arc::clone(&lane);
            let order = Arc::clone(&order);
            tasks.push(tokio::spawn(async move {
                let got = lane
                    .submit(Box::new(move || {
                        let order = Arc::clone(&order);
                        Box::pin(async move {
                            order.lock().await.push(value);
                            Ok(value)
                        })
                    }))
                    .await
                    .unwrap();
                assert_eq!(got, value);
            }));
            // Submission order is the queue order.
            tokio::task::yield_now().await;
        }
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(*order.lock().await, vec![0, 1, 2, 3, 4]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_sequential_spaces_starts() {
        let lane = Lane::sequential("search", Duration::from_secs(1), 2);
        let starts = Arc::new(Mutex::new(Vec::new()));

        let submit = || {
            let starts = Arc::clone(&starts);
            lane.submit(Box::new(move || {
                let starts = Arc::clone(&starts);
                Box::pin(async move {
                    starts.lock().await.push(Instant::now());
                    Ok(0)
                })
            }))
        };

        let (a, b, c) = tokio::join!(submit(), submit(), submit());
        a.unwrap();
        b.unwrap();
        c.unwrap();

        let starts = starts.lock().await;
        assert_eq!(starts.len(), 3);
        for pair in starts.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_secs(1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_staggered_caps_concurrency_and_spaces_starts() {
        let lane = Arc::new(Lane::staggered(
            "download",
            3,
            Duration::from_millis(200),
            2,
        ));
        let active = Arc::new(AtomicU32::new(0));
        let peak = Arc::new(AtomicU32::new(0));
        let starts = Arc::new(Mutex::new(Vec::new()));

        let mut tasks = Vec::new();
        for _ in 0..10 {
            let lane = Arc::clone(&lane);
            let active = Arc::clone(&active);
            let peak = Arc::clone(&peak);
            let starts = Arc::clone(&starts);
            tasks.push(tokio::spawn(async move {
                lane.submit(Box::new(move || {
                    let active = Arc::clone(&active);
                    let peak = Arc::clone(&peak);
                    let starts = Arc::clone(&starts);
                    Box::pin(async move {
                        starts.lock().await.push(Instant::now());
                        let now = active.fetch_add(1, Ordering::SeqCst) + 1;
                        peak.fetch_max(now, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_secs(2)).await;
                        active.fetch_sub(1, Ordering::SeqCst);
                        Ok(0)
                    })
                }))
                .await
                .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        assert!(peak.load(Ordering::SeqCst) <= 3, "peak {}", peak.load(Ordering::SeqCst));
        let mut starts = starts.lock().await.clone();
        starts.sort();
        assert_eq!(starts.len(), 10);
        for pair in starts.windows(2) {
            assert!(
                pair[1] - pair[0] >= Duration::from_millis(200),
                "starts too close: {:?}",
                pair[1] - pair[0]
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failures_retry_then_succeed() {
        let lane = Lane::sequential("search", Duration::from_millis(10), 2);
        let attempts = Arc::new(AtomicU32::new(0));

        let attempts_in_job = Arc::clone(&attempts);
        let result = lane
            .submit(Box::new(move || {
                let attempts = Arc::clone(&attempts_in_job);
                Box::pin(async move {
                    if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(CatalogError::Transient("reset".into()))
                    } else {
                        Ok(7)
                    }
                })
            }))
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_after_limit() {
        let lane = Lane::sequential("search", Duration::from_millis(10), 2);
        let attempts = Arc::new(AtomicU32::new(0));

        let attempts_in_job = Arc::clone(&attempts);
        let err = lane
            .submit(Box::new(move || {
                let attempts = Arc::clone(&attempts_in_job);
                Box::pin(async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(CatalogError::Transient("reset".into()))
                })
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::RetriesExhausted { attempts: 3, .. }), "got {err:?}");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_transient_failures_fail_fast() {
        let lane = Lane::sequential("search", Duration::from_millis(10), 2);
        let attempts = Arc::new(AtomicU32::new(0));

        let attempts_in_job = Arc::clone(&attempts);
        let err = lane
            .submit(Box::new(move || {
                let attempts = Arc::clone(&attempts_in_job);
                Box::pin(async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<i32, _>(CatalogError::Auth)
                })
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Auth));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_reenters_at_front() {
        let lane = Arc::new(Lane::sequential("search", Duration::from_millis(10), 2));
        let order = Arc::new(Mutex::new(Vec::new()));
        let failed_once = Arc::new(AtomicU32::new(0));

        let mut tasks = Vec::new();
        for label in ["flaky", "second"] {
            let lane = Arc::clone(&lane);
            let order = Arc::clone(&order);
            let failed_once = Arc::clone(&failed_once);
            tasks.push(tokio::spawn(async move {
                lane.submit(Box::new(move || {
                    let order = Arc::clone(&order);
                    let failed_once = Arc::clone(&failed_once);
                    Box::pin(async move {
                        if label == "flaky"
                            && failed_once.fetch_add(1, Ordering::SeqCst) == 0
                        {
                            return Err(CatalogError::Transient("reset".into()));
                        }
                        order.lock().await.push(label);
                        Ok(0)
                    })
                }))
                .await
                .unwrap();
            }));
            tokio::task::yield_now().await;
        }
        for task in tasks {
            task.await.unwrap();
        }
        // The retried job completes before the one queued behind it.
        assert_eq!(*order.lock().await, vec!["flaky", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_rejects_queued_keeps_executing() {
        let lane = Arc::new(Lane::sequential("search", Duration::from_secs(1), 2));
        let release = Arc::new(Notify::new());

        // One job that blocks until released.
        let running = {
            let lane = Arc::clone(&lane);
            let release = Arc::clone(&release);
            tokio::spawn(async move {
                lane.submit(Box::new(move || {
                    let release = Arc::clone(&release);
                    Box::pin(async move {
                        release.notified().await;
                        Ok(1)
                    })
                }))
                .await
            })
        };
        tokio::task::yield_now().await;

        // Three more stack up behind it.
        let queued: Vec<_> = (0..3)
            .map(|_| {
                let lane = Arc::clone(&lane);
                tokio::spawn(async move { lane.submit(ok_job(2)).await })
            })
            .collect();
        tokio::task::yield_now().await;
        assert_eq!(lane.queued_len().await, 3);

        assert_eq!(lane.clear().await, 3);
        for task in queued {
            let outcome = task.await.unwrap();
            assert!(matches!(outcome, Err(CatalogError::Cancelled)));
        }

        // The executing job is unaffected.
        release.notify_one();
        assert_eq!(running.await.unwrap().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_lanes_drain_all_submissions() {
        let lane = Arc::new(Lane::staggered("download", 3, Duration::from_millis(200), 2));
        let completed = Arc::new(AtomicU32::new(0));
        let tasks: Vec<_> = (0..10)
            .map(|i| {
                let lane = Arc::clone(&lane);
                let completed = Arc::clone(&completed);
                tokio::spawn(async move {
                    lane.submit(counting_job(completed, i)).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }
        assert_eq!(completed.load(Ordering::SeqCst), 10);
    }
}
