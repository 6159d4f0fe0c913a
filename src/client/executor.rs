//! Background execution for asynchronous sends.
//!
//! A small worker pool, spawned lazily on the first asynchronous send so
//! purely synchronous users never pay for the threads. Jobs are plain
//! closures delivered over a crossbeam channel.

use std::sync::OnceLock;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use crate::error;
use crate::http::response::Response;

type Job = Box<dyn FnOnce() + Send + 'static>;

pub struct Executor {
    workers: usize,
    pool: OnceLock<Sender<Job>>,
}

impl Executor {
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Executor {
            workers: workers.max(1),
            pool: OnceLock::new(),
        }
    }

    /// Number of workers used when none is configured.
    #[must_use]
    pub fn default_workers() -> usize {
        thread::available_parallelism().map_or(2, |n| n.get().min(8))
    }

    /// Queues a job, spawning the workers on first use.
    pub fn submit(&self, job: Job) {
        let tx = self.pool.get_or_init(|| self.spawn_workers());
        // Send only fails when every worker has exited, which cannot
        // happen while the sender is alive.
        let _ = tx.send(job);
    }

    fn spawn_workers(&self) -> Sender<Job> {
        let (tx, rx) = unbounded::<Job>();
        for id in 0..self.workers {
            let rx = rx.clone();
            thread::Builder::new()
                .name(format!("paloma-worker-{id}"))
                .spawn(move || {
                    while let Ok(job) = rx.recv() {
                        job();
                    }
                })
                .ok();
        }
        tracing::debug!(target: "paloma::client", workers = self.workers, "worker pool started");
        tx
    }
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("workers", &self.workers)
            .field("started", &self.pool.get().is_some())
            .finish()
    }
}

/// Completion handle for an asynchronous send.
#[must_use = "a pending response does nothing until waited on"]
pub struct PendingResponse {
    rx: Receiver<crate::Result<Response>>,
}

impl PendingResponse {
    pub(crate) fn channel() -> (Sender<crate::Result<Response>>, PendingResponse) {
        let (tx, rx) = crossbeam_channel::bounded(1);
        (tx, PendingResponse { rx })
    }

    /// True once the outcome has been delivered.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        !self.rx.is_empty()
    }

    /// Blocks until the exchange completes.
    pub fn wait(self) -> crate::Result<Response> {
        self.rx
            .recv()
            .unwrap_or_else(|_| Err(error::io("worker dropped before delivering a response")))
    }

    /// Non-blocking poll; `None` while the exchange is still in flight.
    pub fn try_wait(&self) -> Option<crate::Result<Response>> {
        self.rx.try_recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn jobs_run_on_worker_threads() {
        let executor = Executor::new(2);
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = crossbeam_channel::bounded(8);
        for _ in 0..8 {
            let counter = Arc::clone(&counter);
            let tx = tx.clone();
            executor.submit(Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                let _ = tx.send(());
            }));
        }
        for _ in 0..8 {
            rx.recv_timeout(Duration::from_secs(5)).expect("job ran");
        }
        assert_eq!(counter.load(Ordering::SeqCst), 8);
    }

    #[test]
    fn pending_response_reports_readiness() {
        let (tx, pending) = PendingResponse::channel();
        assert!(!pending.is_ready());
        assert!(pending.try_wait().is_none());

        tx.send(Err(error::io("synthetic"))).expect("send");
        assert!(pending.is_ready());
        assert!(pending.wait().is_err());
    }
}
