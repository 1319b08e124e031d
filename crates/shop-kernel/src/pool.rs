//! # Bounded Worker Pool
//!
//! A fixed set of worker tasks draining a shared job queue. Admission is decided up front by
//! a semaphore of `workers + queue_depth` permits: a caller first reserves a [`Ticket`], and
//! only then commits whatever state the job depends on. When no permit is free the
//! reservation fails immediately with [`PoolError::Overloaded`]; nothing ever blocks
//! waiting for room.
//!
//! The permit travels with the job and is released when the job's future finishes, so
//! `in_flight()` counts queued and running jobs together.

use crate::error::PoolError;
use futures::future::BoxFuture;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, OwnedSemaphorePermit, Semaphore, TryAcquireError};
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

struct Job {
    work: BoxFuture<'static, ()>,
    _permit: OwnedSemaphorePermit,
}

/// A bounded pool of async workers.
pub struct WorkerPool {
    name: Arc<str>,
    capacity: usize,
    admission: Arc<Semaphore>,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// An admitted slot in a [`WorkerPool`].
///
/// Dropping a ticket without submitting returns its slot to the pool.
#[must_use = "a ticket holds a pool slot until it is submitted or dropped"]
pub struct Ticket {
    pool: Arc<str>,
    permit: OwnedSemaphorePermit,
    sender: mpsc::Sender<Job>,
}

impl WorkerPool {
    /// Spawns `workers` worker tasks. Must be called inside a Tokio runtime.
    pub fn new(name: impl Into<String>, workers: usize, queue_depth: usize) -> Self {
        let name: Arc<str> = Arc::from(name.into());
        let workers = workers.max(1);
        let capacity = workers + queue_depth;
        let (sender, receiver) = mpsc::channel::<Job>(capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let handles = (0..workers)
            .map(|worker| {
                let receiver = Arc::clone(&receiver);
                let pool = Arc::clone(&name);
                tokio::spawn(async move {
                    loop {
                        let next = { receiver.lock().await.recv().await };
                        let Some(job) = next else { break };
                        if AssertUnwindSafe(job.work).catch_unwind().await.is_err() {
                            error!(pool = %pool, worker, "Job panicked");
                        }
                    }
                    debug!(pool = %pool, worker, "Worker stopped");
                })
            })
            .collect();

        info!(pool = %name, workers, queue_depth, "Worker pool started");
        Self {
            name,
            capacity,
            admission: Arc::new(Semaphore::new(capacity)),
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Total jobs the pool admits at once (workers plus queue depth).
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Jobs admitted and not yet finished, queued or running.
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.admission.available_permits())
    }

    /// Reserves a slot without blocking.
    pub fn try_reserve(&self) -> Result<Ticket, PoolError> {
        let sender = self
            .sender
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
            .ok_or_else(|| self.closed())?;
        let permit = Arc::clone(&self.admission)
            .try_acquire_owned()
            .map_err(|e| match e {
                TryAcquireError::NoPermits => PoolError::Overloaded {
                    pool: self.name.to_string(),
                    capacity: self.capacity,
                },
                TryAcquireError::Closed => self.closed(),
            })?;
        Ok(Ticket {
            pool: Arc::clone(&self.name),
            permit,
            sender,
        })
    }

    /// Reserves a slot and submits `work` into it.
    pub fn try_submit<F>(&self, work: F) -> Result<(), PoolError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        self.try_reserve()?.submit(work)
    }

    /// Stops admitting work, lets queued jobs drain and waits for every worker to exit.
    pub async fn shutdown(&self) {
        self.admission.close();
        let sender = self.sender.lock().ok().and_then(|mut guard| guard.take());
        drop(sender);
        let handles: Vec<_> = self
            .workers
            .lock()
            .map(|mut guard| guard.drain(..).collect())
            .unwrap_or_default();
        for handle in handles {
            let _ = handle.await;
        }
        info!(pool = %self.name, "Worker pool stopped");
    }

    fn closed(&self) -> PoolError {
        PoolError::Closed {
            pool: self.name.to_string(),
        }
    }
}

impl Ticket {
    /// Hands `work` to the pool. The slot is released when `work` completes.
    pub fn submit<F>(self, work: F) -> Result<(), PoolError>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let job = Job {
            work: work.boxed(),
            _permit: self.permit,
        };
        // The channel holds as many jobs as there are permits, so it is never full here.
        self.sender.try_send(job).map_err(|_| PoolError::Closed {
            pool: self.pool.to_string(),
        })
    }
}
