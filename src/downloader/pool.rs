//! Bounded worker pool for download tasks.
//!
//! Every submitted future is spawned immediately but waits on a shared
//! semaphore before it starts, so at most `limit` run at once. Results are
//! handed back in completion order; tasks that panic are counted rather
//! than returned, so callers can account for them. Dropping the pool aborts whatever is
//! still outstanding, which keeps a pool's tasks scoped to the call that
//! created it.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Fixed-size pool of concurrently running tasks producing `T`
pub struct WorkerPool<T> {
    tasks: JoinSet<T>,
    permits: Arc<Semaphore>,
    lost: usize,
}

impl<T: Send + 'static> WorkerPool<T> {
    /// Create a pool that runs at most `limit` tasks at a time (minimum 1)
    pub fn new(limit: usize) -> Self {
        Self {
            tasks: JoinSet::new(),
            permits: Arc::new(Semaphore::new(limit.max(1))),
            lost: 0,
        }
    }

    /// Submit a task; it starts once a slot is free
    pub fn spawn<F>(&mut self, task: F)
    where
        F: Future<Output = T> + Send + 'static,
    {
        let permits = Arc::clone(&self.permits);
        self.tasks.spawn(async move {
            // The semaphore is never closed, so acquiring only waits for a slot.
            let _permit = permits.acquire_owned().await.ok();
            task.await
        });
    }

    /// Number of tasks not yet collected
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether every task has been collected
    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Wait for the next task to finish; `None` once all are collected
    ///
    /// Tasks that panicked or were cancelled are logged, counted in
    /// [`WorkerPool::lost`] and skipped.
    pub async fn next_completed(&mut self) -> Option<T> {
        loop {
            match self.tasks.join_next().await? {
                Ok(value) => return Some(value),
                Err(e) if e.is_panic() => {
                    self.lost += 1;
                    tracing::error!(error = %e, "Worker task panicked");
                }
                Err(e) => {
                    self.lost += 1;
                    tracing::debug!(error = %e, "Worker task cancelled");
                }
            }
        }
    }

    /// Number of collected tasks that ended without producing a result
    pub fn lost(&self) -> usize {
        self.lost
    }

    /// Collect every remaining result in completion order
    #[cfg(test)]
    pub async fn drain(mut self) -> Vec<T> {
        let mut results = Vec::with_capacity(self.tasks.len());
        while let Some(value) = self.next_completed().await {
            results.push(value);
        }
        results
    }
}
