//! Worker pool for CPU-heavy and blocking work
//!
//! Parsing, image decoding, schema validation and external checker processes
//! run on tokio's blocking threads so they never stall the scheduling loop. The
//! pool bounds how many of them run at once.

use crate::{Result, ValidatorError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// A cloneable handle to a bounded set of blocking workers
#[derive(Debug, Clone)]
pub struct WorkerPool {
    permits: Arc<Semaphore>,
    size: usize,
}

impl WorkerPool {
    /// Creates a pool running at most `size` tasks at once (at least one)
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            permits: Arc::new(Semaphore::new(size)),
            size,
        }
    }

    /// Creates a pool sized to the available parallelism of the machine
    pub fn with_default_size() -> Self {
        Self::new(default_pool_size())
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Runs a blocking closure on a worker
    ///
    /// # Errors
    ///
    /// [`ValidatorError::Worker`] if the pool is closed or the closure panics.
    pub async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(|_| ValidatorError::Worker("worker pool is closed".to_string()))?;

        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| ValidatorError::Worker(e.to_string()))
    }

    /// Stops accepting new tasks; running tasks finish normally
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

/// Number of workers used when none is configured
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

/// Runs `f` with a fresh pool that is closed when `f` finishes, on success or error
pub async fn with_pool<F, Fut, T>(size: usize, f: F) -> Result<T>
where
    F: FnOnce(WorkerPool) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let pool = WorkerPool::new(size);
    let result = f(pool.clone()).await;
    pool.close();
    result
}
