//! Bounded execution of concurrent requests.

use std::future::Future;
use std::num::NonZeroUsize;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

/// Limits how many requests execute at once across a transport.
///
/// Requests beyond the limit wait for a permit; none are rejected while the
/// scheduler is open.
#[derive(Debug, Clone)]
pub struct RequestScheduler {
    permits: Arc<Semaphore>,
    limit: NonZeroUsize,
}

impl RequestScheduler {
    /// Creates a scheduler admitting `limit` concurrent requests.
    #[must_use]
    pub fn new(limit: NonZeroUsize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit.get())),
            limit,
        }
    }

    /// Creates a scheduler from a plain count, treating zero as one.
    #[must_use]
    pub fn with_limit(limit: usize) -> Self {
        Self::new(NonZeroUsize::new(limit).unwrap_or(NonZeroUsize::MIN))
    }

    /// Configured concurrency limit.
    #[must_use]
    pub const fn limit(&self) -> NonZeroUsize {
        self.limit
    }

    /// Number of requests that could start right now.
    #[must_use]
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Stops admitting requests. Requests already running are unaffected.
    pub fn close(&self) {
        self.permits.close();
    }

    /// Runs `future` on the current task once a permit is available.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the scheduler closes before a
    /// permit is granted.
    pub async fn run<F, T>(&self, future: F) -> SchedulerResult<T>
    where
        F: Future<Output = T>,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|_| SchedulerError::Closed)?;
        Ok(future.await)
    }

    /// Waits for a permit, then spawns `future` onto the runtime holding it.
    ///
    /// Callers stop making progress while the limit is reached, so work
    /// waiting to be admitted stays with the caller.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the scheduler is or becomes
    /// closed before a permit is granted.
    pub async fn spawn<F, T>(&self, future: F) -> SchedulerResult<JoinHandle<T>>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits)
            .acquire_owned()
            .await
            .map_err(|_| SchedulerError::Closed)?;
        Ok(tokio::spawn(async move {
            let output = future.await;
            drop(permit);
            output
        }))
    }
}

impl Default for RequestScheduler {
    fn default() -> Self {
        Self::with_limit(32)
    }
}

/// Errors produced by the scheduler.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// Scheduler is closed and will not accept new requests.
    #[error("scheduler closed")]
    Closed,
}

/// Result alias for scheduler operations.
pub type SchedulerResult<T> = Result<T, SchedulerError>;
