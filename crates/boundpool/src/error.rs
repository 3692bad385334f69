//! Error types for pool construction and job submission.
//!
//! Two families of failure are surfaced to callers:
//!
//! - [`Error`]: the pool could not be constructed. Raised synchronously by
//!   [`Pool::new`] / [`Pool::with_config`] before the pool is handed out.
//! - [`SubmitError`]: a job was not accepted into the queue. The rejected job
//!   is carried back inside the error so it is never lost silently.
//!
//! Panics raised *inside* a job are not errors at this level. They are
//! contained by the worker that ran the job and only show up in
//! [`PoolStats::panicked`].
//!
//! [`Pool::new`]: crate::Pool::new
//! [`Pool::with_config`]: crate::Pool::with_config
//! [`PoolStats::panicked`]: crate::PoolStats::panicked

use crate::job::BoxedJob;
use core::fmt;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Construction errors returned by [`Pool::with_config`].
///
/// [`Pool::with_config`]: crate::Pool::with_config
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// The pool was asked to run with zero workers.
    ///
    /// A pool without workers would accept jobs that never run, so this is
    /// rejected before anything is spawned.
    #[error("max_workers must be at least 1 (got {max_workers})")]
    InvalidWorkerCount { max_workers: usize },

    /// The OS refused to spawn a worker thread.
    ///
    /// Workers spawned before the failure have already been shut down and
    /// joined when this is returned.
    #[error("failed to spawn worker {worker_id}: {source}")]
    Spawn {
        worker_id: usize,
        #[source]
        source: std::io::Error,
    },
}

/// A job that the pool refused to enqueue.
///
/// Every variant owns the rejected job. Use [`SubmitError::into_job`] to take
/// it back and retry, run it inline, or drop it deliberately.
#[derive(thiserror::Error)]
pub enum SubmitError {
    /// [`Pool::release`] has been called; the pool no longer accepts work.
    ///
    /// [`Pool::release`]: crate::Pool::release
    #[error("pool has been released")]
    Released(BoxedJob),

    /// The queue was at capacity (returned by [`Pool::try_submit`] only).
    ///
    /// [`Pool::try_submit`]: crate::Pool::try_submit
    #[error("job queue is full")]
    Full(BoxedJob),

    /// No queue slot freed up in time (returned by [`Pool::submit_timeout`]
    /// only).
    ///
    /// [`Pool::submit_timeout`]: crate::Pool::submit_timeout
    #[error("timed out waiting for a free queue slot")]
    Timeout(BoxedJob),
}

impl SubmitError {
    /// Returns the job that was rejected.
    pub fn into_job(self) -> BoxedJob {
        match self {
            Self::Released(job) | Self::Full(job) | Self::Timeout(job) => job,
        }
    }

    pub const fn is_released(&self) -> bool {
        matches!(self, Self::Released(_))
    }

    pub const fn is_full(&self) -> bool {
        matches!(self, Self::Full(_))
    }

    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

// Jobs are opaque, so only the variant is printed.
impl fmt::Debug for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let variant = match self {
            Self::Released(_) => "Released",
            Self::Full(_) => "Full",
            Self::Timeout(_) => "Timeout",
        };
        f.debug_tuple(variant).field(&"<job>").finish()
    }
}
