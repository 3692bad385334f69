/// Default capacity of the job queue.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Default prefix for worker thread names.
pub const DEFAULT_THREAD_NAME: &str = "boundpool-worker";

/// Construction parameters for a [`Pool`].
///
/// The defaults size the worker set to the number of logical CPUs, which is
/// usually the best throughput for CPU-bound jobs, and give the queue enough
/// room to absorb ordinary bursts.
///
/// ```
/// use boundpool::{Pool, PoolConfig};
///
/// let config = PoolConfig::default()
///     .with_max_workers(4)
///     .with_queue_capacity(64)
///     .with_thread_name("ingest");
///
/// let pool = Pool::with_config(config).unwrap();
/// assert_eq!(pool.max_workers(), 4);
/// assert_eq!(pool.queue_capacity(), 64);
/// pool.release();
/// ```
///
/// [`Pool`]: crate::Pool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of worker threads. Must be at least 1.
    pub max_workers: usize,
    /// Number of jobs the queue holds before [`Pool::submit`] blocks. Zero
    /// makes every submission a direct hand-off to an idle worker.
    ///
    /// [`Pool::submit`]: crate::Pool::submit
    pub queue_capacity: usize,
    /// Worker `i` is named `{thread_name}-{i}`.
    pub thread_name: String,
    /// Stack size for worker threads; `None` keeps the platform default.
    pub stack_size: Option<usize>,
}

impl PoolConfig {
    pub fn new(max_workers: usize, queue_capacity: usize) -> Self {
        Self {
            max_workers,
            queue_capacity,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    #[must_use]
    pub fn with_queue_capacity(mut self, queue_capacity: usize) -> Self {
        self.queue_capacity = queue_capacity;
        self
    }

    #[must_use]
    pub fn with_thread_name(mut self, thread_name: impl Into<String>) -> Self {
        self.thread_name = thread_name.into();
        self
    }

    #[must_use]
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_workers: num_cpus::get(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            thread_name: DEFAULT_THREAD_NAME.to_owned(),
            stack_size: None,
        }
    }
}
