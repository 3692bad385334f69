//! The bounded worker pool.
//!
//! A [`Pool`] owns a fixed set of worker threads and a single bounded queue
//! that every worker pulls from. Producers call [`Pool::submit`] from any
//! number of threads; once the queue is at capacity they block until a worker
//! frees a slot. [`Pool::release`] closes intake, lets the workers drain
//! everything already accepted, and joins them before returning.
//!
//! The queue is a multi-producer, multi-consumer [`crossbeam_channel`]
//! bounded channel. Each job sent into it is received by exactly one worker,
//! and a zero capacity turns it into a rendezvous hand-off.

mod worker;

use crate::{
    config::PoolConfig,
    error::{Error, Result, SubmitError},
    job::{BoxedJob, Job},
    mutex::{Mutex, lock},
    stats::{Counters, PoolStats},
};
use core::time::Duration;
use crossbeam_channel::{Receiver, SendTimeoutError, Sender, TrySendError};
use std::{
    sync::Arc,
    thread::{self, JoinHandle},
};
use worker::{on_worker_of, worker_loop};

/// A fixed-size set of worker threads draining a bounded job queue.
///
/// All workers are spawned by the constructor and live until [`release`] (or
/// drop). The pool is `Send + Sync`; share it between producers with an
/// [`Arc`] or by reference from scoped threads.
///
/// ## Guarantees
///
/// - At most [`max_workers`] jobs run at the same time.
/// - At most [`queue_capacity`] jobs wait in the queue; further submissions
///   block (or are refused by [`try_submit`] / [`submit_timeout`]).
/// - Every accepted job runs exactly once, including jobs still queued when
///   [`release`] is called.
/// - A panicking job is contained by its worker and does not affect other
///   jobs.
/// - When [`release`] returns, every worker thread has exited.
///
/// ## Not handled
///
/// A job that never returns pins its worker forever, and [`release`] will
/// wait for it forever. Jobs that can hang must bound themselves.
///
/// # Example
///
/// ```
/// use boundpool::Pool;
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
///
/// let pool = Pool::new(4, 16).unwrap();
/// let hits = Arc::new(AtomicUsize::new(0));
///
/// for _ in 0..100 {
///     let hits = hits.clone();
///     pool.submit(move || {
///         hits.fetch_add(1, Ordering::Relaxed);
///     })
///     .unwrap();
/// }
///
/// // Drains the queue and joins every worker.
/// pool.release();
/// assert_eq!(hits.load(Ordering::Relaxed), 100);
/// assert_eq!(pool.stats().live_workers, 0);
/// ```
///
/// [`release`]: Pool::release
/// [`max_workers`]: Pool::max_workers
/// [`queue_capacity`]: Pool::queue_capacity
/// [`try_submit`]: Pool::try_submit
/// [`submit_timeout`]: Pool::submit_timeout
pub struct Pool {
    /// Intake side of the queue. `None` once release has begun.
    sender: Mutex<Option<Sender<BoxedJob>>>,
    /// Never receives; kept to report the queue length.
    monitor: Receiver<BoxedJob>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    counters: Arc<Counters>,
    max_workers: usize,
    queue_capacity: usize,
}

impl Pool {
    /// Creates a pool with `max_workers` threads and a queue holding up to
    /// `queue_capacity` pending jobs.
    ///
    /// A `queue_capacity` of zero makes the queue a rendezvous point: each
    /// submission waits until a worker is ready to take the job directly.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidWorkerCount`] when `max_workers` is zero. No thread
    ///   is spawned.
    /// - [`Error::Spawn`] when the OS refuses a worker thread.
    pub fn new(max_workers: usize, queue_capacity: usize) -> Result<Self> {
        Self::with_config(PoolConfig::new(max_workers, queue_capacity))
    }

    /// Creates a pool from a full [`PoolConfig`].
    ///
    /// Workers are spawned eagerly, one per `max_workers`, and named
    /// `{thread_name}-{index}`.
    ///
    /// # Errors
    ///
    /// See [`Pool::new`]. If spawning fails part way, the workers that did
    /// start are shut down and joined before the error is returned.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            level = "debug",
            skip_all,
            fields(
                max_workers = config.max_workers,
                queue_capacity = config.queue_capacity
            )
        )
    )]
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        let PoolConfig {
            max_workers,
            queue_capacity,
            thread_name,
            stack_size,
        } = config;

        if max_workers == 0 {
            return Err(Error::InvalidWorkerCount { max_workers });
        }

        let (tx, rx) = crossbeam_channel::bounded::<BoxedJob>(queue_capacity);
        let counters = Arc::new(Counters::new());
        // The counters allocation is unique for the pool's lifetime.
        let pool_id = Arc::as_ptr(&counters) as usize;
        let mut workers = Vec::with_capacity(max_workers);

        for worker_id in 0..max_workers {
            let mut builder = thread::Builder::new().name(format!("{thread_name}-{worker_id}"));
            if let Some(size) = stack_size {
                builder = builder.stack_size(size);
            }

            let worker_rx = rx.clone();
            let worker_counters = counters.clone();
            counters.worker_started();

            let spawned =
                builder.spawn(move || worker_loop(worker_id, pool_id, worker_rx, worker_counters));
            match spawned {
                Ok(handle) => workers.push(handle),
                Err(source) => {
                    counters.worker_stopped();

                    #[cfg(feature = "tracing")]
                    tracing::error!("Failed to spawn worker {worker_id}: {source}");

                    drop(tx);
                    for handle in workers {
                        let _ = handle.join();
                    }
                    return Err(Error::Spawn { worker_id, source });
                }
            }
        }

        #[cfg(feature = "tracing")]
        tracing::debug!("Started {max_workers} workers (queue capacity {queue_capacity})");

        Ok(Self {
            sender: Mutex::new(Some(tx)),
            monitor: rx,
            workers: Mutex::new(workers),
            counters,
            max_workers,
            queue_capacity,
        })
    }

    /// Enqueues `job`, blocking while the queue is full.
    ///
    /// This is the pool's backpressure: a producer outrunning the workers is
    /// held here until a worker dequeues something.
    ///
    /// # Errors
    ///
    /// Returns [`SubmitError::Released`], carrying the job, if
    /// [`Pool::release`] has been called. A submission that was already
    /// waiting for a slot when release began still completes and its job
    /// still runs.
    pub fn submit<J: Job>(&self, job: J) -> Result<(), SubmitError> {
        self.submit_boxed(Box::new(job))
    }

    /// Same as [`Pool::submit`] for an already boxed job, e.g. one recovered
    /// with [`SubmitError::into_job`].
    ///
    /// # Errors
    ///
    /// See [`Pool::submit`].
    pub fn submit_boxed(&self, job: BoxedJob) -> Result<(), SubmitError> {
        let Some(tx) = self.sender() else {
            return Err(SubmitError::Released(job));
        };
        tx.send(job).map_err(|err| SubmitError::Released(err.into_inner()))
    }

    /// Enqueues `job` only if a slot is free right now.
    ///
    /// With a zero-capacity queue this succeeds only when a worker is idle and
    /// waiting.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Full`] if the queue has no free slot.
    /// - [`SubmitError::Released`] if the pool has been released.
    pub fn try_submit<J: Job>(&self, job: J) -> Result<(), SubmitError> {
        let job: BoxedJob = Box::new(job);
        let Some(tx) = self.sender() else {
            return Err(SubmitError::Released(job));
        };
        tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) => SubmitError::Full(job),
            TrySendError::Disconnected(job) => SubmitError::Released(job),
        })
    }

    /// Enqueues `job`, blocking for at most `timeout` while the queue is full.
    ///
    /// # Errors
    ///
    /// - [`SubmitError::Timeout`] if no slot freed up in time.
    /// - [`SubmitError::Released`] if the pool has been released.
    pub fn submit_timeout<J: Job>(&self, job: J, timeout: Duration) -> Result<(), SubmitError> {
        let job: BoxedJob = Box::new(job);
        let Some(tx) = self.sender() else {
            return Err(SubmitError::Released(job));
        };
        tx.send_timeout(job, timeout).map_err(|err| match err {
            SendTimeoutError::Timeout(job) => SubmitError::Timeout(job),
            SendTimeoutError::Disconnected(job) => SubmitError::Released(job),
        })
    }

    /// Shuts the pool down and waits for it to drain.
    ///
    /// 1. Intake is closed: later submissions fail with
    ///    [`SubmitError::Released`].
    /// 2. Workers keep running until every job already in the queue, and
    ///    every job currently running, has finished.
    /// 3. Every worker thread is joined.
    ///
    /// Calling `release` again, or from several threads at once, is safe:
    /// the extra calls wait for the first one to finish and then return.
    ///
    /// Called from inside one of this pool's own jobs, `release` only closes
    /// intake and returns immediately, since the calling worker cannot join
    /// itself. A later call from outside the pool (or dropping it) completes
    /// the shutdown.
    ///
    /// If the last handle to the pool is dropped inside one of its own jobs
    /// (e.g. the final `Arc<Pool>` was captured by that job), nothing is left
    /// to join the workers. They are detached instead: each still drains the
    /// queue and exits on its own, but nobody waits for them.
    pub fn release(&self) {
        if on_worker_of(self.id()) {
            let _closed = lock(&self.sender).take();
            #[cfg(feature = "tracing")]
            tracing::debug!("Release called from a worker; intake closed, join deferred");
            return;
        }

        let mut workers = lock(&self.workers);
        // Dropping the last intake handle disconnects the queue once it is
        // empty, which is what ends each worker loop.
        let sender = lock(&self.sender).take();
        if sender.is_none() && workers.is_empty() {
            return;
        }
        drop(sender);

        #[cfg(feature = "tracing")]
        tracing::info!(
            "Releasing worker pool ({} queued, {} in flight)",
            self.monitor.len(),
            self.counters.in_flight()
        );

        for (_worker_id, handle) in workers.drain(..).enumerate() {
            if let Err(_e) = handle.join() {
                #[cfg(feature = "tracing")]
                tracing::error!("Worker {_worker_id} terminated abnormally: {_e:?}");
            }
        }

        #[cfg(feature = "tracing")]
        tracing::info!("Worker pool released");
    }

    /// Returns `true` once [`Pool::release`] has begun.
    pub fn is_released(&self) -> bool {
        lock(&self.sender).is_none()
    }

    /// Number of worker threads this pool was created with.
    pub const fn max_workers(&self) -> usize {
        self.max_workers
    }

    /// Capacity of the job queue.
    pub const fn queue_capacity(&self) -> usize {
        self.queue_capacity
    }

    /// Takes a snapshot of the pool's counters.
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            max_workers: self.max_workers,
            queue_capacity: self.queue_capacity,
            live_workers: self.counters.live_workers(),
            queued: self.monitor.len(),
            in_flight: self.counters.in_flight(),
            completed: self.counters.completed(),
            panicked: self.counters.panicked(),
        }
    }

    /// Clones the intake handle so the blocking send happens outside the lock.
    fn sender(&self) -> Option<Sender<BoxedJob>> {
        lock(&self.sender).clone()
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.counters) as usize
    }
}

impl Drop for Pool {
    /// Dropping a pool releases it, blocking until all accepted jobs ran.
    ///
    /// Dropped from one of its own workers, the pool detaches its workers
    /// rather than joining them; see [`Pool::release`].
    fn drop(&mut self) {
        self.release();
    }
}

impl core::fmt::Debug for Pool {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pool")
            .field("stats", &self.stats())
            .field("released", &self.is_released())
            .finish()
    }
}
