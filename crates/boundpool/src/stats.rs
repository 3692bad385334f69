use core::sync::atomic::{AtomicUsize, Ordering};

#[cfg(feature = "cache-padded")]
type Counter = crossbeam_utils::CachePadded<AtomicUsize>;
#[cfg(not(feature = "cache-padded"))]
type Counter = AtomicUsize;

#[inline]
fn counter() -> Counter {
    #[cfg(feature = "cache-padded")]
    {
        crossbeam_utils::CachePadded::new(AtomicUsize::new(0))
    }
    #[cfg(not(feature = "cache-padded"))]
    {
        AtomicUsize::new(0)
    }
}

/// A point-in-time snapshot of a [`Pool`].
///
/// Fields are read independently, so a snapshot taken while jobs are moving
/// may be slightly inconsistent (e.g. a job counted neither as queued nor as
/// in flight for the instant it is being handed over). Use it for monitoring,
/// not for synchronization.
///
/// [`Pool`]: crate::Pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PoolStats {
    /// Configured number of workers.
    pub max_workers: usize,
    /// Configured queue capacity.
    pub queue_capacity: usize,
    /// Workers whose loop has not yet exited.
    pub live_workers: usize,
    /// Jobs accepted but not yet picked up by a worker.
    pub queued: usize,
    /// Jobs currently running.
    pub in_flight: usize,
    /// Jobs that returned normally.
    pub completed: usize,
    /// Jobs that panicked and were contained by their worker.
    pub panicked: usize,
}

/// Counters shared between the pool handle and its workers.
#[derive(Debug)]
pub(crate) struct Counters {
    live_workers: Counter,
    in_flight: Counter,
    completed: Counter,
    panicked: Counter,
}

impl Counters {
    pub(crate) fn new() -> Self {
        Self {
            live_workers: counter(),
            in_flight: counter(),
            completed: counter(),
            panicked: counter(),
        }
    }

    #[inline]
    pub(crate) fn worker_started(&self) {
        self.live_workers.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn worker_stopped(&self) {
        self.live_workers.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn job_started(&self) {
        self.in_flight.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn job_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn job_panicked(&self) {
        self.panicked.fetch_add(1, Ordering::Relaxed);
        self.in_flight.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn live_workers(&self) -> usize {
        self.live_workers.load(Ordering::Relaxed)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    pub(crate) fn panicked(&self) -> usize {
        self.panicked.load(Ordering::Relaxed)
    }
}
