use crate::{job::BoxedJob, stats::Counters};
use core::cell::Cell;
use crossbeam_channel::Receiver;
use std::{
    panic::{self, AssertUnwindSafe},
    sync::Arc,
};

thread_local! {
    /// Identity of the pool whose worker is running on this thread, or 0.
    static CURRENT_POOL: Cell<usize> = const { Cell::new(0) };
}

/// Returns `true` when called from a worker thread of the pool `pool_id`.
pub(crate) fn on_worker_of(pool_id: usize) -> bool {
    CURRENT_POOL.with(Cell::get) == pool_id
}

/// Decrements the live worker count however the loop exits.
struct LiveGuard<'a>(&'a Counters);

impl Drop for LiveGuard<'_> {
    fn drop(&mut self) {
        self.0.worker_stopped();
    }
}

/// Body of a pool worker thread.
///
/// Pulls jobs from the shared queue one at a time and runs each to completion.
/// The loop ends once every sender has been dropped *and* the queue is empty,
/// which is how [`Pool::release`] drains outstanding work before joining.
///
/// A job that panics is caught at the job boundary: the panic is counted and
/// logged, and the worker moves on to the next job.
///
/// The caller has already counted this worker as live; the count is released
/// when the loop returns.
///
/// [`Pool::release`]: crate::Pool::release
pub(crate) fn worker_loop(
    _worker_id: usize,
    pool_id: usize,
    rx: Receiver<BoxedJob>,
    counters: Arc<Counters>,
) {
    let _live = LiveGuard(&counters);
    CURRENT_POOL.with(|cell| cell.set(pool_id));

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} started");

    while let Ok(job) = rx.recv() {
        counters.job_started();

        match panic::catch_unwind(AssertUnwindSafe(|| job.run())) {
            Ok(()) => counters.job_completed(),
            Err(payload) => {
                counters.job_panicked();

                #[cfg(feature = "tracing")]
                tracing::warn!(
                    "Worker {_worker_id} contained a panicking job: {}",
                    panic_message(payload.as_ref())
                );

                // A payload's own Drop may panic as well.
                let _ = panic::catch_unwind(AssertUnwindSafe(move || drop(payload)));
            }
        }
    }

    #[cfg(feature = "tracing")]
    tracing::trace!("Worker {_worker_id} stopped");

    CURRENT_POOL.with(|cell| cell.set(0));
}

/// Best-effort text of a panic payload.
#[cfg(any(feature = "tracing", test))]
pub(crate) fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "<non-string panic payload>"
    }
}
