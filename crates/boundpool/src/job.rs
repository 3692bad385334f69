/// A unit of work executed by a pool worker.
///
/// Jobs take no input and return nothing visible to the pool. Anything a job
/// produces, including failure, must be reported through state it owns or
/// closes over (a counter, a channel, a shared result slot).
///
/// Every closure `FnOnce() + Send + 'static` is a `Job`, so most callers never
/// implement this trait by hand. Implement it directly when a job is better
/// expressed as a named type carrying its own arguments.
///
/// # Example
///
/// ```
/// use boundpool::{Job, Pool};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// struct Add {
///     total: Arc<AtomicUsize>,
///     amount: usize,
/// }
///
/// impl Job for Add {
///     fn run(self: Box<Self>) {
///         self.total.fetch_add(self.amount, Ordering::Relaxed);
///     }
/// }
///
/// let total = Arc::new(AtomicUsize::new(0));
/// let pool = Pool::new(2, 8).unwrap();
/// pool.submit(Add { total: total.clone(), amount: 3 }).unwrap();
/// pool.submit({
///     let total = total.clone();
///     move || {
///         total.fetch_add(4, Ordering::Relaxed);
///     }
/// })
/// .unwrap();
/// pool.release();
///
/// assert_eq!(total.load(Ordering::Relaxed), 7);
/// ```
pub trait Job: Send + 'static {
    /// Runs the job to completion on the calling worker thread.
    fn run(self: Box<Self>);
}

impl<F> Job for F
where
    F: FnOnce() + Send + 'static,
{
    fn run(self: Box<Self>) {
        (*self)()
    }
}

/// The type-erased form in which jobs travel through the queue.
pub type BoxedJob = Box<dyn Job>;
