//! The synthetic workload and the two ways of dispatching it.
//!
//! - **Pooled** (`max_workers > 0`): producers submit into a [`Pool`]; the
//!   pool bounds concurrency and applies backpressure.
//! - **Unpooled** (`max_workers == 0`): every job gets its own scoped thread.
//!   Nothing bounds concurrency, which is the point of comparison.
//!
//! Both modes stop submitting once `stop` is raised, and both return only
//! after every accepted job has finished and every thread has been joined.

use crate::config::LoadConfig;
use boundpool::{Pool, PoolConfig, PoolStats, SubmitError};
use core::time::Duration;
use std::{
    ops::Range,
    panic::{self, AssertUnwindSafe},
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    thread::{self, Scope},
    time::Instant,
};

/// Outcome of one load run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    /// Jobs accepted for execution.
    pub submitted: u64,
    /// Jobs that ran to completion.
    pub executed: u64,
    /// Jobs that panicked (and were contained).
    pub panicked: u64,
    /// Jobs dropped because a submission timed out or a thread could not be
    /// spawned.
    pub shed: u64,
    /// `true` when the run ended early on a stop request.
    pub interrupted: bool,
    pub elapsed: Duration,
    /// Final pool counters, pooled mode only.
    pub pool: Option<PoolStats>,
}

impl Report {
    pub fn jobs_per_sec(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            (self.executed + self.panicked) as f64 / secs
        } else {
            0.0
        }
    }

    pub fn log(&self) {
        tracing::info!(
            submitted = self.submitted,
            executed = self.executed,
            panicked = self.panicked,
            shed = self.shed,
            interrupted = self.interrupted,
            elapsed_ms = self.elapsed.as_millis() as u64,
            "Load run finished ({:.0} jobs/s)",
            self.jobs_per_sec()
        );
        if let Some(stats) = &self.pool {
            tracing::info!("Final pool stats: {stats:?}");
        }
    }
}

#[derive(Default)]
struct Tally {
    submitted: AtomicU64,
    executed: AtomicU64,
    panicked: AtomicU64,
    shed: AtomicU64,
}

/// Runs the workload described by `config` until every job has been
/// submitted or `stop` is raised, then drains and returns the tally.
///
/// # Errors
///
/// Fails only if the pool cannot be constructed.
pub fn run(config: &LoadConfig, stop: &AtomicBool) -> anyhow::Result<Report> {
    let tally = Arc::new(Tally::default());
    let started = Instant::now();

    let pool = if config.is_pooled() {
        let pool_config = PoolConfig::new(config.max_workers, config.queue_capacity)
            .with_thread_name("load-worker");
        let pool = Pool::with_config(pool_config)?;
        run_pooled(config, stop, &pool, &tally);
        pool.release();
        Some(pool.stats())
    } else {
        run_unpooled(config, stop, &tally);
        None
    };

    let panicked = match &pool {
        Some(stats) => stats.panicked as u64,
        None => tally.panicked.load(Ordering::Relaxed),
    };

    Ok(Report {
        submitted: tally.submitted.load(Ordering::Relaxed),
        executed: tally.executed.load(Ordering::Relaxed),
        panicked,
        shed: tally.shed.load(Ordering::Relaxed),
        interrupted: stop.load(Ordering::Relaxed),
        elapsed: started.elapsed(),
        pool,
    })
}

fn run_pooled(config: &LoadConfig, stop: &AtomicBool, pool: &Pool, tally: &Arc<Tally>) {
    thread::scope(|s| {
        for (producer, range) in shares(config.jobs, config.producers).enumerate() {
            s.spawn(move || {
                for index in range {
                    if stop.load(Ordering::Relaxed) {
                        tracing::debug!("Producer {producer} stopping at job {index}");
                        break;
                    }

                    let job = make_job(config, index, tally.clone());
                    let submitted = match config.submit_timeout {
                        Some(timeout) => pool.submit_timeout(job, timeout),
                        None => pool.submit(job),
                    };

                    match submitted {
                        Ok(()) => {
                            tally.submitted.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(SubmitError::Timeout(_)) => {
                            tally.shed.fetch_add(1, Ordering::Relaxed);
                        }
                        Err(err) => {
                            tracing::warn!("Producer {producer} giving up: {err}");
                            break;
                        }
                    }
                }
            });
        }
    });
}

fn run_unpooled(config: &LoadConfig, stop: &AtomicBool, tally: &Arc<Tally>) {
    thread::scope(|s| {
        for range in shares(config.jobs, config.producers) {
            s.spawn(move || {
                for index in range {
                    if stop.load(Ordering::Relaxed) {
                        break;
                    }
                    spawn_dedicated(s, make_job(config, index, tally.clone()), tally);
                }
            });
        }
    });
}

/// Runs `job` on a thread of its own, containing a panic the same way a pool
/// worker would.
fn spawn_dedicated<'scope, F>(s: &'scope Scope<'scope, '_>, job: F, tally: &'scope Tally)
where
    F: FnOnce() + Send + 'scope,
{
    let spawned = thread::Builder::new().spawn_scoped(s, move || {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            tally.panicked.fetch_add(1, Ordering::Relaxed);
        }
    });

    match spawned {
        Ok(_) => {
            tally.submitted.fetch_add(1, Ordering::Relaxed);
        }
        Err(err) => {
            tracing::warn!("Could not spawn a dedicated job thread: {err}");
            tally.shed.fetch_add(1, Ordering::Relaxed);
        }
    }
}

fn make_job(config: &LoadConfig, index: u64, tally: Arc<Tally>) -> impl FnOnce() + Send + 'static {
    let work = config.job_duration;
    let panics = config.job_panics(index);

    move || {
        if !work.is_zero() {
            thread::sleep(work);
        }
        if panics {
            panic!("job {index} failed (simulated)");
        }
        tally.executed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Splits `jobs` job indices into `producers` contiguous ranges whose sizes
/// differ by at most one.
fn shares(jobs: u64, producers: usize) -> impl Iterator<Item = Range<u64>> {
    let producers = producers as u64;
    let base = jobs / producers;
    let extra = jobs % producers;

    (0..producers).map(move |p| {
        let start = p * base + p.min(extra);
        let len = base + u64::from(p < extra);
        start..start + len
    })
}
