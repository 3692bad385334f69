use anyhow::bail;
use boundpool::DEFAULT_QUEUE_CAPACITY;
use clap::Parser;
use core::time::Duration;

/// Runtime configuration for the `boundpool-load` binary.
///
/// These settings size the worker pool and shape the synthetic workload that
/// is pushed through it. All values are parsed from CLI arguments or
/// environment variables (a `.env` file is loaded first), so a deployment can
/// try different pool sizes without rebuilding.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "boundpool-load",
    version,
    about = "Push a synthetic workload through a bounded worker pool"
)]
pub struct CliArgs {
    /// Number of worker threads in the pool.
    ///
    /// Defaults to the number of logical CPUs. `0` disables the pool and runs
    /// every job on its own thread instead, which is useful as a baseline
    /// but gives up all concurrency bounds.
    ///
    /// Environment variable: `MAX_WORKERS`
    #[arg(long, env = "MAX_WORKERS", default_value_t = num_cpus::get())]
    pub max_workers: usize,

    /// Number of jobs the queue holds before producers block.
    ///
    /// `0` makes each submission wait for an idle worker.
    ///
    /// Environment variable: `QUEUE_CAPACITY`
    #[arg(long, env = "QUEUE_CAPACITY", default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,

    /// Total number of jobs to submit.
    ///
    /// Environment variable: `JOBS`
    #[arg(long, env = "JOBS", default_value_t = 1_000_000)]
    pub jobs: u64,

    /// Number of producer threads sharing the submissions.
    ///
    /// Environment variable: `PRODUCERS`
    #[arg(long, env = "PRODUCERS", default_value_t = 1)]
    pub producers: usize,

    /// Simulated work per job, in microseconds (the job sleeps).
    ///
    /// Environment variable: `JOB_MICROS`
    #[arg(long, env = "JOB_MICROS", default_value_t = 0)]
    pub job_micros: u64,

    /// Make every Nth job panic, to exercise fault isolation. `0` never
    /// panics.
    ///
    /// Environment variable: `PANIC_EVERY`
    #[arg(long, env = "PANIC_EVERY", default_value_t = 0)]
    pub panic_every: u64,

    /// Give up on a submission after this many milliseconds of backpressure
    /// and count the job as shed. Without it producers block indefinitely.
    ///
    /// Environment variable: `SUBMIT_TIMEOUT_MS`
    #[arg(long, env = "SUBMIT_TIMEOUT_MS")]
    pub submit_timeout_ms: Option<u64>,
}

/// Validated form of [`CliArgs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadConfig {
    pub max_workers: usize,
    pub queue_capacity: usize,
    pub jobs: u64,
    pub producers: usize,
    pub job_duration: Duration,
    pub panic_every: Option<u64>,
    pub submit_timeout: Option<Duration>,
}

impl LoadConfig {
    /// `false` when jobs run on dedicated threads instead of a pool.
    pub const fn is_pooled(&self) -> bool {
        self.max_workers > 0
    }

    /// Whether the job with zero-based `index` should panic.
    pub fn job_panics(&self, index: u64) -> bool {
        self.panic_every.is_some_and(|every| (index + 1) % every == 0)
    }
}

impl TryFrom<CliArgs> for LoadConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        if args.producers == 0 {
            bail!("PRODUCERS must be greater than 0");
        }

        if args.max_workers == 0 && args.submit_timeout_ms.is_some() {
            bail!("SUBMIT_TIMEOUT_MS requires a pool (MAX_WORKERS > 0)");
        }

        if args.max_workers == 0 && args.job_micros > 0 && args.jobs > 100_000 {
            bail!(
                "Refusing to start {} sleeping jobs on dedicated threads; set MAX_WORKERS > 0",
                args.jobs
            );
        }

        Ok(Self {
            max_workers: args.max_workers,
            queue_capacity: args.queue_capacity,
            jobs: args.jobs,
            producers: args.producers,
            job_duration: Duration::from_micros(args.job_micros),
            panic_every: (args.panic_every > 0).then_some(args.panic_every),
            submit_timeout: args.submit_timeout_ms.map(Duration::from_millis),
        })
    }
}
