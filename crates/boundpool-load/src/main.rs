#![doc = include_str!("../README.md")]

mod config;
mod telemetry;
mod workload;

use clap::Parser;
use config::{CliArgs, LoadConfig};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use telemetry::init_telemetry;
use tokio::signal;

// Job closures are allocated and freed on every submission, from many
// producer threads at once.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = LoadConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let stop = Arc::new(AtomicBool::new(false));
    let mut load = tokio::task::spawn_blocking({
        let config = config.clone();
        let stop = stop.clone();
        move || workload::run(&config, &stop)
    });

    let report = tokio::select! {
        finished = &mut load => finished??,
        () = shutdown_signal() => {
            tracing::info!("Stopping producers and draining accepted jobs...");
            stop.store(true, Ordering::Relaxed);
            load.await??
        }
    };

    report.log();
    Ok(())
}

fn log_startup_info(config: &LoadConfig) {
    if cfg!(debug_assertions) {
        tracing::info!("Starting load run with full config: {config:#?}");
    } else if config.is_pooled() {
        tracing::info!(
            "Starting load run: {} jobs through {} workers (queue capacity {})",
            config.jobs,
            config.max_workers,
            config.queue_capacity
        );
    } else {
        tracing::info!(
            "Starting load run: {} jobs on dedicated threads (no pool)",
            config.jobs
        );
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                tracing::error!("Failed to install SIGTERM handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {err}");
            std::future::pending::<()>().await;
        }
    };

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        () = terminate => {
            tracing::info!("Received SIGTERM signal");
        },
    }
}
