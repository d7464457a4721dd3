// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! redactflowd — background process owning the PII pipeline's queue
//! substrate, stage processors, and event fan-out. Serves the HTTP/SSE API
//! the upload surface and clients talk to.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::time::Duration;

use redactflow_daemon::api::{router, AppState};
use redactflow_daemon::config::{Config, ConfigError};
use redactflow_daemon::{pump, snapshotter, startup};
use thiserror::Error;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

const SNAPSHOT_INTERVAL: Duration = Duration::from_secs(60);
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
enum MainError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("startup error: {0}")]
    Startup(#[from] startup::StartupError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Some(arg) = std::env::args().nth(1) {
        match arg.as_str() {
            "--version" | "-V" => {
                println!("redactflowd {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("redactflowd {}", env!("CARGO_PKG_VERSION"));
                println!("PII detection and anonymization pipeline daemon.");
                return Ok(());
            }
            other => {
                eprintln!("error: unexpected argument '{other}'");
                std::process::exit(1);
            }
        }
    }

    if let Err(err) = run().await {
        eprintln!("redactflowd: {err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<(), MainError> {
    let config = Config::load()?;
    let _log_guard = setup_logging(&config)?;

    info!(listen_addr = %config.listen_addr, state_dir = %config.state_dir.display(), "starting redactflowd");

    let (daemon, event_rx) = startup::startup(config)?;
    let workers = daemon.spawn_workers();

    tokio::spawn(pump::run_pump(event_rx, daemon.state.clone(), daemon.fanout.clone()));
    if daemon.config.sse_enabled {
        tokio::spawn(fanout_heartbeat(daemon.fanout.clone(), HEARTBEAT_INTERVAL));
    }
    tokio::spawn(snapshotter::run_snapshotter(
        daemon.state.clone(),
        daemon.wal.clone(),
        daemon.config.snapshot_path.clone(),
        SNAPSHOT_INTERVAL,
    ));

    let state = AppState::new(daemon.executor.clone(), daemon.state.clone(), daemon.fanout.clone(), daemon.id_gen.clone())
        .with_max_queue_depth(daemon.config.queue_max_depth);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(daemon.config.listen_addr).await?;
    let bound_addr = listener.local_addr()?;

    info!(addr = %bound_addr, "listening");
    // Printed before READY so a harness using REDACTFLOW_LISTEN_ADDR=127.0.0.1:0
    // (an ephemeral port) can discover which port was actually bound.
    println!("LISTENING {bound_addr}");
    println!("READY");

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        result = axum::serve(listener, app) => {
            if let Err(err) = result {
                error!(%err, "http server exited with an error");
            }
        }
        _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
        _ = sigint.recv() => info!("received SIGINT, shutting down"),
    }

    workers.shutdown().await;
    info!("redactflowd stopped");
    Ok(())
}

async fn fanout_heartbeat(registry: redactflow_daemon::FanoutRegistry, interval: Duration) {
    redactflow_daemon::fanout::run_heartbeat(registry, redactflow_core::SystemClock, interval).await
}

fn setup_logging(config: &Config) -> Result<tracing_appender::non_blocking::WorkerGuard, std::io::Error> {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    if let Some(parent) = config.log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file_appender = tracing_appender::rolling::never(
        config.log_path.parent().unwrap_or_else(|| std::path::Path::new(".")),
        config.log_path.file_name().unwrap_or_else(|| std::ffi::OsStr::new("daemon.log")),
    );
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let filter = EnvFilter::try_new(&config.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        redactflow_daemon::config::LogFormat::Json => registry.with(fmt::layer().json().with_writer(non_blocking)).init(),
        redactflow_daemon::config::LogFormat::Text => registry.with(fmt::layer().with_writer(non_blocking)).init(),
    }
    Ok(guard)
}
