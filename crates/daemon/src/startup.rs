// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Composition root: the single place concrete adapters (HTTP-backed
//! detector/anonymizer/extractor/OCR clients, the WAL, the SSE fan-out) are
//! constructed and wired into the engine, and the recovery path that
//! replays durable state on startup.

use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use redactflow_core::{Event, JobStatus, SystemClock, UuidIdGen};
use redactflow_detect::{HttpDetectorClient, LocalAnonymizerClient};
use redactflow_engine::{Executor, NoPolicyDocumentSource, ProcessorDeps, Scheduler, WorkerPool};
use redactflow_extraction::{HttpDocumentExtractorClient, HttpOcrClient};
use redactflow_policy::PolicyCache;
use redactflow_storage::{MaterializedState, Snapshot, Wal, WalError};
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, warn};

/// Buffered frames between the executor's event sink and the fan-out pump.
/// A slow pump only risks dropped fan-out frames (best-effort delivery by
/// design, see §4.8); it never blocks the executor.
const EVENT_SINK_BUFFER: usize = 1024;

use crate::config::Config;
use crate::fanout::FanoutRegistry;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("storage error: {0}")]
    Storage(#[from] WalError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Everything the HTTP layer and the worker pool need a handle to.
pub struct Daemon {
    pub config: Config,
    pub state: Arc<Mutex<MaterializedState>>,
    pub wal: Arc<Mutex<Wal>>,
    pub scheduler: Arc<Mutex<Scheduler>>,
    pub executor: Arc<Executor<SystemClock>>,
    pub deps: Arc<ProcessorDeps<SystemClock>>,
    pub fanout: FanoutRegistry,
    pub id_gen: Arc<UuidIdGen>,
    pub start_time: Instant,
}

/// Loads the last snapshot (if any) and replays WAL entries after it,
/// reconstructing `MaterializedState` and the watermark to resume the WAL
/// from.
fn recover(config: &Config) -> Result<(MaterializedState, Wal), StartupError> {
    std::fs::create_dir_all(&config.state_dir)?;
    if let Some(parent) = config.wal_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let snapshot = Snapshot::read_from(&config.snapshot_path).unwrap_or(None);
    let covers_up_to_seq = snapshot.as_ref().map(|s| s.covers_up_to_seq).unwrap_or(0);
    let mut state = snapshot.map(Snapshot::into_state).unwrap_or_default();

    let mut wal = Wal::open(&config.wal_path)?;
    let entries = wal.scan()?;
    let mut applied = 0;
    for entry in &entries {
        if entry.seq > covers_up_to_seq {
            state.apply_event(&entry.event);
            applied += 1;
        }
        wal.mark_processed(entry.seq);
    }
    info!(applied, total = entries.len(), "replayed write-ahead log");
    Ok((state, wal))
}

/// Any job left `Running` when the daemon last stopped has an orphaned
/// reservation: no worker is coming back to ack or nack it. Arming its
/// stall timer at zero duration hands it straight to the next stall sweep,
/// which requeues it once (or fails it if it had already stalled before).
fn reap_orphaned_reservations(state: &MaterializedState, scheduler: &mut Scheduler) {
    let now = Instant::now();
    let mut reaped = 0;
    for job in state.jobs.values() {
        if job.status == JobStatus::Running {
            scheduler.set_timer(format!("stall:{}", job.id), Duration::ZERO, now);
            reaped += 1;
        }
    }
    if reaped > 0 {
        warn!(reaped, "reaped orphaned job reservations from a previous run");
    }
}

/// Builds the full daemon from configuration: recovers durable state,
/// constructs the processor dependencies from the configured service URLs,
/// and returns a handle ready to serve HTTP and spawn worker pools, plus the
/// receiving half of its event sink for the caller to spawn the fan-out
/// pump on (see `pump::run_pump`).
pub fn startup(config: Config) -> Result<(Daemon, broadcast::Receiver<Event>), StartupError> {
    let (state, mut wal) = recover(&config)?;
    let mut scheduler = Scheduler::new();
    reap_orphaned_reservations(&state, &mut scheduler);
    wal.flush()?;

    let deps = ProcessorDeps {
        detector: Arc::new(HttpDetectorClient::new(config.detector_url.clone())),
        anonymizer: Arc::new(LocalAnonymizerClient),
        document_extractor: Arc::new(HttpDocumentExtractorClient::new(config.document_extractor_url.clone())),
        ocr: Arc::new(HttpOcrClient::new(config.ocr_url.clone())),
        policy_cache: Arc::new(PolicyCache::new()),
        policy_source: Arc::new(NoPolicyDocumentSource),
        file_reader: Arc::new(redactflow_engine::LocalFileReader),
        id_gen: Arc::new(UuidIdGen),
        clock: SystemClock,
        max_text_length: config.extraction_max_text_length,
        max_file_size: Some(config.storage_max_file_size),
    };

    let (event_tx, event_rx) = broadcast::channel(EVENT_SINK_BUFFER);

    let wal = Arc::new(Mutex::new(wal));
    let executor = Executor::new(
        Arc::new(Mutex::new(state)),
        Arc::clone(&wal),
        Arc::new(Mutex::new(scheduler)),
        SystemClock,
    )
    .with_event_sink(event_tx);

    let daemon = Daemon {
        state: executor.state(),
        wal,
        scheduler: executor.scheduler(),
        executor: Arc::new(executor),
        deps: Arc::new(deps),
        fanout: FanoutRegistry::new(),
        id_gen: Arc::new(UuidIdGen),
        start_time: Instant::now(),
        config,
    };
    Ok((daemon, event_rx))
}

impl Daemon {
    /// Spawns the worker pool driving jobs through the four stage
    /// processors.
    pub fn spawn_workers(&self) -> WorkerPool {
        WorkerPool::spawn(
            Arc::clone(&self.executor),
            Arc::clone(&self.deps),
            self.config.worker_concurrency,
            redactflow_engine::DEFAULT_HARD_TIMEOUT,
        )
    }
}

#[cfg(test)]
mod tests {
    use redactflow_core::test_support::sample_job;
    use redactflow_core::JobKind;
    use tempfile::tempdir;

    use super::*;
    use crate::config::LogFormat;

    fn test_config(dir: &std::path::Path) -> Config {
        Config {
            state_dir: dir.to_path_buf(),
            wal_path: dir.join("wal").join("events.wal"),
            snapshot_path: dir.join("snapshot.json"),
            log_path: dir.join("daemon.log"),
            listen_addr: ([127, 0, 0, 1], 0).into(),
            worker_concurrency: 1,
            worker_retry_attempts: 3,
            worker_retry_delay: Duration::from_secs(1),
            storage_max_file_size: 1024,
            extraction_max_text_length: 1024,
            queue_max_depth: crate::config::DEFAULT_MAX_QUEUE_DEPTH,
            redis_url: None,
            detector_url: "http://127.0.0.1:5001".to_string(),
            anonymizer_url: "http://127.0.0.1:5002".to_string(),
            document_extractor_url: "http://127.0.0.1:9998".to_string(),
            ocr_url: "http://127.0.0.1:9999".to_string(),
            sse_enabled: false,
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
        }
    }

    #[test]
    fn recover_with_no_prior_state_returns_an_empty_state() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());

        let (state, _wal) = recover(&config).unwrap();
        assert!(state.jobs.is_empty());
        assert!(state.datasets.is_empty());
    }

    #[test]
    fn recover_replays_wal_entries_written_after_the_snapshot_watermark() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.wal_path.parent().unwrap()).unwrap();

        let mut wal = Wal::open(&config.wal_path).unwrap();
        let job = sample_job("job-1", JobKind::FileProcessing, "dataset-1");
        wal.append(&Event::JobEnqueued { job }).unwrap();
        wal.flush().unwrap();
        drop(wal);

        let (state, _wal) = recover(&config).unwrap();
        assert_eq!(state.jobs.get("job-1").unwrap().status, JobStatus::Queued);
    }

    #[test]
    fn recover_does_not_replay_entries_already_covered_by_a_snapshot() {
        let dir = tempdir().unwrap();
        let config = test_config(dir.path());
        std::fs::create_dir_all(config.wal_path.parent().unwrap()).unwrap();

        let mut wal = Wal::open(&config.wal_path).unwrap();
        let seq = wal.append(&Event::JobEnqueued { job: sample_job("job-1", JobKind::FileProcessing, "dataset-1") }).unwrap();
        wal.flush().unwrap();

        let mut state = MaterializedState::new();
        state.apply_event(&Event::JobEnqueued { job: sample_job("job-1", JobKind::FileProcessing, "dataset-1") });
        Snapshot::from_state(&state, seq).write_to(&config.snapshot_path).unwrap();
        drop(wal);

        // A second entry appended after the snapshot was taken must still replay.
        let mut wal = Wal::open(&config.wal_path).unwrap();
        wal.append(&Event::JobEnqueued { job: sample_job("job-2", JobKind::FileProcessing, "dataset-2") }).unwrap();
        wal.flush().unwrap();
        drop(wal);

        let (state, _wal) = recover(&config).unwrap();
        assert!(state.jobs.contains_key("job-1"));
        assert!(state.jobs.contains_key("job-2"));
    }

    #[test]
    fn reap_orphaned_reservations_arms_a_zero_duration_stall_timer_for_running_jobs() {
        let mut state = MaterializedState::new();
        let mut job = sample_job("job-1", JobKind::FileProcessing, "dataset-1");
        job.status = JobStatus::Running;
        state.jobs.insert(job.id.as_str().to_string(), job);

        let mut scheduler = Scheduler::new();
        reap_orphaned_reservations(&state, &mut scheduler);
        assert!(scheduler.has_timers());
    }

    #[test]
    fn reap_orphaned_reservations_leaves_non_running_jobs_alone() {
        let state = MaterializedState::new();
        let mut scheduler = Scheduler::new();
        reap_orphaned_reservations(&state, &mut scheduler);
        assert!(!scheduler.has_timers());
    }
}
