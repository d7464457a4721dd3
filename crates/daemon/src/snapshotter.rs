// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic snapshotting so startup doesn't replay the WAL from the
//! beginning of time. Mirrors the teacher's checkpointer's ordering
//! guarantee — the snapshot must be durable on disk before the WAL is
//! truncated — without its background thread or compression: our
//! `Snapshot::write_to` already does a single synchronous write-then-rename,
//! cheap enough to run straight on the tokio task that schedules it.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use redactflow_storage::{MaterializedState, Snapshot, Wal};
use tracing::{error, info};

/// Runs until the process exits, writing a snapshot and truncating the WAL
/// up to the sequence it covers on every tick.
pub async fn run_snapshotter(
    state: Arc<Mutex<MaterializedState>>,
    wal: Arc<Mutex<Wal>>,
    snapshot_path: std::path::PathBuf,
    interval: Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.tick().await; // first tick fires immediately; skip it
    loop {
        ticker.tick().await;
        if let Err(err) = checkpoint_once(&state, &wal, &snapshot_path) {
            error!(%err, "periodic snapshot failed");
        }
    }
}

fn checkpoint_once(
    state: &Arc<Mutex<MaterializedState>>,
    wal: &Arc<Mutex<Wal>>,
    snapshot_path: &std::path::Path,
) -> Result<(), redactflow_storage::SnapshotError> {
    let covers_up_to_seq = wal.lock().processed_seq();
    let snapshot = {
        let state = state.lock();
        Snapshot::from_state(&state, covers_up_to_seq)
    };
    snapshot.write_to(snapshot_path)?;
    if let Err(err) = wal.lock().truncate_before(covers_up_to_seq) {
        error!(%err, "snapshot written but write-ahead log truncation failed");
    } else {
        info!(covers_up_to_seq, "wrote snapshot and truncated write-ahead log");
    }
    Ok(())
}
