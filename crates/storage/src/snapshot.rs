// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Periodic snapshots of [`MaterializedState`] so startup doesn't have to
//! replay the WAL from the beginning of time. A snapshot records the WAL
//! sequence it covers; recovery loads the snapshot then replays only the
//! entries after that sequence.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};

use redactflow_core::{Dataset, Finding, Job, Notification};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::state::MaterializedState;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to (de)serialize snapshot: {0}")]
    Serde(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub covers_up_to_seq: u64,
    pub datasets: Vec<Dataset>,
    pub jobs: Vec<Job>,
    pub findings: Vec<Finding>,
    pub notifications: Vec<Notification>,
}

impl Snapshot {
    pub fn from_state(state: &MaterializedState, covers_up_to_seq: u64) -> Self {
        Self {
            covers_up_to_seq,
            datasets: state.datasets.values().cloned().collect(),
            jobs: state.jobs.values().cloned().collect(),
            findings: state.findings.values().flatten().cloned().collect(),
            notifications: state.notifications.values().cloned().collect(),
        }
    }

    pub fn into_state(self) -> MaterializedState {
        let mut state = MaterializedState::new();
        for dataset in self.datasets {
            state.datasets.insert(dataset.id.as_str().to_string(), dataset);
        }
        for job in self.jobs {
            state.jobs.insert(job.id.as_str().to_string(), job);
        }
        for finding in self.findings {
            state
                .findings
                .entry(finding.dataset_id.as_str().to_string())
                .or_default()
                .push(finding);
        }
        for notification in self.notifications {
            state
                .notifications
                .insert(notification.id.as_str().to_string(), notification);
        }
        for findings in state.findings.values_mut() {
            findings.sort_by_key(|f| (f.start, f.end));
        }
        state
    }

    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<(), SnapshotError> {
        let path = path.as_ref();
        let tmp_path = tmp_path_for(path);
        {
            let file = File::create(&tmp_path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer(writer, self)?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn read_from(path: impl AsRef<Path>) -> Result<Option<Self>, SnapshotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        Ok(Some(serde_json::from_reader(reader)?))
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    path.with_extension("snapshot.tmp")
}

#[cfg(test)]
#[path = "snapshot_tests.rs"]
mod tests;
