// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Background retention: keeps only the most recent terminal jobs per kind
//! so the job table doesn't grow without bound.

use redactflow_core::{JobId, JobKind, JobStatus};
use redactflow_storage::MaterializedState;

pub const KEEP_LAST_COMPLETED: usize = 100;
pub const KEEP_LAST_FAILED: usize = 50;

/// Ids of completed/failed jobs that fall outside the retention window for
/// their `(kind, status)` bucket, oldest first. Cancelled jobs are never
/// purged by this pass — they're rare enough not to need it and a caller
/// may still want to audit why a job was cancelled.
pub fn jobs_to_purge(state: &MaterializedState) -> Vec<JobId> {
    let mut to_purge = Vec::new();
    for kind in [JobKind::FileProcessing, JobKind::TextExtraction, JobKind::PiiAnalysis, JobKind::Anonymization] {
        to_purge.extend(purge_bucket(state, kind, JobStatus::Completed, KEEP_LAST_COMPLETED));
        to_purge.extend(purge_bucket(state, kind, JobStatus::Failed, KEEP_LAST_FAILED));
    }
    to_purge
}

fn purge_bucket(state: &MaterializedState, kind: JobKind, status: JobStatus, keep: usize) -> Vec<JobId> {
    let mut matching: Vec<_> = state
        .jobs
        .values()
        .filter(|j| j.kind == kind && j.status == status)
        .collect();
    matching.sort_by_key(|j| std::cmp::Reverse(j.ended_at_epoch_ms.unwrap_or(j.created_at_epoch_ms)));
    matching.into_iter().skip(keep).map(|j| j.id.clone()).collect()
}
