// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The append-only event log. Events are facts that happened; state is
//! derived from replaying them (see `MaterializedState::apply_event` in the
//! storage crate). Handlers must be idempotent: use assignment instead of
//! mutation, guard inserts with existence checks, guard increments with a
//! transition check.

use serde::{Deserialize, Serialize};

use crate::audit::AuditEntry;
use crate::dataset::{Dataset, DatasetMetadata, DatasetStatus};
use crate::error::StageErrorKind;
use crate::finding::Finding;
use crate::id::{DatasetId, JobId, NotificationId};
use crate::job::Job;
use crate::notification::Notification;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum Event {
    DatasetCreated {
        dataset: Dataset,
    },
    DatasetStatusChanged {
        dataset_id: DatasetId,
        status: DatasetStatus,
        at_epoch_ms: i64,
    },
    DatasetMetadataMerged {
        dataset_id: DatasetId,
        metadata: DatasetMetadata,
    },
    JobEnqueued {
        job: Job,
    },
    JobReserved {
        job_id: JobId,
        worker_id: String,
        reserved_until_epoch_ms: i64,
        started_at_epoch_ms: i64,
    },
    JobProgress {
        job_id: JobId,
        progress: u8,
    },
    JobCompleted {
        job_id: JobId,
        ended_at_epoch_ms: i64,
    },
    JobFailed {
        job_id: JobId,
        kind: StageErrorKind,
        error: String,
        ended_at_epoch_ms: i64,
    },
    JobRequeued {
        job_id: JobId,
        attempt: u32,
    },
    JobStalled {
        job_id: JobId,
    },
    JobCancelRequested {
        job_id: JobId,
    },
    JobCancelled {
        job_id: JobId,
        ended_at_epoch_ms: i64,
    },
    FindingsPersisted {
        dataset_id: DatasetId,
        findings: Vec<Finding>,
    },
    AnonymizationWritten {
        dataset_id: DatasetId,
        output_paths: Vec<String>,
    },
    AuditRecorded {
        entry: AuditEntry,
    },
    NotificationCreated {
        notification: Notification,
    },
    NotificationRead {
        notification_id: NotificationId,
    },
    NotificationsPurged {
        before_epoch_ms: i64,
    },
}

impl Event {
    /// Name used for tracing spans and log lines, mirroring how the engine
    /// names effects.
    pub fn name(&self) -> &'static str {
        match self {
            Event::DatasetCreated { .. } => "dataset_created",
            Event::DatasetStatusChanged { .. } => "dataset_status_changed",
            Event::DatasetMetadataMerged { .. } => "dataset_metadata_merged",
            Event::JobEnqueued { .. } => "job_enqueued",
            Event::JobReserved { .. } => "job_reserved",
            Event::JobProgress { .. } => "job_progress",
            Event::JobCompleted { .. } => "job_completed",
            Event::JobFailed { .. } => "job_failed",
            Event::JobRequeued { .. } => "job_requeued",
            Event::JobStalled { .. } => "job_stalled",
            Event::JobCancelRequested { .. } => "job_cancel_requested",
            Event::JobCancelled { .. } => "job_cancelled",
            Event::FindingsPersisted { .. } => "findings_persisted",
            Event::AnonymizationWritten { .. } => "anonymization_written",
            Event::AuditRecorded { .. } => "audit_recorded",
            Event::NotificationCreated { .. } => "notification_created",
            Event::NotificationRead { .. } => "notification_read",
            Event::NotificationsPurged { .. } => "notifications_purged",
        }
    }
}
