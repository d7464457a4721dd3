// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job identifier and state machine.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::{AttemptId, DatasetId, JobId, PolicyId, ProjectId, UserId};

/// Which pipeline stage this job executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum JobKind {
    FileProcessing,
    TextExtraction,
    PiiAnalysis,
    Anonymization,
}

impl JobKind {
    /// The stage that must complete successfully before this one may run.
    pub fn predecessor(self) -> Option<JobKind> {
        match self {
            JobKind::FileProcessing => None,
            JobKind::TextExtraction => Some(JobKind::FileProcessing),
            JobKind::PiiAnalysis => Some(JobKind::TextExtraction),
            JobKind::Anonymization => Some(JobKind::PiiAnalysis),
        }
    }

    pub fn successor(self) -> Option<JobKind> {
        match self {
            JobKind::FileProcessing => Some(JobKind::TextExtraction),
            JobKind::TextExtraction => Some(JobKind::PiiAnalysis),
            JobKind::PiiAnalysis => Some(JobKind::Anonymization),
            JobKind::Anonymization => None,
        }
    }
}

/// Lifecycle status of one job. See the state machine in the job processing
/// design notes: Queued -> Running -> {Completed, Failed, Cancelled}, with
/// Running able to return to Queued on a retriable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    Queued,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled
        )
    }
}

/// Free-form retry/lineage metadata carried by a job, plus an open-ended
/// string/number/bool extension map (see the design note on replacing
/// dynamic "any" payloads with a tagged core plus a bounded extension map).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobMetadata {
    #[serde(default)]
    pub is_retry: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_job_id: Option<JobId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_attempt: Option<u32>,
    #[serde(default, flatten)]
    pub extra: HashMap<String, MetadataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Str(String),
    Num(f64),
    Bool(bool),
}

/// A unit of work on one stage of one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub kind: JobKind,
    pub status: JobStatus,
    pub priority: i32,
    pub progress: u8,
    pub attempt: u32,
    pub dataset_id: DatasetId,
    pub project_id: Option<ProjectId>,
    pub creator_id: UserId,
    pub policy_id: Option<PolicyId>,
    pub created_at_epoch_ms: i64,
    pub started_at_epoch_ms: Option<i64>,
    pub ended_at_epoch_ms: Option<i64>,
    pub error: Option<String>,
    pub metadata: JobMetadata,
    pub cancel_requested: bool,
    pub worker_id: Option<String>,
    pub reserved_until_epoch_ms: Option<i64>,
    pub stall_count: u32,
}

impl Job {
    pub fn new(
        id: JobId,
        kind: JobKind,
        dataset_id: DatasetId,
        creator_id: UserId,
        priority: i32,
        created_at_epoch_ms: i64,
    ) -> Self {
        Self {
            id,
            kind,
            status: JobStatus::Queued,
            priority,
            progress: 0,
            attempt: 0,
            dataset_id,
            project_id: None,
            creator_id,
            policy_id: None,
            created_at_epoch_ms,
            started_at_epoch_ms: None,
            ended_at_epoch_ms: None,
            error: None,
            metadata: JobMetadata::default(),
            cancel_requested: false,
            worker_id: None,
            reserved_until_epoch_ms: None,
            stall_count: 0,
        }
    }

    /// Builds the `retry(job)` successor per the retry metadata invariant:
    /// `metadata.originalJobId = job.id`, `metadata.retryAttempt =
    /// (job.metadata.retryAttempt ?? 0) + 1`.
    pub fn retry_successor(&self, new_id: JobId, created_at_epoch_ms: i64) -> Self {
        let retry_attempt = self.metadata.retry_attempt.unwrap_or(0) + 1;
        let original_job_id = self
            .metadata
            .original_job_id
            .clone()
            .unwrap_or_else(|| self.id.clone());
        Self {
            id: new_id,
            kind: self.kind,
            status: JobStatus::Queued,
            priority: self.priority,
            progress: 0,
            attempt: 0,
            dataset_id: self.dataset_id.clone(),
            project_id: self.project_id.clone(),
            creator_id: self.creator_id.clone(),
            policy_id: self.policy_id.clone(),
            created_at_epoch_ms,
            started_at_epoch_ms: None,
            ended_at_epoch_ms: None,
            error: None,
            metadata: JobMetadata {
                is_retry: true,
                original_job_id: Some(original_job_id),
                retry_attempt: Some(retry_attempt),
                extra: HashMap::new(),
            },
            cancel_requested: false,
            worker_id: None,
            reserved_until_epoch_ms: None,
            stall_count: 0,
        }
    }

    pub fn attempt_id(&self) -> AttemptId {
        AttemptId::new(format!("{}:{}", self.id, self.attempt))
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
