// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state from WAL replay. Every mutator here must be
//! idempotent: re-applying the same event twice (as at-least-once delivery
//! guarantees we might) must leave the state unchanged the second time.
//! Prefer assignment over mutation, guard inserts with existence checks, and
//! guard counters with a transition check rather than an unconditional
//! increment.

use std::collections::HashMap;

use redactflow_core::{
    AuditEntry, Dataset, DatasetStatus, Event, Finding, Job, JobStatus, Notification,
};

#[derive(Debug, Default, Clone)]
pub struct MaterializedState {
    pub datasets: HashMap<String, Dataset>,
    pub jobs: HashMap<String, Job>,
    pub findings: HashMap<String, Vec<Finding>>,
    pub notifications: HashMap<String, Notification>,
    pub audit_log: Vec<AuditEntry>,
    pub anonymized_outputs: HashMap<String, Vec<String>>,
}

impl MaterializedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::DatasetCreated { dataset } => {
                self.datasets
                    .entry(dataset.id.as_str().to_string())
                    .or_insert_with(|| dataset.clone());
            }
            Event::DatasetStatusChanged { dataset_id, status, .. } => {
                if let Some(dataset) = self.datasets.get_mut(dataset_id.as_str()) {
                    dataset.status = *status;
                }
            }
            Event::DatasetMetadataMerged { dataset_id, metadata } => {
                if let Some(dataset) = self.datasets.get_mut(dataset_id.as_str()) {
                    dataset.metadata = metadata.clone();
                }
            }
            Event::JobEnqueued { job } => {
                self.jobs
                    .entry(job.id.as_str().to_string())
                    .or_insert_with(|| job.clone());
            }
            Event::JobReserved {
                job_id,
                worker_id,
                reserved_until_epoch_ms,
                started_at_epoch_ms,
            } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    if job.status == JobStatus::Queued {
                        job.status = JobStatus::Running;
                        job.started_at_epoch_ms.get_or_insert(*started_at_epoch_ms);
                    }
                    job.worker_id = Some(worker_id.clone());
                    job.reserved_until_epoch_ms = Some(*reserved_until_epoch_ms);
                }
            }
            Event::JobProgress { job_id, progress } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    // Monotonic per the progress invariant: never move backwards.
                    if *progress > job.progress {
                        job.progress = *progress;
                    }
                }
            }
            Event::JobCompleted { job_id, ended_at_epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    job.status = JobStatus::Completed;
                    job.progress = 100;
                    job.ended_at_epoch_ms = Some(*ended_at_epoch_ms);
                    job.worker_id = None;
                    job.reserved_until_epoch_ms = None;
                }
            }
            Event::JobFailed { job_id, error, ended_at_epoch_ms, .. } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    job.status = JobStatus::Failed;
                    job.error = Some(error.clone());
                    job.ended_at_epoch_ms = Some(*ended_at_epoch_ms);
                    job.worker_id = None;
                    job.reserved_until_epoch_ms = None;
                }
            }
            Event::JobRequeued { job_id, attempt } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    job.status = JobStatus::Queued;
                    job.attempt = *attempt;
                    job.worker_id = None;
                    job.reserved_until_epoch_ms = None;
                }
            }
            Event::JobStalled { job_id } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    job.status = JobStatus::Queued;
                    job.stall_count += 1;
                    job.worker_id = None;
                    job.reserved_until_epoch_ms = None;
                }
            }
            Event::JobCancelRequested { job_id } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    if job.status == JobStatus::Queued {
                        job.status = JobStatus::Cancelled;
                    } else {
                        job.cancel_requested = true;
                    }
                }
            }
            Event::JobCancelled { job_id, ended_at_epoch_ms } => {
                if let Some(job) = self.jobs.get_mut(job_id.as_str()) {
                    job.status = JobStatus::Cancelled;
                    job.ended_at_epoch_ms = Some(*ended_at_epoch_ms);
                    job.worker_id = None;
                    job.reserved_until_epoch_ms = None;
                }
            }
            Event::FindingsPersisted { dataset_id, findings } => {
                let existing = self
                    .findings
                    .entry(dataset_id.as_str().to_string())
                    .or_default();
                for finding in findings {
                    let key = finding.natural_key();
                    if let Some(slot) = existing
                        .iter_mut()
                        .find(|f| f.natural_key() == key)
                    {
                        *slot = finding.clone();
                    } else {
                        existing.push(finding.clone());
                    }
                }
                existing.sort_by_key(|f| (f.start, f.end));
                if let Some(dataset) = self.datasets.get_mut(dataset_id.as_str()) {
                    dataset.findings_count = existing.len() as u32;
                }
            }
            Event::AnonymizationWritten { dataset_id, output_paths } => {
                self.anonymized_outputs
                    .insert(dataset_id.as_str().to_string(), output_paths.clone());
                if let Some(dataset) = self.datasets.get_mut(dataset_id.as_str()) {
                    dataset.output_paths = output_paths.clone();
                }
            }
            Event::AuditRecorded { entry } => {
                self.audit_log.push(entry.clone());
            }
            Event::NotificationCreated { notification } => {
                self.notifications
                    .entry(notification.id.as_str().to_string())
                    .or_insert_with(|| notification.clone());
            }
            Event::NotificationRead { notification_id } => {
                if let Some(notification) = self.notifications.get_mut(notification_id.as_str()) {
                    notification.read = true;
                }
            }
            Event::NotificationsPurged { before_epoch_ms } => {
                self.notifications
                    .retain(|_, n| n.created_at_epoch_ms >= *before_epoch_ms);
            }
        }
    }

    /// Dataset-level status is the max-progress of its non-failed
    /// non-cancelled jobs; a Failed job on a dataset transitions the dataset
    /// to Failed unless a sibling active job exists.
    pub fn derive_dataset_status(&self, dataset_id: &str) -> Option<DatasetStatus> {
        let jobs: Vec<&Job> = self
            .jobs
            .values()
            .filter(|j| j.dataset_id.as_str() == dataset_id)
            .collect();
        if jobs.is_empty() {
            return self.datasets.get(dataset_id).map(|d| d.status);
        }
        let any_active = jobs
            .iter()
            .any(|j| !matches!(j.status, JobStatus::Failed | JobStatus::Cancelled));
        if let Some(failed) = jobs.iter().find(|j| j.status == JobStatus::Failed) {
            if !any_active || jobs.iter().all(|j| j.status == JobStatus::Failed) {
                let _ = failed;
                return Some(DatasetStatus::Failed);
            }
        }
        self.datasets.get(dataset_id).map(|d| d.status)
    }

    pub fn findings_for(&self, dataset_id: &str) -> &[Finding] {
        self.findings
            .get(dataset_id)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
