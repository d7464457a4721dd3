// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bridges the durable event log to the push-based fan-out. Every event
//! applied through the executor — whether from an API request or a worker's
//! stage transition — arrives here over the broadcast channel the executor
//! was built with, after it's already durable. This is the only place
//! pipeline events cross into [`FanoutEvent`] frames.

use std::sync::Arc;

use parking_lot::Mutex;
use redactflow_core::{DatasetUpdateData, Event, FanoutEvent, JobStatusData, NotificationData};
use redactflow_storage::MaterializedState;
use tokio::sync::broadcast;
use tracing::warn;

use crate::fanout::FanoutRegistry;

/// Runs until the sending half is dropped (daemon shutdown) or this
/// subscriber falls too far behind and is lagged-closed by the broadcast
/// channel, at which point it simply stops — the fan-out is best-effort and
/// a lagged subscriber has already missed frames it can't recover anyway.
pub async fn run_pump(mut events: broadcast::Receiver<Event>, state: Arc<Mutex<MaterializedState>>, fanout: FanoutRegistry) {
    loop {
        match events.recv().await {
            Ok(event) => {
                if let Some(frame_event) = to_fanout_event(&event, &state) {
                    fanout.publish(frame_event);
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "fan-out pump lagged behind the event log; frames were dropped");
            }
            Err(broadcast::error::RecvError::Closed) => return,
        }
    }
}

/// Maps one applied domain event onto the fan-out's wire-facing event kinds.
/// Events with no subscriber-relevant projection (audit entries, metadata
/// merges) return `None`.
fn to_fanout_event(event: &Event, state: &Mutex<MaterializedState>) -> Option<FanoutEvent> {
    match event {
        Event::JobEnqueued { job } => Some(FanoutEvent::JobStatus(JobStatusData {
            job_id: job.id.clone(),
            status: job.status,
            progress: job.progress,
            message: None,
        })),
        Event::JobReserved { job_id, .. }
        | Event::JobProgress { job_id, .. }
        | Event::JobCompleted { job_id, .. }
        | Event::JobRequeued { job_id, .. }
        | Event::JobStalled { job_id }
        | Event::JobCancelled { job_id, .. } => job_status_frame(job_id, state, None),
        Event::JobFailed { job_id, error, .. } => job_status_frame(job_id, state, Some(error.clone())),
        Event::DatasetStatusChanged { dataset_id, status, .. } => {
            let findings_count = state.lock().datasets.get(dataset_id.as_str()).map(|d| d.findings_count).unwrap_or(0);
            Some(FanoutEvent::DatasetUpdate(DatasetUpdateData {
                dataset_id: dataset_id.clone(),
                status: *status,
                findings_count,
            }))
        }
        Event::NotificationCreated { notification } => Some(FanoutEvent::Notification(NotificationData {
            id: notification.id.clone(),
            title: notification.title.clone(),
            message: notification.message.clone(),
            kind: notification.kind,
        })),
        _ => None,
    }
}

fn job_status_frame(job_id: &redactflow_core::JobId, state: &Mutex<MaterializedState>, message: Option<String>) -> Option<FanoutEvent> {
    let state = state.lock();
    let job = state.jobs.get(job_id.as_str())?;
    Some(FanoutEvent::JobStatus(JobStatusData {
        job_id: job.id.clone(),
        status: job.status,
        progress: job.progress,
        message,
    }))
}

/// A system-wide status frame, broadcast outside the per-event pump (e.g. on
/// startup or shutdown).
pub fn system_status(fanout: &FanoutRegistry, message: impl Into<String>) {
    fanout.publish(FanoutEvent::SystemStatus(redactflow_core::SystemStatusData { message: message.into() }));
}
