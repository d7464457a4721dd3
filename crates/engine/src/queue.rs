// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue substrate: reservation, acknowledgement, negative-acknowledgement
//! (retry or dead-letter), and stall detection. One durable queue per job
//! kind, materialized from the job events in [`redactflow_core::Event`].

use std::time::Duration;

use redactflow_core::{DatasetStatus, Event, IdGen, Job, JobId, JobKind, JobStatus, StageError, StageErrorKind};
use redactflow_storage::MaterializedState;

use crate::backoff::backoff_delay;
use crate::effect::Effect;

pub const DEFAULT_STALL_WINDOW: Duration = Duration::from_secs(30);
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 3;
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_secs(5);

fn stall_timer_id(job_id: &JobId) -> String {
    format!("stall:{job_id}")
}

/// Picks the next queued job of `kind` to run: highest priority first,
/// oldest within a priority tier.
pub fn reserve_next(state: &MaterializedState, kind: JobKind) -> Option<Job> {
    state
        .jobs
        .values()
        .filter(|j| j.kind == kind && j.status == JobStatus::Queued)
        .min_by_key(|j| (std::cmp::Reverse(j.priority), j.created_at_epoch_ms))
        .cloned()
}

/// Effects to record a reservation: marks the job Running and arms the stall
/// timer for the configured window.
pub fn reservation_effects(job_id: JobId, worker_id: String, now_epoch_ms: i64, stall_window: Duration) -> Vec<Effect> {
    vec![
        Effect::Emit {
            event: Event::JobReserved {
                job_id: job_id.clone(),
                worker_id,
                reserved_until_epoch_ms: now_epoch_ms + stall_window.as_millis() as i64,
                started_at_epoch_ms: now_epoch_ms,
            },
        },
        Effect::SetTimer {
            id: stall_timer_id(&job_id),
            duration: stall_window,
        },
    ]
}

/// Effects for a successful completion: marks the job Completed and
/// disarms its stall timer.
pub fn ack_effects(job_id: JobId, now_epoch_ms: i64) -> Vec<Effect> {
    vec![
        Effect::CancelTimer { id: stall_timer_id(&job_id) },
        Effect::Emit { event: Event::JobCompleted { job_id, ended_at_epoch_ms: now_epoch_ms } },
    ]
}

/// Effects for a failed attempt: retries with backoff up to
/// `max_attempts` if the error kind is retriable, otherwise fails the job.
pub fn nack_effects(job: &Job, error: &StageError, now_epoch_ms: i64, max_attempts: u32, base_delay: Duration) -> Vec<Effect> {
    let cancel_stall = Effect::CancelTimer { id: stall_timer_id(&job.id) };
    if error.is_retriable() && job.attempt + 1 < max_attempts {
        let next_attempt = job.attempt + 1;
        let delay = backoff_delay(base_delay, next_attempt);
        vec![
            cancel_stall,
            Effect::Emit {
                event: Event::JobRequeued { job_id: job.id.clone(), attempt: next_attempt },
            },
            Effect::SetTimer {
                id: format!("retry-delay:{}", job.id),
                duration: delay,
            },
        ]
    } else {
        vec![
            cancel_stall,
            Effect::Emit {
                event: Event::JobFailed {
                    job_id: job.id.clone(),
                    kind: error.kind,
                    error: error.message.clone(),
                    ended_at_epoch_ms: now_epoch_ms,
                },
            },
        ]
    }
}

/// Whether `job`'s reservation has outlived the stall window.
pub fn is_stalled(job: &Job, now_epoch_ms: i64) -> bool {
    matches!(job.reserved_until_epoch_ms, Some(deadline) if now_epoch_ms > deadline)
}

/// Effects when a reservation stalls: a repeat stall (`stall_count >= 1`
/// already recorded) fails the job outright; a first stall requeues it for
/// another worker to pick up.
pub fn stall_effects(job: &Job, now_epoch_ms: i64) -> Vec<Effect> {
    if job.stall_count >= 1 {
        vec![Effect::Emit {
            event: Event::JobFailed {
                job_id: job.id.clone(),
                kind: StageErrorKind::Stalled,
                error: "job stalled more than once".to_string(),
                ended_at_epoch_ms: now_epoch_ms,
            },
        }]
    } else {
        vec![Effect::Emit { event: Event::JobStalled { job_id: job.id.clone() } }]
    }
}

/// Effects to request cooperative cancellation of `job`.
pub fn cancel_request_effects(job_id: JobId) -> Vec<Effect> {
    vec![Effect::Emit { event: Event::JobCancelRequested { job_id } }]
}

/// Builds the `retry(job)` successor job and its enqueue effect, using
/// `id_gen` for the new job id.
///
/// When the dataset is currently `Failed`, its status resets to `Pending` so
/// the retried job can drive it forward again; a dataset still mid-flight
/// (e.g. another of its jobs is still running) is left alone, since nothing
/// about retrying one job implies the dataset itself needs to roll back.
pub fn retry_effects(job: &Job, dataset_status: Option<DatasetStatus>, id_gen: &dyn IdGen, now_epoch_ms: i64) -> (Job, Vec<Effect>) {
    let new_id = id_gen.next_job_id();
    let successor = job.retry_successor(new_id, now_epoch_ms);
    let mut effects = vec![Effect::Emit { event: Event::JobEnqueued { job: successor.clone() } }];
    if dataset_status == Some(DatasetStatus::Failed) {
        effects.push(Effect::Emit {
            event: Event::DatasetStatusChanged {
                dataset_id: job.dataset_id.clone(),
                status: DatasetStatus::Pending,
                at_epoch_ms: now_epoch_ms,
            },
        });
    }
    (successor, effects)
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
