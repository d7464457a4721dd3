// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker pools: one tokio task fleet per job kind, each pulling a
//! reservation off the queue substrate, running the matching stage
//! processor, and acking/nacking the result through the [`Executor`]. A
//! second maintenance task sweeps fired stall timers.

use std::sync::Arc;
use std::time::Duration;

use redactflow_core::{Clock, Job, JobId, JobKind, JobStatus, StageError, StageErrorKind};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::effect::Effect;
use crate::executor::Executor;
use crate::processors::{
    process_anonymization, process_file_processing, process_pii_analysis, process_text_extraction, ProcessorDeps,
};
use crate::queue::{self, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY, DEFAULT_STALL_WINDOW};

/// Worker tasks run per job kind, absent an explicit override.
pub const DEFAULT_CONCURRENCY_PER_QUEUE: usize = 5;
/// A job that hasn't finished within this long is failed with
/// [`StageErrorKind::Timeout`] regardless of what it was waiting on.
pub const DEFAULT_HARD_TIMEOUT: Duration = Duration::from_secs(30 * 60);

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);
const STALL_SWEEP_INTERVAL: Duration = Duration::from_millis(200);

/// Picks the next ready job of `kind`: queued, highest priority first,
/// oldest within a tier, skipping jobs whose retry backoff hasn't elapsed
/// yet (their `retry-delay:` timer is still armed on the scheduler).
fn reserve_ready<C: Clock>(executor: &Executor<C>, kind: JobKind) -> Option<Job> {
    let state = executor.state();
    let state = state.lock();
    let scheduler = executor.scheduler();
    let scheduler = scheduler.lock();
    state
        .jobs
        .values()
        .filter(|j| j.kind == kind && j.status == JobStatus::Queued)
        .filter(|j| !scheduler.is_armed(&format!("retry-delay:{}", j.id)))
        .min_by_key(|j| (std::cmp::Reverse(j.priority), j.created_at_epoch_ms))
        .cloned()
}

fn cancel_requested<C: Clock>(executor: &Executor<C>, job_id: &JobId) -> bool {
    let state = executor.state();
    let state = state.lock();
    state.jobs.get(job_id.as_str()).map(|j| j.cancel_requested).unwrap_or(false)
}

async fn run_processor<C: Clock>(
    deps: &ProcessorDeps<C>,
    executor: &Executor<C>,
    kind: JobKind,
    job: &Job,
) -> Result<Vec<Effect>, StageError> {
    // MaterializedState is behind a `parking_lot::Mutex`, whose guard isn't
    // `Send`; clone a snapshot so the lock never has to cross an `.await`.
    let snapshot = {
        let state = executor.state();
        let state = state.lock();
        state.clone()
    };
    match kind {
        JobKind::FileProcessing => process_file_processing(deps, &snapshot, job).await,
        JobKind::TextExtraction => process_text_extraction(deps, &snapshot, job).await,
        JobKind::PiiAnalysis => process_pii_analysis(deps, &snapshot, job).await,
        JobKind::Anonymization => process_anonymization(deps, &snapshot, job).await,
    }
}

/// Reserves and runs at most one job of `kind`. Returns `true` if a job was
/// found (whether it then succeeded, failed, or was cancelled).
pub async fn run_one<C: Clock>(executor: &Executor<C>, deps: &ProcessorDeps<C>, kind: JobKind, hard_timeout: Duration) -> bool {
    let Some(job) = reserve_ready(executor, kind) else {
        return false;
    };

    let now = executor.clock().now_epoch_ms();
    let _ = executor
        .execute_all(queue::reservation_effects(job.id.clone(), "worker".to_string(), now, DEFAULT_STALL_WINDOW))
        .await;

    if cancel_requested(executor, &job.id) {
        let now = executor.clock().now_epoch_ms();
        let _ = executor
            .execute(Effect::Emit {
                event: redactflow_core::Event::JobCancelled { job_id: job.id.clone(), ended_at_epoch_ms: now },
            })
            .await;
        return true;
    }

    let outcome = timeout(hard_timeout, run_processor(deps, executor, kind, &job)).await;
    let now = executor.clock().now_epoch_ms();
    match outcome {
        Ok(Ok(effects)) => {
            let _ = executor.execute_all(effects).await;
            let _ = executor.execute_all(queue::ack_effects(job.id.clone(), now)).await;
        }
        Ok(Err(error)) => {
            let _ = executor
                .execute_all(queue::nack_effects(&job, &error, now, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY))
                .await;
        }
        Err(_elapsed) => {
            let error = StageError::new(StageErrorKind::Timeout, "job exceeded its hard timeout");
            let _ = executor
                .execute_all(queue::nack_effects(&job, &error, now, DEFAULT_RETRY_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY))
                .await;
        }
    }
    true
}

/// Sweeps fired stall timers and emits the corresponding stall effects.
/// `retry-delay:` timers need no action here; their firing already lifted
/// the gate in [`reserve_ready`] by leaving the scheduler.
async fn sweep_stalls<C: Clock>(executor: &Executor<C>) {
    let fired = {
        let scheduler = executor.scheduler();
        let mut scheduler = scheduler.lock();
        let now = executor.clock().now();
        scheduler.fired_timers(now)
    };
    for id in fired {
        let Some(job_id) = id.strip_prefix("stall:") else { continue };
        let job = {
            let state = executor.state();
            let state = state.lock();
            state.jobs.get(job_id).cloned()
        };
        if let Some(job) = job {
            let now = executor.clock().now_epoch_ms();
            let _ = executor.execute_all(queue::stall_effects(&job, now)).await;
        }
    }
}

const QUEUE_KINDS: [JobKind; 4] =
    [JobKind::FileProcessing, JobKind::TextExtraction, JobKind::PiiAnalysis, JobKind::Anonymization];

/// A fleet of worker tasks, one per job kind, plus a stall-sweeping
/// maintenance task. Dropping the handle does not stop the tasks; call
/// [`WorkerPool::shutdown`] to do that.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    pub fn spawn<C: Clock + 'static>(
        executor: Arc<Executor<C>>,
        deps: Arc<ProcessorDeps<C>>,
        concurrency: usize,
        hard_timeout: Duration,
    ) -> Self {
        let cancel = CancellationToken::new();
        let mut handles = Vec::new();

        for kind in QUEUE_KINDS {
            for _ in 0..concurrency {
                let executor = Arc::clone(&executor);
                let deps = Arc::clone(&deps);
                let cancel = cancel.clone();
                handles.push(tokio::spawn(async move {
                    loop {
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            ran = run_one(executor.as_ref(), deps.as_ref(), kind, hard_timeout) => {
                                if !ran {
                                    tokio::select! {
                                        _ = cancel.cancelled() => break,
                                        _ = tokio::time::sleep(IDLE_POLL_INTERVAL) => {}
                                    }
                                }
                            }
                        }
                    }
                }));
            }
        }

        {
            let executor = Arc::clone(&executor);
            let cancel = cancel.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(STALL_SWEEP_INTERVAL) => {}
                    }
                    sweep_stalls(executor.as_ref()).await;
                }
            }));
        }

        Self { handles, cancel }
    }

    /// Signals every task to stop and waits for them to exit.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
