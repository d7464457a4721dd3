// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The HTTP surface: enqueue/cancel/retry for jobs, status reads for jobs
//! and datasets, and the `/events` SSE stream. CRUD controllers for
//! projects, users, and report templates are an explicit non-goal (see
//! purpose & scope) — this is only the inbound enqueue contract, the
//! outbound status contract, and the outbound event contract.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::sse::{Event as SseEvent, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::Stream;
use parking_lot::Mutex;
use redactflow_core::{
    AllowAll, AuditEntry, AuthGuard, Clock, Dataset, DatasetId, DatasetStatus, Event, FanoutEvent,
    IdGen, Job, JobId, JobKind, JobStatus, OwnerId, PolicyId, Principal, ProjectId, ResourceRef,
    SystemClock, UserId, UuidIdGen,
};
use redactflow_engine::{cancel_request_effects, retry_effects, Effect, ExecuteError, Executor};
use redactflow_storage::MaterializedState;
use serde::{Deserialize, Serialize};

use crate::fanout::FanoutRegistry;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<Executor<SystemClock>>,
    pub state: Arc<Mutex<MaterializedState>>,
    pub fanout: FanoutRegistry,
    pub id_gen: Arc<UuidIdGen>,
    pub auth: Arc<dyn AuthGuard>,
    pub max_queue_depth: usize,
}

/// Default `worker.queue.maxDepth` per the backpressure model: 1000 waiting
/// jobs per queue before enqueues fail fast with `kind=queue_full`.
pub const DEFAULT_MAX_QUEUE_DEPTH: usize = 1000;

impl AppState {
    pub fn new(executor: Arc<Executor<SystemClock>>, state: Arc<Mutex<MaterializedState>>, fanout: FanoutRegistry, id_gen: Arc<UuidIdGen>) -> Self {
        Self {
            executor,
            state,
            fanout,
            id_gen,
            auth: Arc::new(AllowAll),
            max_queue_depth: DEFAULT_MAX_QUEUE_DEPTH,
        }
    }

    pub fn with_max_queue_depth(mut self, max_queue_depth: usize) -> Self {
        self.max_queue_depth = max_queue_depth;
        self
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/v1/datasets", post(enqueue_file_processing))
        .route("/v1/jobs/:job_id", get(get_job))
        .route("/v1/jobs/:job_id/cancel", post(cancel_job))
        .route("/v1/jobs/:job_id/retry", post(retry_job))
        .route("/v1/datasets/:dataset_id", get(get_dataset))
        .route("/v1/events", get(events_stream))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueFileProcessingRequest {
    pub job_id: Option<String>,
    pub user_id: String,
    pub project_id: Option<String>,
    pub dataset_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    pub policy_id: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueFileProcessingResponse {
    pub job_id: String,
    pub dataset_id: String,
}

async fn enqueue_file_processing(
    State(state): State<AppState>,
    Json(req): Json<EnqueueFileProcessingRequest>,
) -> Result<(StatusCode, Json<EnqueueFileProcessingResponse>), ApiError> {
    let queued = state
        .state
        .lock()
        .jobs
        .values()
        .filter(|j| j.kind == JobKind::FileProcessing && j.status == JobStatus::Queued)
        .count();
    if queued >= state.max_queue_depth {
        return Err(ApiError::QueueFull);
    }

    let now = state.executor.clock().now_epoch_ms();
    let dataset_id = DatasetId::new(req.dataset_id);
    let project_id = req.project_id.map(ProjectId::new).unwrap_or_else(|| ProjectId::new("unassigned"));
    let dataset = Dataset::new(
        dataset_id.clone(),
        project_id.clone(),
        req.file_name,
        infer_file_type(&req.mime_type),
        req.mime_type,
        req.file_size,
        req.file_path,
        now,
    );

    let job_id = req.job_id.map(JobId::new).unwrap_or_else(|| state.id_gen.next_job_id());
    let mut job = Job::new(job_id.clone(), JobKind::FileProcessing, dataset_id.clone(), UserId::new(req.user_id), 0, now);
    job.project_id = Some(project_id);
    job.policy_id = req.policy_id.map(PolicyId::new);

    let effects = vec![
        Effect::Emit { event: Event::DatasetCreated { dataset } },
        Effect::Emit { event: Event::JobEnqueued { job: job.clone() } },
        Effect::Emit {
            event: Event::AuditRecorded {
                entry: AuditEntry::new("api", "enqueue_file_processing", OwnerId::Dataset(dataset_id.clone()), now)
                    .with_detail("jobId", job_id.as_str()),
            },
        },
    ];
    state.executor.execute_all(effects).await?;

    Ok((
        StatusCode::CREATED,
        Json(EnqueueFileProcessingResponse { job_id: job_id.into_inner(), dataset_id: dataset_id.into_inner() }),
    ))
}

fn infer_file_type(mime_type: &str) -> &'static str {
    match mime_type {
        m if m.starts_with("text/") => "txt",
        "application/pdf" => "pdf",
        m if m.starts_with("image/") => "image",
        _ => "document",
    }
}

async fn cancel_job(State(state): State<AppState>, headers: axum::http::HeaderMap, Path(job_id): Path<String>) -> Result<StatusCode, ApiError> {
    let job_id = JobId::new(job_id);
    let job = state.state.lock().jobs.get(job_id.as_str()).cloned().ok_or(ApiError::NotFound)?;
    authorize(&state, &headers, OwnerId::Job(job.id.clone()))?;

    let now = state.executor.clock().now_epoch_ms();
    let mut effects = cancel_request_effects(job_id.clone());
    effects.push(Effect::Emit {
        event: Event::AuditRecorded { entry: AuditEntry::new("api", "cancel", OwnerId::Job(job_id), now) },
    });
    state.executor.execute_all(effects).await?;
    Ok(StatusCode::ACCEPTED)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryResponse {
    pub job_id: String,
}

async fn retry_job(State(state): State<AppState>, headers: axum::http::HeaderMap, Path(job_id): Path<String>) -> Result<Json<RetryResponse>, ApiError> {
    let job = state.state.lock().jobs.get(job_id.as_str()).cloned().ok_or(ApiError::NotFound)?;
    authorize(&state, &headers, OwnerId::Job(job.id.clone()))?;
    if job.status != JobStatus::Failed {
        return Err(ApiError::InvalidState("only a failed job can be retried"));
    }

    let dataset_status = state.state.lock().datasets.get(job.dataset_id.as_str()).map(|d| d.status);
    let now = state.executor.clock().now_epoch_ms();
    let (successor, mut effects) = retry_effects(&job, dataset_status, state.id_gen.as_ref(), now);
    effects.push(Effect::Emit {
        event: Event::AuditRecorded {
            entry: AuditEntry::new("api", "retry", OwnerId::Job(successor.id.clone()), now).with_detail("originalJobId", job.id.as_str()),
        },
    });
    state.executor.execute_all(effects).await?;
    Ok(Json(RetryResponse { job_id: successor.id.into_inner() }))
}

fn authorize(state: &AppState, headers: &axum::http::HeaderMap, owner: OwnerId) -> Result<(), ApiError> {
    let user_id = headers.get("x-user-id").and_then(|v| v.to_str().ok()).unwrap_or("anonymous");
    let principal = Principal::new(user_id);
    if state.auth.allows(&principal, &ResourceRef { owner }) {
        Ok(())
    } else {
        Err(ApiError::Forbidden)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    pub progress: u8,
    pub attempt: u32,
    pub dataset_id: String,
    pub error: Option<String>,
    pub created_at_epoch_ms: i64,
    pub started_at_epoch_ms: Option<i64>,
    pub ended_at_epoch_ms: Option<i64>,
}

impl From<&Job> for JobView {
    fn from(job: &Job) -> Self {
        Self {
            job_id: job.id.as_str().to_string(),
            kind: job.kind,
            status: job.status,
            progress: job.progress,
            attempt: job.attempt,
            dataset_id: job.dataset_id.as_str().to_string(),
            error: job.error.clone(),
            created_at_epoch_ms: job.created_at_epoch_ms,
            started_at_epoch_ms: job.started_at_epoch_ms,
            ended_at_epoch_ms: job.ended_at_epoch_ms,
        }
    }
}

async fn get_job(State(state): State<AppState>, Path(job_id): Path<String>) -> Result<Json<JobView>, ApiError> {
    let state = state.state.lock();
    let job = state.jobs.get(job_id.as_str()).ok_or(ApiError::NotFound)?;
    Ok(Json(JobView::from(job)))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetView {
    pub dataset_id: String,
    pub filename: String,
    pub file_type: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub status: DatasetStatus,
    pub findings_count: u32,
    pub output_paths: Vec<String>,
}

impl From<&Dataset> for DatasetView {
    fn from(dataset: &Dataset) -> Self {
        Self {
            dataset_id: dataset.id.as_str().to_string(),
            filename: dataset.filename.clone(),
            file_type: dataset.file_type.clone(),
            mime_type: dataset.mime_type.clone(),
            byte_size: dataset.byte_size,
            status: dataset.status,
            findings_count: dataset.findings_count,
            output_paths: dataset.output_paths.clone(),
        }
    }
}

async fn get_dataset(State(state): State<AppState>, Path(dataset_id): Path<String>) -> Result<Json<DatasetView>, ApiError> {
    let state = state.state.lock();
    let dataset = state.datasets.get(dataset_id.as_str()).ok_or(ApiError::NotFound)?;
    Ok(Json(DatasetView::from(dataset)))
}

/// Subscribes to the fan-out and streams frames as
/// `Content-Type: text/event-stream`, per the outbound event contract.
async fn events_stream(State(state): State<AppState>) -> Sse<impl Stream<Item = Result<SseEvent, Infallible>>> {
    let subscriber_id = state.id_gen.next_subscriber_id();
    let rx = state.fanout.subscribe(subscriber_id.clone());
    Sse::new(SubscriberStream { rx, registry: state.fanout.clone(), id: subscriber_id, clock: SystemClock }).keep_alive(KeepAlive::default())
}

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::mpsc;

/// Streams one subscriber's frames and unregisters it from the fan-out the
/// moment the stream is dropped, whether the client disconnected or the
/// stream ran to completion.
struct SubscriberStream {
    rx: mpsc::Receiver<FanoutEvent>,
    registry: FanoutRegistry,
    id: redactflow_core::SubscriberId,
    clock: SystemClock,
}

impl Stream for SubscriberStream {
    type Item = Result<SseEvent, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx).map(|maybe_event| {
            maybe_event.map(|event| {
                let frame = event.into_frame(self.clock.now_epoch_ms());
                Ok(SseEvent::default().data(frame.to_sse_data()))
            })
        })
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        self.registry.unsubscribe(&self.id);
    }
}

#[derive(Debug)]
pub enum ApiError {
    NotFound,
    Forbidden,
    QueueFull,
    InvalidState(&'static str),
    Execute(ExecuteError),
}

impl From<ExecuteError> for ApiError {
    fn from(err: ExecuteError) -> Self {
        ApiError::Execute(err)
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: &'static str,
    message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not_found", "no such job or dataset".to_string()),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", "not authorized for this resource".to_string()),
            ApiError::QueueFull => (StatusCode::SERVICE_UNAVAILABLE, "queue_full", "queue is at capacity, retry later".to_string()),
            ApiError::InvalidState(msg) => (StatusCode::CONFLICT, "invalid_state", msg.to_string()),
            ApiError::Execute(err) => (StatusCode::INTERNAL_SERVER_ERROR, "internal", err.to_string()),
        };
        (status, Json(ErrorBody { kind, message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderMap;
    use redactflow_core::test_support::{sample_dataset, sample_job};
    use redactflow_storage::Wal;
    use tempfile::tempdir;

    use super::*;

    fn state(dir: &std::path::Path) -> AppState {
        let wal = Wal::open(dir.join("events.wal")).unwrap();
        let executor = Executor::new(
            Arc::new(Mutex::new(MaterializedState::new())),
            Arc::new(Mutex::new(wal)),
            Arc::new(Mutex::new(redactflow_engine::Scheduler::new())),
            SystemClock,
        );
        let materialized = executor.state();
        AppState::new(Arc::new(executor), materialized, FanoutRegistry::new(), Arc::new(UuidIdGen))
    }

    fn enqueue_request() -> EnqueueFileProcessingRequest {
        EnqueueFileProcessingRequest {
            job_id: Some("job-1".to_string()),
            user_id: "user-1".to_string(),
            project_id: None,
            dataset_id: "dataset-1".to_string(),
            file_path: "/uploads/dataset-1".to_string(),
            file_name: "contacts.txt".to_string(),
            file_size: 128,
            mime_type: "text/plain".to_string(),
            policy_id: None,
        }
    }

    #[tokio::test]
    async fn enqueue_creates_a_dataset_and_a_queued_job() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        let (status, Json(resp)) = enqueue_file_processing(State(state.clone()), Json(enqueue_request())).await.unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(resp.job_id, "job-1");
        assert_eq!(resp.dataset_id, "dataset-1");

        let locked = state.state.lock();
        assert_eq!(locked.jobs.get("job-1").unwrap().status, JobStatus::Queued);
        assert!(locked.datasets.contains_key("dataset-1"));
        // project defaults to the sentinel project when the request omits one.
        assert_eq!(locked.datasets.get("dataset-1").unwrap().project_id.as_str(), "unassigned");
    }

    #[tokio::test]
    async fn enqueue_at_capacity_returns_queue_full() {
        let dir = tempdir().unwrap();
        let mut state = state(dir.path());
        state.max_queue_depth = 0;

        let err = enqueue_file_processing(State(state), Json(enqueue_request())).await.unwrap_err();
        assert!(matches!(err, ApiError::QueueFull));
    }

    #[tokio::test]
    async fn get_job_returns_not_found_for_an_unknown_id() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        let err = get_job(State(state), Path("missing".to_string())).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn get_job_reports_the_current_status() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        state
            .executor
            .execute(Effect::Emit { event: Event::JobEnqueued { job: sample_job("job-1", JobKind::FileProcessing, "dataset-1") } })
            .await
            .unwrap();

        let Json(view) = get_job(State(state), Path("job-1".to_string())).await.unwrap();
        assert_eq!(view.job_id, "job-1");
        assert_eq!(view.status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn get_dataset_returns_not_found_for_an_unknown_id() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        let err = get_dataset(State(state), Path("missing".to_string())).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    #[tokio::test]
    async fn retry_rejects_a_job_that_is_not_failed() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        state
            .executor
            .execute(Effect::Emit { event: Event::JobEnqueued { job: sample_job("job-1", JobKind::FileProcessing, "dataset-1") } })
            .await
            .unwrap();

        let err = retry_job(State(state), HeaderMap::new(), Path("job-1".to_string())).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidState(_)));
    }

    #[tokio::test]
    async fn retry_builds_a_successor_job_for_a_failed_job() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        state
            .executor
            .execute(Effect::Emit { event: Event::DatasetCreated { dataset: sample_dataset("dataset-1") } })
            .await
            .unwrap();
        let mut job = sample_job("job-1", JobKind::FileProcessing, "dataset-1");
        job.status = JobStatus::Failed;
        job.error = Some("boom".to_string());
        state.executor.execute(Effect::Emit { event: Event::JobEnqueued { job } }).await.unwrap();

        let Json(resp) = retry_job(State(state.clone()), HeaderMap::new(), Path("job-1".to_string())).await.unwrap();
        assert_ne!(resp.job_id, "job-1");
        let locked = state.state.lock();
        assert_eq!(locked.jobs.get(resp.job_id.as_str()).unwrap().status, JobStatus::Queued);
    }

    #[tokio::test]
    async fn cancel_requests_cancellation_of_a_queued_job() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());
        state
            .executor
            .execute(Effect::Emit { event: Event::JobEnqueued { job: sample_job("job-1", JobKind::FileProcessing, "dataset-1") } })
            .await
            .unwrap();

        let status = cancel_job(State(state.clone()), HeaderMap::new(), Path("job-1".to_string())).await.unwrap();
        assert_eq!(status, StatusCode::ACCEPTED);
    }

    #[tokio::test]
    async fn cancel_unknown_job_returns_not_found() {
        let dir = tempdir().unwrap();
        let state = state(dir.path());

        let err = cancel_job(State(state), HeaderMap::new(), Path("missing".to_string())).await.unwrap_err();
        assert!(matches!(err, ApiError::NotFound));
    }

    fn infer(mime: &str) -> &'static str {
        infer_file_type(mime)
    }

    #[test]
    fn infer_file_type_maps_common_mime_prefixes() {
        assert_eq!(infer("text/plain"), "txt");
        assert_eq!(infer("application/pdf"), "pdf");
        assert_eq!(infer("image/png"), "image");
        assert_eq!(infer("application/zip"), "document");
    }
}
