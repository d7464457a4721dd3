use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use redactflow_core::test_support::{fake_clock_at, sample_dataset, sample_job};
use redactflow_core::{Event, FakeClock, JobKind, JobStatus, UuidIdGen};
use redactflow_detect::{FakeAnonymizerClient, FakeDetectorClient};
use redactflow_extraction::{FakeDocumentExtractorClient, FakeOcrClient, OcrOutput};
use redactflow_policy::PolicyCache;
use redactflow_storage::{MaterializedState, Wal};
use tempfile::tempdir;

use super::*;
use crate::processors::{FakeFileReader, NoPolicyDocumentSource};
use crate::scheduler::Scheduler;

fn executor(dir: &std::path::Path, state: MaterializedState) -> Executor<FakeClock> {
    let wal = Wal::open(dir.join("events.wal")).unwrap();
    Executor::new(
        Arc::new(Mutex::new(state)),
        Arc::new(Mutex::new(wal)),
        Arc::new(Mutex::new(Scheduler::new())),
        fake_clock_at(1_000),
    )
}

fn deps(reader: FakeFileReader) -> ProcessorDeps<FakeClock> {
    ProcessorDeps {
        detector: Arc::new(FakeDetectorClient { detections: vec![], fail: false }),
        anonymizer: Arc::new(FakeAnonymizerClient { fail: false }),
        document_extractor: Arc::new(FakeDocumentExtractorClient { result: Ok(String::new()) }),
        ocr: Arc::new(FakeOcrClient { result: Ok(OcrOutput { text: String::new(), stderr: String::new() }) }),
        policy_cache: Arc::new(PolicyCache::new()),
        policy_source: Arc::new(NoPolicyDocumentSource),
        file_reader: Arc::new(reader),
        id_gen: Arc::new(UuidIdGen),
        clock: fake_clock_at(1_000),
        max_text_length: 1024,
        max_file_size: None,
    }
}

fn state_with_queued_job() -> (MaterializedState, redactflow_core::Dataset, redactflow_core::Job) {
    let mut state = MaterializedState::new();
    let dataset = sample_dataset("dataset-1");
    state.apply_event(&Event::DatasetCreated { dataset: dataset.clone() });
    let job = sample_job("job-1", JobKind::FileProcessing, dataset.id.as_str());
    state.apply_event(&Event::JobEnqueued { job: job.clone() });
    (state, dataset, job)
}

#[tokio::test]
async fn run_one_reserves_and_completes_a_ready_job() {
    let dir = tempdir().unwrap();
    let (state, dataset, _job) = state_with_queued_job();
    let executor = executor(dir.path(), state);
    let reader = FakeFileReader::new().with_file(dataset.source_path.clone(), b"hello".to_vec());

    let ran = run_one(&executor, &deps(reader), JobKind::FileProcessing, Duration::from_secs(1)).await;
    assert!(ran);

    let state = executor.state();
    let state = state.lock();
    assert_eq!(state.jobs.get("job-1").unwrap().status, JobStatus::Completed);
}

#[tokio::test]
async fn run_one_returns_false_when_nothing_is_queued() {
    let dir = tempdir().unwrap();
    let executor = executor(dir.path(), MaterializedState::new());
    let reader = FakeFileReader::new();

    let ran = run_one(&executor, &deps(reader), JobKind::FileProcessing, Duration::from_secs(1)).await;
    assert!(!ran);
}

#[tokio::test]
async fn run_one_fails_a_missing_file_without_retry() {
    let dir = tempdir().unwrap();
    let (state, _dataset, _job) = state_with_queued_job();
    let executor = executor(dir.path(), state);
    let reader = FakeFileReader::new();

    let ran = run_one(&executor, &deps(reader), JobKind::FileProcessing, Duration::from_secs(1)).await;
    assert!(ran);

    let state = executor.state();
    let state = state.lock();
    assert_eq!(state.jobs.get("job-1").unwrap().status, JobStatus::Failed);
}

#[tokio::test]
async fn run_one_skips_a_job_requested_for_cancellation() {
    let dir = tempdir().unwrap();
    let (mut state, _dataset, job) = state_with_queued_job();
    state.apply_event(&Event::JobReserved {
        job_id: job.id.clone(),
        worker_id: "other".to_string(),
        reserved_until_epoch_ms: 10_000,
        started_at_epoch_ms: 0,
    });
    state.apply_event(&Event::JobRequeued { job_id: job.id.clone(), attempt: 0 });
    state.apply_event(&Event::JobCancelRequested { job_id: job.id.clone() });
    // The job was already running when cancellation was requested, so it's
    // still queued with `cancel_requested` set rather than cancelled outright.
    assert!(state.jobs.get("job-1").unwrap().cancel_requested);

    let executor = executor(dir.path(), state);
    let reader = FakeFileReader::new();

    let ran = run_one(&executor, &deps(reader), JobKind::FileProcessing, Duration::from_secs(1)).await;
    assert!(ran);

    let state = executor.state();
    let state = state.lock();
    assert_eq!(state.jobs.get("job-1").unwrap().status, JobStatus::Cancelled);
}

#[tokio::test]
async fn pool_drains_a_queued_job_then_shuts_down_cleanly() {
    let dir = tempdir().unwrap();
    let (state, dataset, _job) = state_with_queued_job();
    let executor = Arc::new(executor(dir.path(), state));
    let reader = FakeFileReader::new().with_file(dataset.source_path.clone(), b"hello".to_vec());
    let deps = Arc::new(deps(reader));

    let pool = WorkerPool::spawn(Arc::clone(&executor), deps, 1, Duration::from_secs(1));
    tokio::time::sleep(Duration::from_millis(150)).await;

    {
        let state = executor.state();
        let state = state.lock();
        assert_eq!(state.jobs.get("job-1").unwrap().status, JobStatus::Completed);
    }

    pool.shutdown().await;
}
