use std::sync::Arc;

use redactflow_core::test_support::{fake_clock_at, sample_dataset, sample_job};
use redactflow_core::{Event, JobKind, UuidIdGen};
use redactflow_detect::{Detection, FakeAnonymizerClient, FakeDetectorClient};
use redactflow_extraction::{FakeDocumentExtractorClient, FakeOcrClient, OcrOutput};
use redactflow_policy::PolicyCache;
use redactflow_storage::MaterializedState;

use super::*;
use crate::processors::{FakeFileReader, NoPolicyDocumentSource};

fn policy_source() -> Arc<dyn PolicyDocumentSource> {
    let doc = serde_json::json!({
        "name": "test", "version": "1",
        "detection": {"entities": [
            {"type": "EMAIL_ADDRESS", "threshold": 0.5, "operator": {"action": "redact"}},
            {"type": "PHONE_NUMBER", "threshold": 0.5, "operator": {"action": "mask", "char": "*", "count": 12, "from_end": false}},
        ]},
        "anonymization": {"default_action": {"action": "redact"}},
    });
    struct Fixed(Vec<u8>);
    impl PolicyDocumentSource for Fixed {
        fn raw_for(&self, _id: &redactflow_core::PolicyId) -> Option<Vec<u8>> {
            Some(self.0.clone())
        }
    }
    Arc::new(Fixed(serde_json::to_vec(&doc).unwrap()))
}

fn deps(detector: FakeDetectorClient) -> ProcessorDeps<redactflow_core::FakeClock> {
    ProcessorDeps {
        detector: Arc::new(detector),
        anonymizer: Arc::new(FakeAnonymizerClient { fail: false }),
        document_extractor: Arc::new(FakeDocumentExtractorClient { result: Ok(String::new()) }),
        ocr: Arc::new(FakeOcrClient { result: Ok(OcrOutput { text: String::new(), stderr: String::new() }) }),
        policy_cache: Arc::new(PolicyCache::new()),
        policy_source: policy_source(),
        file_reader: Arc::new(FakeFileReader::new()),
        id_gen: Arc::new(UuidIdGen),
        clock: fake_clock_at(9_000),
        max_text_length: 1024,
        max_file_size: None,
    }
}

fn state_with_text(text: &str) -> (MaterializedState, redactflow_core::Dataset) {
    let mut state = MaterializedState::new();
    let mut dataset = sample_dataset("dataset-1");
    dataset.metadata.extra.insert(EXTRACTED_TEXT_KEY.to_string(), text.to_string());
    state.apply_event(&Event::DatasetCreated { dataset: dataset.clone() });
    (state, dataset)
}

#[tokio::test]
async fn persists_findings_in_ascending_offset_order_and_enqueues_anonymization() {
    let (state, dataset) = state_with_text("Alice a@x.com 555-111-2222");
    let job = sample_job("job-1", JobKind::PiiAnalysis, dataset.id.as_str());
    let detector = FakeDetectorClient {
        detections: vec![
            Detection { entity_type: "PHONE_NUMBER".to_string(), start: 14, end: 26, score: 0.9, analysis_explanation: None },
            Detection { entity_type: "EMAIL_ADDRESS".to_string(), start: 6, end: 13, score: 0.95, analysis_explanation: None },
        ],
        fail: false,
    };

    let effects = process_pii_analysis(&deps(detector), &state, &job).await.unwrap();
    let findings = effects.iter().find_map(|e| match e {
        Effect::Emit { event: Event::FindingsPersisted { findings, .. } } => Some(findings.clone()),
        _ => None,
    }).expect("findings persisted effect");

    assert_eq!(findings.len(), 2);
    assert_eq!(findings[0].entity_type, "EMAIL_ADDRESS");
    assert_eq!(findings[0].start, 6);
    assert_eq!(findings[1].entity_type, "PHONE_NUMBER");
    assert_eq!(findings[1].start, 14);

    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Emit { event: Event::JobEnqueued { job } } if job.kind == JobKind::Anonymization
    )));
}

#[tokio::test]
async fn entities_below_policy_threshold_are_dropped() {
    let (state, dataset) = state_with_text("call 555-111-2222");
    let job = sample_job("job-1", JobKind::PiiAnalysis, dataset.id.as_str());
    let detector = FakeDetectorClient {
        detections: vec![Detection { entity_type: "PHONE_NUMBER".to_string(), start: 5, end: 17, score: 0.2, analysis_explanation: None }],
        fail: false,
    };

    let effects = process_pii_analysis(&deps(detector), &state, &job).await.unwrap();
    let findings = effects.iter().find_map(|e| match e {
        Effect::Emit { event: Event::FindingsPersisted { findings, .. } } => Some(findings.clone()),
        _ => None,
    }).expect("findings persisted effect");
    assert!(findings.is_empty());

    assert!(effects.iter().any(|e| matches!(
        e,
        Effect::Emit { event: Event::DatasetStatusChanged { status, .. } } if *status == redactflow_core::DatasetStatus::Completed
    )));
}

#[tokio::test]
async fn detector_outage_fails_with_retriable_kind() {
    let (state, dataset) = state_with_text("Alice a@x.com");
    let job = sample_job("job-1", JobKind::PiiAnalysis, dataset.id.as_str());
    let detector = FakeDetectorClient { detections: vec![], fail: true };

    let error = process_pii_analysis(&deps(detector), &state, &job).await.unwrap_err();
    assert_eq!(error.kind, redactflow_core::StageErrorKind::DetectorUnavailable);
    assert!(error.is_retriable());
}
