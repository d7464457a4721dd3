// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PIIAnalysis: loads the policy, runs the detector, filters by policy,
//! persists findings in ascending offset order, and decides whether an
//! Anonymization job follows.

use std::collections::HashMap;

use redactflow_core::{
    Clock, DatasetStatus, Finding, FindingAction, FindingContext, Job, JobKind, OwnerId, StageError,
    StageErrorKind,
};
use redactflow_detect::{apply_threshold, AnalyzeRequest};
use redactflow_storage::MaterializedState;
use serde::Serialize;

use super::text_extraction::EXTRACTED_TEXT_KEY;
use super::{audit_effect, dataset_status_effect, enqueue_successor_effect, progress_effect, ProcessorDeps};
use crate::effect::Effect;

pub const PII_SUMMARY_KEY: &str = "pii_summary";

#[derive(Debug, Default, Serialize)]
struct EntitySummary {
    count: u32,
    max_confidence: f32,
}

pub async fn process_pii_analysis<C: Clock>(
    deps: &ProcessorDeps<C>,
    state: &MaterializedState,
    job: &Job,
) -> Result<Vec<Effect>, StageError> {
    let dataset = state
        .datasets
        .get(job.dataset_id.as_str())
        .ok_or_else(|| StageError::new(StageErrorKind::FileNotFound, "dataset not found"))?;

    let text = dataset
        .metadata
        .extra
        .get(EXTRACTED_TEXT_KEY)
        .ok_or_else(|| StageError::new(StageErrorKind::ExtractionUnavailable, "no extracted text artifact on dataset"))?
        .clone();

    let policy = deps.resolve_policy(job.policy_id.as_ref().or(dataset.policy_id.as_ref()));
    let mut effects = vec![progress_effect(job, 15)];

    let global_threshold = policy.confidence_threshold;
    let request = AnalyzeRequest::new(text.clone(), job.id.to_string())
        .with_effective_threshold(global_threshold);
    let effective_threshold = request.score_threshold;

    let detections = deps
        .detector
        .analyze(request)
        .await
        .map_err(|e| StageError::new(StageErrorKind::DetectorUnavailable, e.to_string()))?;
    effects.push(progress_effect(job, 55));

    let detections = apply_threshold(detections, effective_threshold);
    let text_length = text.len();

    let attempt_id = job.attempt_id();
    let mut summaries: HashMap<String, EntitySummary> = HashMap::new();
    let mut findings = Vec::new();
    for detection in detections {
        if !policy.should_process_entity(&detection.entity_type, detection.score) {
            continue;
        }
        if detection.start >= detection.end || detection.end > text_length {
            continue;
        }
        let entry = summaries.entry(detection.entity_type.clone()).or_default();
        entry.count += 1;
        entry.max_confidence = entry.max_confidence.max(detection.score);

        let action: FindingAction = policy.operator_for(&detection.entity_type).into();
        findings.push(Finding {
            id: deps.id_gen.next_finding_id(),
            dataset_id: dataset.id.clone(),
            attempt_id: attempt_id.clone(),
            entity_type: detection.entity_type,
            start: detection.start,
            end: detection.end,
            confidence: detection.score,
            action,
            context: FindingContext::default(),
        });
    }
    findings.sort_by_key(|f| (f.start, f.end));
    effects.push(progress_effect(job, 75));

    effects.push(Effect::Emit {
        event: redactflow_core::Event::FindingsPersisted {
            dataset_id: dataset.id.clone(),
            findings: findings.clone(),
        },
    });

    let mut metadata = dataset.metadata.clone();
    let summary_json = serde_json::to_string(&summaries).unwrap_or_else(|_| "{}".to_string());
    metadata.extra.insert(PII_SUMMARY_KEY.to_string(), summary_json);

    let now = deps.clock.now_epoch_ms();
    effects.push(Effect::Emit {
        event: redactflow_core::Event::DatasetMetadataMerged {
            dataset_id: dataset.id.clone(),
            metadata,
        },
    });

    if findings.is_empty() {
        effects.push(dataset_status_effect(dataset.id.clone(), DatasetStatus::Completed, now));
    } else {
        effects.push(dataset_status_effect(dataset.id.clone(), DatasetStatus::Anonymizing, now));
        effects.push(enqueue_successor_effect(deps, job, JobKind::Anonymization));
    }
    effects.push(progress_effect(job, 90));
    effects.push(audit_effect("pii_analysis.completed", OwnerId::Dataset(dataset.id.clone()), now));
    Ok(effects)
}

#[cfg(test)]
#[path = "pii_analysis_tests.rs"]
mod tests;
