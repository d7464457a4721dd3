// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anonymization: reads the persisted findings and the original extracted
//! text, resolves overlaps, runs the anonymizer, and writes the output
//! artifact next to the source file.

use std::collections::HashMap;

use redactflow_core::{Clock, DatasetStatus, Job, Operator, OwnerId, StageError, StageErrorKind};
use redactflow_detect::{resolve_overlaps, Detection};
use redactflow_storage::MaterializedState;

use super::text_extraction::EXTRACTED_TEXT_KEY;
use super::{audit_effect, dataset_status_effect, progress_effect, ProcessorDeps};
use crate::effect::Effect;

pub async fn process_anonymization<C: Clock>(
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

    let findings = state.findings_for(dataset.id.as_str());
    let mut effects = vec![progress_effect(job, 20)];

    let policy = deps.resolve_policy(job.policy_id.as_ref().or(dataset.policy_id.as_ref()));
    let mut operators: HashMap<String, Operator> = HashMap::new();
    let detections: Vec<Detection> = findings
        .iter()
        .map(|f| {
            operators
                .entry(f.entity_type.clone())
                .or_insert_with(|| policy.operator_for(&f.entity_type).clone());
            Detection {
                entity_type: f.entity_type.clone(),
                start: f.start,
                end: f.end,
                score: f.confidence,
                analysis_explanation: None,
            }
        })
        .collect();
    let ranges = resolve_overlaps(detections);
    effects.push(progress_effect(job, 40));

    let (anonymized, _applied) = deps
        .anonymizer
        .anonymize(&text, ranges, operators)
        .await
        .map_err(|e| StageError::new(StageErrorKind::AnonymizerUnavailable, e.to_string()))?;
    effects.push(progress_effect(job, 70));

    let output_path = format!("{}.anonymized.txt", dataset.source_path);
    deps.file_reader
        .write(&output_path, anonymized.as_bytes())
        .await
        .map_err(|e| StageError::new(StageErrorKind::AnonymizerUnavailable, format!("writing output artifact: {e}")))?;

    let now = deps.clock.now_epoch_ms();
    effects.push(Effect::Emit {
        event: redactflow_core::Event::AnonymizationWritten {
            dataset_id: dataset.id.clone(),
            output_paths: vec![output_path],
        },
    });
    effects.push(dataset_status_effect(dataset.id.clone(), DatasetStatus::Completed, now));
    effects.push(progress_effect(job, 90));
    effects.push(audit_effect("anonymization.completed", OwnerId::Dataset(dataset.id.clone()), now));
    Ok(effects)
}

#[cfg(test)]
#[path = "anonymization_tests.rs"]
mod tests;
