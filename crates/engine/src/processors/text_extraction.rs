// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TextExtraction: runs the router, folds the extracted text and its
//! quality signals onto the dataset's metadata, and enqueues PIIAnalysis.
//!
//! The extracted text itself is a transient per-job artifact whose lifetime
//! ends once analysis completes, so it rides in `DatasetMetadata.extra`
//! rather than a dedicated durable field — PIIAnalysis reads it back out of
//! the same map.

use redactflow_core::{Clock, DatasetStatus, ExtractionMethod, Job, JobKind, OwnerId, StageError, StageErrorKind};
use redactflow_extraction::ExtractionRouter;
use redactflow_storage::MaterializedState;

use super::{audit_effect, dataset_status_effect, enqueue_successor_effect, progress_effect, ProcessorDeps};
use crate::effect::Effect;

pub const EXTRACTED_TEXT_KEY: &str = "extracted_text";
pub const EXTRACTION_METHOD_KEY: &str = "extraction_method";
pub const EXTRACTION_CONFIDENCE_KEY: &str = "extraction_confidence";

const LOW_OCR_CONFIDENCE_THRESHOLD: f32 = 0.7;

pub async fn process_text_extraction<C: Clock>(
    deps: &ProcessorDeps<C>,
    state: &MaterializedState,
    job: &Job,
) -> Result<Vec<Effect>, StageError> {
    let dataset = state
        .datasets
        .get(job.dataset_id.as_str())
        .ok_or_else(|| StageError::new(StageErrorKind::FileNotFound, "dataset not found"))?;

    let bytes = deps
        .file_reader
        .read(&dataset.source_path)
        .await
        .map_err(|e| StageError::new(StageErrorKind::FileNotFound, format!("source file vanished: {e}")))?;

    let mut effects = vec![progress_effect(job, 20)];

    let clock = &deps.clock as &dyn Clock;
    let router = ExtractionRouter::new(deps.document_extractor.as_ref(), deps.ocr.as_ref(), clock)
        .with_max_text_length(deps.max_text_length);
    let extracted = router.route(&bytes, &dataset.file_type, &dataset.mime_type).await;

    if extracted.method == Some(ExtractionMethod::Failed) {
        let message = extracted
            .metadata
            .get("error")
            .cloned()
            .unwrap_or_else(|| "extraction failed".to_string());
        return Err(StageError::new(StageErrorKind::ExtractionUnavailable, message));
    }
    effects.push(progress_effect(job, 70));

    let mut metadata = dataset.metadata.clone();
    metadata.extra.insert(EXTRACTED_TEXT_KEY.to_string(), extracted.text.clone());
    if let Some(method) = extracted.method {
        metadata.extra.insert(EXTRACTION_METHOD_KEY.to_string(), format!("{method:?}"));
    }
    metadata
        .extra
        .insert(EXTRACTION_CONFIDENCE_KEY.to_string(), extracted.confidence.to_string());

    if matches!(extracted.method, Some(ExtractionMethod::Pdf) | Some(ExtractionMethod::PdfFallbackDocument)) {
        metadata.pdf_coordinates_unavailable = true;
    }
    if matches!(extracted.method, Some(ExtractionMethod::Ocr)) && extracted.confidence < LOW_OCR_CONFIDENCE_THRESHOLD {
        metadata.has_low_confidence_words = true;
        let warning = "Low OCR confidence".to_string();
        if !metadata.quality_warnings.contains(&warning) {
            metadata.quality_warnings.push(warning);
        }
    }
    if extracted.truncated {
        let warning = "Input truncated to the maximum text length".to_string();
        if !metadata.quality_warnings.contains(&warning) {
            metadata.quality_warnings.push(warning);
        }
    }

    let now = deps.clock.now_epoch_ms();
    effects.push(Effect::Emit {
        event: redactflow_core::Event::DatasetMetadataMerged {
            dataset_id: dataset.id.clone(),
            metadata,
        },
    });
    effects.push(dataset_status_effect(dataset.id.clone(), DatasetStatus::Analyzing, now));
    effects.push(progress_effect(job, 90));
    effects.push(enqueue_successor_effect(deps, job, JobKind::PiiAnalysis));
    effects.push(audit_effect("text_extraction.completed", OwnerId::Dataset(dataset.id.clone()), now));
    Ok(effects)
}

#[cfg(test)]
#[path = "text_extraction_tests.rs"]
mod tests;
