// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! FileProcessing: verifies the dataset's source file exists, is a regular
//! file, is within the policy's scope (type and size), and is readable.

use redactflow_core::{Clock, DatasetStatus, Job, JobKind, OwnerId, StageError, StageErrorKind};
use redactflow_storage::MaterializedState;

use super::{audit_effect, dataset_status_effect, enqueue_successor_effect, progress_effect, ProcessorDeps};
use crate::effect::Effect;

pub async fn process_file_processing<C: Clock>(
    deps: &ProcessorDeps<C>,
    state: &MaterializedState,
    job: &Job,
) -> Result<Vec<Effect>, StageError> {
    let dataset = state
        .datasets
        .get(job.dataset_id.as_str())
        .ok_or_else(|| StageError::new(StageErrorKind::FileNotFound, "dataset not found"))?;

    let policy = deps.resolve_policy(job.policy_id.as_ref().or(dataset.policy_id.as_ref()));
    let mut effects = vec![progress_effect(job, 10)];

    let stat = deps.file_reader.stat(&dataset.source_path).await.map_err(|e| {
        StageError::new(StageErrorKind::FileNotFound, format!("{}: {e}", dataset.source_path))
    })?;
    if !stat.is_file {
        return Err(StageError::new(StageErrorKind::FileNotFound, "source path is not a regular file"));
    }

    if !policy.scope.file_types.is_empty()
        && !policy
            .scope
            .file_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(&dataset.file_type))
    {
        return Err(StageError::new(
            StageErrorKind::FileUnsupportedType,
            format!("file type '{}' is outside the policy's scope", dataset.file_type),
        ));
    }
    if let Some(max) = policy.scope.max_file_size.or(deps.max_file_size) {
        if stat.byte_size > max {
            return Err(StageError::new(
                StageErrorKind::FileTooLarge,
                format!("{} bytes exceeds the limit of {max}", stat.byte_size),
            ));
        }
    }
    effects.push(progress_effect(job, 50));

    // Confirms readability rather than trusting the stat call alone.
    deps.file_reader
        .read(&dataset.source_path)
        .await
        .map_err(|e| StageError::new(StageErrorKind::FileNotFound, format!("source file is not readable: {e}")))?;

    let now = deps.clock.now_epoch_ms();
    effects.push(dataset_status_effect(dataset.id.clone(), DatasetStatus::Extracting, now));
    effects.push(progress_effect(job, 90));
    effects.push(enqueue_successor_effect(deps, job, JobKind::TextExtraction));
    effects.push(audit_effect("file_processing.completed", OwnerId::Dataset(dataset.id.clone()), now));
    Ok(effects)
}

#[cfg(test)]
#[path = "file_processing_tests.rs"]
mod tests;
