// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-stage processing logic: the body a worker runs once it reserves a job
//! of a given kind. Every processor has the same shape: read what it needs
//! from materialized state, await its external collaborators, and return the
//! effects that record the outcome. A processor never touches the WAL or the
//! scheduler directly and never emits `JobCompleted`/`JobFailed` itself —
//! that's the queue substrate's job once the worker sees the `Ok`/`Err`.

mod anonymization;
mod file_processing;
mod pii_analysis;
mod text_extraction;

pub use anonymization::process_anonymization;
pub use file_processing::process_file_processing;
pub use pii_analysis::process_pii_analysis;
pub use text_extraction::process_text_extraction;

use std::sync::Arc;

use async_trait::async_trait;
use redactflow_core::{
    AuditEntry, Clock, DatasetId, DatasetStatus, Event, IdGen, Job, JobKind, OwnerId, PolicyId,
};
use redactflow_detect::{AnonymizerClient, DetectorClient};
use redactflow_extraction::{DocumentExtractorClient, OcrClient};
use redactflow_policy::{CompiledPolicy, PolicyCache};

use crate::effect::Effect;

/// Reads and stats the dataset's source file. A seam so stage tests don't
/// touch the real filesystem.
#[async_trait]
pub trait FileReader: Send + Sync {
    async fn stat(&self, path: &str) -> std::io::Result<FileStat>;
    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>>;
    async fn write(&self, path: &str, bytes: &[u8]) -> std::io::Result<()>;
}

#[derive(Debug, Clone, Copy)]
pub struct FileStat {
    pub byte_size: u64,
    pub is_file: bool,
}

/// `FileReader` backed by `tokio::fs`. The production default.
#[derive(Default)]
pub struct LocalFileReader;

#[async_trait]
impl FileReader for LocalFileReader {
    async fn stat(&self, path: &str) -> std::io::Result<FileStat> {
        let metadata = tokio::fs::metadata(path).await?;
        Ok(FileStat {
            byte_size: metadata.len(),
            is_file: metadata.is_file(),
        })
    }

    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        tokio::fs::read(path).await
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> std::io::Result<()> {
        tokio::fs::write(path, bytes).await
    }
}

/// Resolves the raw bytes of a policy document by id. Distinct from
/// [`PolicyCache`], which only compiles bytes it's handed — this is where
/// those bytes come from (a policy store, a config directory, ...).
pub trait PolicyDocumentSource: Send + Sync {
    fn raw_for(&self, id: &PolicyId) -> Option<Vec<u8>>;
}

/// A source with nothing in it: every lookup resolves to "no document
/// found", which `PolicyCache::get_or_load` maps onto the built-in default
/// policy.
#[derive(Default)]
pub struct NoPolicyDocumentSource;

impl PolicyDocumentSource for NoPolicyDocumentSource {
    fn raw_for(&self, _id: &PolicyId) -> Option<Vec<u8>> {
        None
    }
}

/// Collaborators every stage processor needs. Cheap to clone: everything
/// inside is already `Arc`-wrapped, or `Copy` for the clock.
pub struct ProcessorDeps<C: Clock> {
    pub detector: Arc<dyn DetectorClient>,
    pub anonymizer: Arc<dyn AnonymizerClient>,
    pub document_extractor: Arc<dyn DocumentExtractorClient>,
    pub ocr: Arc<dyn OcrClient>,
    pub policy_cache: Arc<PolicyCache>,
    pub policy_source: Arc<dyn PolicyDocumentSource>,
    pub file_reader: Arc<dyn FileReader>,
    pub id_gen: Arc<dyn IdGen>,
    pub clock: C,
    pub max_text_length: usize,
    /// Fallback accept ceiling (the `storage.maxFileSize` configuration
    /// option) applied when a dataset's policy doesn't set its own
    /// `scope.max_file_size`.
    pub max_file_size: Option<u64>,
}

impl<C: Clock> ProcessorDeps<C> {
    /// Loads and compiles the policy named by `id`, falling back to the
    /// built-in default for datasets with no policy assigned.
    pub fn resolve_policy(&self, id: Option<&PolicyId>) -> Arc<CompiledPolicy> {
        let id = id.cloned().unwrap_or_else(|| PolicyId::new("default"));
        let raw = self.policy_source.raw_for(&id);
        self.policy_cache
            .get_or_load(&id, raw.as_deref())
            .unwrap_or_else(|_| Arc::new(redactflow_policy::default_policy()))
    }
}

pub(crate) fn progress_effect(job: &Job, progress: u8) -> Effect {
    Effect::Emit {
        event: Event::JobProgress {
            job_id: job.id.clone(),
            progress,
        },
    }
}

pub(crate) fn dataset_status_effect(dataset_id: DatasetId, status: DatasetStatus, at_epoch_ms: i64) -> Effect {
    Effect::Emit {
        event: Event::DatasetStatusChanged {
            dataset_id,
            status,
            at_epoch_ms,
        },
    }
}

pub(crate) fn audit_effect(action: &str, resource: OwnerId, at_epoch_ms: i64) -> Effect {
    Effect::Emit {
        event: Event::AuditRecorded {
            entry: AuditEntry::new("pipeline", action, resource, at_epoch_ms),
        },
    }
}

/// Builds the successor job for `kind`, inheriting the dataset/project/
/// policy lineage from `job`, and the effect to enqueue it.
pub(crate) fn enqueue_successor_effect<C: Clock>(deps: &ProcessorDeps<C>, job: &Job, kind: JobKind) -> Effect {
    let mut successor = Job::new(
        deps.id_gen.next_job_id(),
        kind,
        job.dataset_id.clone(),
        job.creator_id.clone(),
        job.priority,
        deps.clock.now_epoch_ms(),
    );
    successor.project_id = job.project_id.clone();
    successor.policy_id = job.policy_id.clone();
    Effect::Emit {
        event: Event::JobEnqueued { job: successor },
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeFileReader {
    pub files: parking_lot::Mutex<std::collections::HashMap<String, Vec<u8>>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeFileReader {
    pub fn new() -> Self {
        Self {
            files: parking_lot::Mutex::new(std::collections::HashMap::new()),
        }
    }

    pub fn with_file(self, path: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.files.lock().insert(path.into(), bytes);
        self
    }

    pub fn written(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().get(path).cloned()
    }
}

#[cfg(any(test, feature = "test-support"))]
impl Default for FakeFileReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl FileReader for FakeFileReader {
    async fn stat(&self, path: &str) -> std::io::Result<FileStat> {
        match self.files.lock().get(path) {
            Some(bytes) => Ok(FileStat {
                byte_size: bytes.len() as u64,
                is_file: true,
            }),
            None => Err(std::io::Error::new(std::io::ErrorKind::NotFound, "no such file")),
        }
    }

    async fn read(&self, path: &str) -> std::io::Result<Vec<u8>> {
        self.files
            .lock()
            .get(path)
            .cloned()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"))
    }

    async fn write(&self, path: &str, bytes: &[u8]) -> std::io::Result<()> {
        self.files.lock().insert(path.to_string(), bytes.to_vec());
        Ok(())
    }
}
