// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds shared across the pipeline. These are the taxonomy from the
//! error handling design, not Rust source error types — every stage maps its
//! concrete error into one of these before it crosses a crate boundary.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageErrorKind {
    FileNotFound,
    FileUnsupportedType,
    FileTooLarge,
    ExtractionEncoding,
    ExtractionUnavailable,
    DetectorUnavailable,
    AnonymizerUnavailable,
    PolicyInvalid,
    QueueFull,
    Timeout,
    Stalled,
    Cancelled,
}

impl StageErrorKind {
    /// Whether the queue substrate should schedule a retry for this kind, per
    /// the error handling design table.
    pub fn is_retriable(self) -> bool {
        matches!(
            self,
            StageErrorKind::ExtractionUnavailable
                | StageErrorKind::DetectorUnavailable
                | StageErrorKind::AnonymizerUnavailable
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            StageErrorKind::FileNotFound => "file_not_found",
            StageErrorKind::FileUnsupportedType => "file_unsupported_type",
            StageErrorKind::FileTooLarge => "file_too_large",
            StageErrorKind::ExtractionEncoding => "extraction_encoding",
            StageErrorKind::ExtractionUnavailable => "extraction_unavailable",
            StageErrorKind::DetectorUnavailable => "detector_unavailable",
            StageErrorKind::AnonymizerUnavailable => "anonymizer_unavailable",
            StageErrorKind::PolicyInvalid => "policy_invalid",
            StageErrorKind::QueueFull => "queue_full",
            StageErrorKind::Timeout => "timeout",
            StageErrorKind::Stalled => "stalled",
            StageErrorKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for StageErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A stage-level failure, carrying both the taxonomy tag and a human
/// message. Stage processors return this; the engine maps it onto job/dataset
/// status and the retry policy.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: StageErrorKind,
    pub message: String,
}

impl StageError {
    pub fn new(kind: StageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_retriable(&self) -> bool {
        self.kind.is_retriable()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_transient_kinds_are_retriable() {
        assert!(StageErrorKind::DetectorUnavailable.is_retriable());
        assert!(StageErrorKind::AnonymizerUnavailable.is_retriable());
        assert!(StageErrorKind::ExtractionUnavailable.is_retriable());
        assert!(!StageErrorKind::FileNotFound.is_retriable());
        assert!(!StageErrorKind::FileTooLarge.is_retriable());
        assert!(!StageErrorKind::Timeout.is_retriable());
        assert!(!StageErrorKind::Cancelled.is_retriable());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let value = serde_json::to_value(StageErrorKind::DetectorUnavailable).unwrap();
        assert_eq!(value, "detector_unavailable");
    }
}
