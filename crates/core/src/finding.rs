// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One detected PII instance, located by byte offsets in the extracted text.

use serde::{Deserialize, Serialize};

use crate::id::{AttemptId, DatasetId, FindingId};

/// The kind of rewrite applied to a detected range. A label on [`Finding`];
/// the full parameters (replacement literal, mask char, hash algorithm, ...)
/// live on the policy's configured operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingAction {
    Redact,
    Mask,
    Replace,
    Encrypt,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindingContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub after: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub id: FindingId,
    pub dataset_id: DatasetId,
    pub attempt_id: AttemptId,
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub confidence: f32,
    pub action: FindingAction,
    pub context: FindingContext,
}

impl Finding {
    /// The natural idempotence key from the idempotence & at-least-once
    /// handling contract: `(datasetId, attemptId, start, end, entityType)`.
    pub fn natural_key(&self) -> (DatasetId, AttemptId, usize, usize, String) {
        (
            self.dataset_id.clone(),
            self.attempt_id.clone(),
            self.start,
            self.end,
            self.entity_type.clone(),
        )
    }

    /// `0 <= start < end <= text_length` per the data model's offset
    /// invariant.
    pub fn has_valid_offsets(&self, text_length: usize) -> bool {
        self.start < self.end && self.end <= text_length
    }
}

#[cfg(test)]
#[path = "finding_tests.rs"]
mod tests;
