// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The anonymizer client: applies per-entity operators to resolved ranges,
//! processing in decreasing `start` order so earlier offsets stay valid
//! while later ones are rewritten.

use std::collections::HashMap;

use async_trait::async_trait;
use redactflow_core::{HashAlgorithm, Operator};
use serde::Serialize;
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::overlap::ResolvedRange;

#[derive(Debug, Error)]
pub enum AnonymizeError {
    #[error("anonymizer unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AppliedOperation {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub operator: String,
}

/// Rewrites `text` in place of the resolved ranges using the operator
/// configured for each entity type (falling back to `default_action`).
/// Ranges are processed in decreasing `start` order so offsets of
/// not-yet-touched text stay stable.
pub fn anonymize_text(
    text: &str,
    mut ranges: Vec<ResolvedRange>,
    operator_for: impl Fn(&str) -> Operator,
) -> (String, Vec<AppliedOperation>) {
    ranges.sort_by_key(|r| std::cmp::Reverse(r.start));
    let mut out = text.to_string();
    let mut applied = Vec::with_capacity(ranges.len());

    for range in ranges {
        if range.end > out.len() || range.start > range.end {
            continue;
        }
        let operator = operator_for(&range.entity_type);
        let original = &out[range.start..range.end];
        let replacement = apply_operator(&operator, original);
        out.replace_range(range.start..range.end, &replacement);
        applied.push(AppliedOperation {
            entity_type: range.entity_type,
            start: range.start,
            end: range.end,
            operator: operator_name(&operator),
        });
    }
    applied.reverse();
    (out, applied)
}

fn operator_name(operator: &Operator) -> String {
    match operator {
        Operator::Replace { .. } => "replace".to_string(),
        Operator::Redact => "redact".to_string(),
        Operator::Mask { .. } => "mask".to_string(),
        Operator::Hash { .. } => "hash".to_string(),
        Operator::Encrypt { .. } => "encrypt".to_string(),
    }
}

fn apply_operator(operator: &Operator, original: &str) -> String {
    match operator {
        Operator::Replace { new_value } => new_value.clone(),
        Operator::Redact => "[REDACTED]".to_string(),
        Operator::Mask { char, count, from_end } => mask(original, *char, *count, *from_end),
        Operator::Hash { algorithm } => hash_digest(*algorithm, original),
        Operator::Encrypt { key } => encrypt(key, original),
    }
}

fn mask(original: &str, mask_char: char, count: usize, from_end: bool) -> String {
    let chars: Vec<char> = original.chars().collect();
    let n = count.min(chars.len());
    let mut result = chars.clone();
    if from_end {
        for c in result.iter_mut().rev().take(n) {
            *c = mask_char;
        }
    } else {
        for c in result.iter_mut().take(n) {
            *c = mask_char;
        }
    }
    result.into_iter().collect()
}

fn hash_digest(algorithm: HashAlgorithm, original: &str) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            hasher.update(original.as_bytes());
            format!("{:x}", hasher.finalize())
        }
    }
}

/// Reversible only in the sense that it is deterministic and keyed; this is
/// a stand-in for a real reversible cipher, not production cryptography.
fn encrypt(key: &str, original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hasher.update(original.as_bytes());
    format!("enc:{:x}", hasher.finalize())
}

/// Calls an external anonymizer service; kept as the HTTP seam the spec's
/// external service contract describes, even though the default
/// configuration runs the operator application locally via
/// [`anonymize_text`].
#[async_trait]
pub trait AnonymizerClient: Send + Sync {
    async fn anonymize(
        &self,
        text: &str,
        ranges: Vec<ResolvedRange>,
        operators: HashMap<String, Operator>,
    ) -> Result<(String, Vec<AppliedOperation>), AnonymizeError>;
}

#[derive(Default)]
pub struct LocalAnonymizerClient;

#[async_trait]
impl AnonymizerClient for LocalAnonymizerClient {
    async fn anonymize(
        &self,
        text: &str,
        ranges: Vec<ResolvedRange>,
        operators: HashMap<String, Operator>,
    ) -> Result<(String, Vec<AppliedOperation>), AnonymizeError> {
        let result = anonymize_text(text, ranges, |entity_type| {
            operators
                .get(entity_type)
                .cloned()
                .unwrap_or(Operator::Redact)
        });
        Ok(result)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeAnonymizerClient {
    pub fail: bool,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl AnonymizerClient for FakeAnonymizerClient {
    async fn anonymize(
        &self,
        text: &str,
        ranges: Vec<ResolvedRange>,
        operators: HashMap<String, Operator>,
    ) -> Result<(String, Vec<AppliedOperation>), AnonymizeError> {
        if self.fail {
            return Err(AnonymizeError::Unavailable("fake outage".to_string()));
        }
        Ok(anonymize_text(text, ranges, |entity_type| {
            operators
                .get(entity_type)
                .cloned()
                .unwrap_or(Operator::Redact)
        }))
    }
}

#[cfg(test)]
#[path = "anonymizer_tests.rs"]
mod tests;
