// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parses the two document shapes a policy can arrive in (structured and
//! legacy flat) into the normalized [`CompiledPolicy`].

use std::collections::{HashMap, HashSet};

use redactflow_core::{Operator, PolicyId};
use serde::Deserialize;
use thiserror::Error;

use crate::model::{AnonymizationConfig, CompiledPolicy, EntityConfig, ScopeConfig};

#[derive(Debug, Error, PartialEq)]
pub enum PolicyDocumentError {
    #[error("policy document is neither a valid structured nor legacy document: {0}")]
    Invalid(String),
}

/// Structured form: `name`/`version`/`description`; `detection.entities[]`;
/// `anonymization`; `scope`.
#[derive(Debug, Deserialize)]
struct StructuredDocument {
    name: String,
    version: String,
    #[serde(default)]
    description: String,
    detection: StructuredDetection,
    anonymization: StructuredAnonymization,
    #[serde(default)]
    scope: StructuredScope,
}

#[derive(Debug, Deserialize)]
struct StructuredDetection {
    entities: Vec<StructuredEntity>,
}

#[derive(Debug, Deserialize)]
struct StructuredEntity {
    #[serde(rename = "type")]
    entity_type: String,
    threshold: f32,
    operator: Operator,
}

#[derive(Debug, Deserialize)]
struct StructuredAnonymization {
    default_action: Operator,
    #[serde(default)]
    preserve_format: bool,
    #[serde(default)]
    audit_trail: bool,
}

#[derive(Debug, Default, Deserialize)]
struct StructuredScope {
    #[serde(default)]
    file_types: Vec<String>,
    #[serde(default)]
    max_file_size: Option<u64>,
}

/// Legacy flat form: a bare list of entities, one global
/// `confidence_threshold`, and `anonymization.default_anonymizer`.
#[derive(Debug, Deserialize)]
struct LegacyDocument {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    entities: Vec<String>,
    confidence_threshold: f32,
    anonymization: LegacyAnonymization,
}

#[derive(Debug, Deserialize)]
struct LegacyAnonymization {
    default_anonymizer: Operator,
}

/// Parses a raw JSON policy document (either shape) into a normalized,
/// compiled policy. Neither shape parsing cleanly is a `policy_invalid`
/// stage error, not a panic.
pub fn parse_policy_document(
    id: PolicyId,
    raw: &[u8],
) -> Result<CompiledPolicy, PolicyDocumentError> {
    if let Ok(structured) = serde_json::from_slice::<StructuredDocument>(raw) {
        return Ok(compile_structured(id, structured));
    }
    if let Ok(legacy) = serde_json::from_slice::<LegacyDocument>(raw) {
        return Ok(compile_legacy(id, legacy));
    }
    Err(PolicyDocumentError::Invalid(
        String::from_utf8_lossy(raw).chars().take(120).collect(),
    ))
}

fn compile_structured(id: PolicyId, doc: StructuredDocument) -> CompiledPolicy {
    let mut entities = HashSet::new();
    let mut entity_configurations = HashMap::new();
    for entity in doc.detection.entities {
        entities.insert(entity.entity_type.clone());
        entity_configurations.insert(
            entity.entity_type,
            EntityConfig {
                threshold: entity.threshold,
                operator: entity.operator,
            },
        );
    }
    let confidence_threshold = entity_configurations
        .values()
        .map(|c| c.threshold)
        .fold(f32::INFINITY, f32::min);
    let confidence_threshold = if confidence_threshold.is_finite() {
        confidence_threshold
    } else {
        0.8
    };

    CompiledPolicy {
        id,
        name: doc.name,
        version: doc.version,
        description: doc.description,
        entities,
        confidence_threshold,
        entity_configurations,
        anonymization: AnonymizationConfig {
            default_action: doc.anonymization.default_action,
            preserve_format: doc.anonymization.preserve_format,
            audit_trail: doc.anonymization.audit_trail,
        },
        scope: ScopeConfig {
            file_types: doc.scope.file_types,
            max_file_size: doc.scope.max_file_size,
        },
    }
}

fn compile_legacy(id: PolicyId, doc: LegacyDocument) -> CompiledPolicy {
    let entities: HashSet<String> = doc.entities.into_iter().collect();
    CompiledPolicy {
        id,
        name: doc.name.unwrap_or_else(|| "legacy".to_string()),
        version: doc.version.unwrap_or_else(|| "1".to_string()),
        description: String::new(),
        entities,
        confidence_threshold: doc.confidence_threshold,
        entity_configurations: HashMap::new(),
        anonymization: AnonymizationConfig {
            default_action: doc.anonymization.default_anonymizer,
            preserve_format: false,
            audit_trail: false,
        },
        scope: ScopeConfig::default(),
    }
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
