// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The normalized, in-memory shape every policy document compiles down to,
//! regardless of which wire shape it arrived in.

use std::collections::{HashMap, HashSet};

use redactflow_core::{Operator, PolicyId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityConfig {
    pub threshold: f32,
    pub operator: Operator,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnonymizationConfig {
    pub default_action: Operator,
    pub preserve_format: bool,
    pub audit_trail: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopeConfig {
    pub file_types: Vec<String>,
    pub max_file_size: Option<u64>,
}

/// A parsed, normalized policy. This is what `shouldProcessEntity` and
/// `operatorFor` read from; nothing downstream ever re-parses the raw
/// document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompiledPolicy {
    pub id: PolicyId,
    pub name: String,
    pub version: String,
    pub description: String,
    pub entities: HashSet<String>,
    pub confidence_threshold: f32,
    pub entity_configurations: HashMap<String, EntityConfig>,
    pub anonymization: AnonymizationConfig,
    pub scope: ScopeConfig,
}

impl CompiledPolicy {
    /// `shouldProcessEntity(type, confidence)`: true iff `type` is enabled
    /// and `confidence >= entity_configurations[type].threshold`, falling
    /// back to the global threshold if the entity has no per-entity config.
    pub fn should_process_entity(&self, entity_type: &str, confidence: f32) -> bool {
        if !self.entities.contains(entity_type) {
            return false;
        }
        let threshold = self
            .entity_configurations
            .get(entity_type)
            .map(|c| c.threshold)
            .unwrap_or(self.confidence_threshold);
        confidence >= threshold
    }

    /// The effective detection threshold for an entity, used to compute
    /// `max(scoreThreshold, policy.threshold)` at the detector boundary.
    pub fn threshold_for(&self, entity_type: &str) -> f32 {
        self.entity_configurations
            .get(entity_type)
            .map(|c| c.threshold)
            .unwrap_or(self.confidence_threshold)
    }

    /// `operatorFor(type)`: the configured operator, or the policy default.
    pub fn operator_for(&self, entity_type: &str) -> &Operator {
        self.entity_configurations
            .get(entity_type)
            .map(|c| &c.operator)
            .unwrap_or(&self.anonymization.default_action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> CompiledPolicy {
        let mut entities = HashSet::new();
        entities.insert("EMAIL_ADDRESS".to_string());
        let mut entity_configurations = HashMap::new();
        entity_configurations.insert(
            "EMAIL_ADDRESS".to_string(),
            EntityConfig {
                threshold: 0.6,
                operator: Operator::Redact,
            },
        );
        CompiledPolicy {
            id: PolicyId::new("policy-1"),
            name: "test".into(),
            version: "1".into(),
            description: String::new(),
            entities,
            confidence_threshold: 0.8,
            entity_configurations,
            anonymization: AnonymizationConfig {
                default_action: Operator::Redact,
                preserve_format: false,
                audit_trail: true,
            },
            scope: ScopeConfig::default(),
        }
    }

    #[test]
    fn disabled_entity_is_never_processed_regardless_of_confidence() {
        let policy = policy();
        assert!(!policy.should_process_entity("PHONE_NUMBER", 0.99));
    }

    #[test]
    fn enabled_entity_uses_its_own_threshold_not_the_global_one() {
        let policy = policy();
        assert!(policy.should_process_entity("EMAIL_ADDRESS", 0.65));
        assert!(!policy.should_process_entity("EMAIL_ADDRESS", 0.5));
    }

    #[test]
    fn entity_without_per_entity_config_falls_back_to_global_threshold() {
        let mut policy = policy();
        policy.entities.insert("LOCATION".to_string());
        assert!(!policy.should_process_entity("LOCATION", 0.7));
        assert!(policy.should_process_entity("LOCATION", 0.85));
    }
}
