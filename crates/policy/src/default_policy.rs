// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The policy substituted for an unknown policy id: common entities,
//! threshold 0.8, action redact.

use std::collections::{HashMap, HashSet};

use redactflow_core::{Operator, PolicyId};

use crate::model::{AnonymizationConfig, CompiledPolicy, EntityConfig, ScopeConfig};

const DEFAULT_ENTITIES: &[&str] = &[
    "EMAIL_ADDRESS",
    "PHONE_NUMBER",
    "PERSON",
    "CREDIT_CARD",
    "US_SSN",
    "LOCATION",
];

pub fn default_policy() -> CompiledPolicy {
    let entities: HashSet<String> = DEFAULT_ENTITIES.iter().map(|s| s.to_string()).collect();
    let entity_configurations: HashMap<String, EntityConfig> = entities
        .iter()
        .map(|e| {
            (
                e.clone(),
                EntityConfig {
                    threshold: 0.8,
                    operator: Operator::Redact,
                },
            )
        })
        .collect();

    CompiledPolicy {
        id: PolicyId::new("default"),
        name: "default".to_string(),
        version: "1".to_string(),
        description: "Built-in fallback policy for unknown policy ids".to_string(),
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_has_threshold_0_8_and_redact_action() {
        let policy = default_policy();
        assert_eq!(policy.confidence_threshold, 0.8);
        assert!(policy.should_process_entity("EMAIL_ADDRESS", 0.8));
        assert!(matches!(
            policy.operator_for("EMAIL_ADDRESS"),
            Operator::Redact
        ));
    }
}
