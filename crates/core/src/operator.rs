// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Anonymization operators: functions that rewrite one detected range.

use serde::{Deserialize, Serialize};

use crate::finding::FindingAction;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "lowercase")]
pub enum Operator {
    Replace { new_value: String },
    Redact,
    Mask {
        #[serde(default = "default_mask_char")]
        char: char,
        count: usize,
        #[serde(default)]
        from_end: bool,
    },
    Hash { algorithm: HashAlgorithm },
    Encrypt { key: String },
}

fn default_mask_char() -> char {
    '*'
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
}

impl From<&Operator> for FindingAction {
    fn from(op: &Operator) -> Self {
        match op {
            Operator::Replace { .. } => FindingAction::Replace,
            Operator::Redact => FindingAction::Redact,
            Operator::Mask { .. } => FindingAction::Mask,
            Operator::Hash { .. } => FindingAction::Replace,
            Operator::Encrypt { .. } => FindingAction::Encrypt,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redact_maps_to_redact_action() {
        let action: FindingAction = (&Operator::Redact).into();
        assert_eq!(action, FindingAction::Redact);
    }

    #[test]
    fn mask_defaults_to_asterisk() {
        let json = serde_json::json!({"action": "mask", "count": 4});
        let op: Operator = serde_json::from_value(json).unwrap_or(Operator::Redact);
        match op {
            Operator::Mask { char, count, from_end } => {
                assert_eq!(char, '*');
                assert_eq!(count, 4);
                assert!(!from_end);
            }
            other => panic!("expected mask, got {other:?}"),
        }
    }
}
