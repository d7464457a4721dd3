// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit trail for stage transitions.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::owner::OwnerId;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub actor: String,
    pub action: String,
    pub resource: OwnerId,
    pub details: HashMap<String, String>,
    pub at_epoch_ms: i64,
}

impl AuditEntry {
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        resource: OwnerId,
        at_epoch_ms: i64,
    ) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            resource,
            details: HashMap::new(),
            at_epoch_ms,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }
}
