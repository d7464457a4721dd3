// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Polymorphic ownership routing for audit entries and fan-out addressing.

use serde::{Deserialize, Serialize};

use crate::id::{DatasetId, JobId};

/// Identifies the resource an audit entry or event is about, without
/// resorting to an untyped "any" reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum OwnerId {
    Job(JobId),
    Dataset(DatasetId),
}

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OwnerId::Job(id) => write!(f, "job:{id}"),
            OwnerId::Dataset(id) => write!(f, "dataset:{id}"),
        }
    }
}
