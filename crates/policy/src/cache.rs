// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-local policy cache. Reads are lock-free against an `Arc` snapshot;
//! writes (load, invalidate) replace the map under a short-held lock —
//! copy-on-write, per the concurrency model's description of the policy
//! cache.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use redactflow_core::PolicyId;
use sha2::{Digest, Sha256};

use crate::default_policy::default_policy;
use crate::document::{parse_policy_document, PolicyDocumentError};
use crate::model::CompiledPolicy;

#[derive(Default)]
pub struct PolicyCache {
    by_id: RwLock<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
    content_hash: String,
    policy: Arc<CompiledPolicy>,
}

impl PolicyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached compiled policy for `id` if its content hash still
    /// matches `raw`; otherwise parses `raw`, caches it, and returns it.
    /// Unknown/unparsable documents fall back to the default policy rather
    /// than failing the lookup outright — `raw` being `None` models "no
    /// policy document found for this id".
    pub fn get_or_load(
        &self,
        id: &PolicyId,
        raw: Option<&[u8]>,
    ) -> Result<Arc<CompiledPolicy>, PolicyDocumentError> {
        let Some(raw) = raw else {
            return Ok(Arc::new(default_policy_for(id)));
        };
        let hash = content_hash(raw);
        if let Some(entry) = self.by_id.read().get(id.as_str()) {
            if entry.content_hash == hash {
                return Ok(entry.policy.clone());
            }
        }
        let compiled = parse_policy_document(id.clone(), raw)?;
        let policy = Arc::new(compiled);
        self.by_id.write().insert(
            id.as_str().to_string(),
            CacheEntry {
                content_hash: hash,
                policy: policy.clone(),
            },
        );
        Ok(policy)
    }

    /// Invalidates the cache entry for `id` on an explicit policy update
    /// event; the next `get_or_load` re-parses from scratch.
    pub fn invalidate(&self, id: &PolicyId) {
        self.by_id.write().remove(id.as_str());
    }

    pub fn len(&self) -> usize {
        self.by_id.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn default_policy_for(id: &PolicyId) -> CompiledPolicy {
    let mut policy = default_policy();
    policy.id = id.clone();
    policy
}

fn content_hash(raw: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(raw);
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
#[path = "cache_tests.rs"]
mod tests;
