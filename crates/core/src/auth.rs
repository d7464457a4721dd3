// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Authorization seam. CRUD controllers and token minting are out of scope
//! (see the purpose & scope non-goals); this trait is the boundary a real
//! auth collaborator would implement against, re-expressing "runtime
//! reflection of decorator metadata" as an explicit predicate instead of
//! type-level role annotations.

use crate::owner::OwnerId;

/// The caller of a pipeline-facing operation, as resolved by whatever
/// upstream collaborator owns authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: String,
    pub roles: Vec<String>,
}

impl Principal {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            roles: Vec::new(),
        }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// What a [`Principal`] is attempting to act on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    pub owner: OwnerId,
}

/// `(principal, resource) -> bool`. Policies for which roles may act on a
/// resource live in the implementer's config, not in type decorations on
/// the resource itself.
pub trait AuthGuard: Send + Sync {
    fn allows(&self, principal: &Principal, resource: &ResourceRef) -> bool;
}

/// The only implementation this crate provides: every request is allowed.
/// A stand-in for a real auth collaborator, which this core deliberately
/// does not implement.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowAll;

impl AuthGuard for AllowAll {
    fn allows(&self, _principal: &Principal, _resource: &ResourceRef) -> bool {
        true
    }
}
