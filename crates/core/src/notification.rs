// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persisted notifications, written before fan-out publish so a missed push
//! can be recovered by a subsequent pull (see the design note collapsing the
//! fan-out/notifications circular dependency).

use serde::{Deserialize, Serialize};

use crate::id::{NotificationId, UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    pub user_id: UserId,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub created_at_epoch_ms: i64,
    pub read: bool,
}

impl Notification {
    pub fn new(
        id: NotificationId,
        user_id: UserId,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
        created_at_epoch_ms: i64,
    ) -> Self {
        Self {
            id,
            user_id,
            title: title.into(),
            message: message.into(),
            kind,
            created_at_epoch_ms,
            read: false,
        }
    }
}
