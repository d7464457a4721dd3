// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification persistence. Notifications are written to the WAL before
//! they're published on the fan-out (see the design note collapsing the
//! fan-out/notifications circular dependency): a missed push is always
//! recoverable by pulling the persisted record back out of materialized
//! state.

use redactflow_core::{Event, IdGen, Notification, NotificationKind, UserId};
use redactflow_engine::Effect;

/// Window used by [`cleanup_old_notifications`]: the live-code policy this
/// implementation keeps (see DESIGN.md's resolution of the notification
/// retention open question), over the commented-out last-1000-per-user
/// alternative.
pub const NOTIFICATION_RETENTION: std::time::Duration = std::time::Duration::from_secs(90 * 24 * 3600);

/// Builds the effect to persist a new notification, ready to execute and
/// then publish on the fan-out.
pub fn notify_effect(
    id_gen: &dyn IdGen,
    user_id: UserId,
    title: impl Into<String>,
    message: impl Into<String>,
    kind: NotificationKind,
    now_epoch_ms: i64,
) -> (Notification, Effect) {
    let notification = Notification::new(id_gen.next_notification_id(), user_id, title, message, kind, now_epoch_ms);
    let effect = Effect::Emit {
        event: Event::NotificationCreated {
            notification: notification.clone(),
        },
    };
    (notification, effect)
}

/// Effect to purge notifications older than [`NOTIFICATION_RETENTION`].
pub fn cleanup_old_notifications_effect(now_epoch_ms: i64) -> Effect {
    let before_epoch_ms = now_epoch_ms - NOTIFICATION_RETENTION.as_millis() as i64;
    Effect::Emit {
        event: Event::NotificationsPurged { before_epoch_ms },
    }
}
