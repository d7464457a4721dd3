// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! ID generation abstractions

use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Defines a newtype identifier backed by a `String`, with the usual
/// `Display`/`From`/equality glue so call sites can treat it like a string
/// without actually being one.
macro_rules! define_id {
    ($(#[$meta:meta])* $vis:vis struct $name:ident;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            /// Wrap an existing string as this id type.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Identifies a single unit of pipeline work on one dataset stage.
    pub struct JobId;
}

define_id! {
    /// Identifies the user-uploaded file tracked through the pipeline.
    pub struct DatasetId;
}

define_id! {
    /// Identifies one detected PII instance.
    pub struct FindingId;
}

define_id! {
    /// Identifies a declarative policy document (by id, not version).
    pub struct PolicyId;
}

define_id! {
    /// Identifies the project a dataset belongs to.
    pub struct ProjectId;
}

define_id! {
    /// Identifies the user a project belongs to.
    pub struct UserId;
}

define_id! {
    /// Identifies one live subscriber on the event fan-out.
    pub struct SubscriberId;
}

define_id! {
    /// Identifies one execution attempt of a job; part of the idempotence key.
    pub struct AttemptId;
}

define_id! {
    /// Identifies a persisted notification.
    pub struct NotificationId;
}

/// Generates identifiers for new domain objects.
///
/// Production code uses [`UuidIdGen`]; tests use [`SequentialIdGen`] so
/// assertions can pin exact id values instead of matching on shape.
pub trait IdGen: Send + Sync {
    fn next_job_id(&self) -> JobId;
    fn next_dataset_id(&self) -> DatasetId;
    fn next_finding_id(&self) -> FindingId;
    fn next_subscriber_id(&self) -> SubscriberId;
    fn next_attempt_id(&self) -> AttemptId;
    fn next_notification_id(&self) -> NotificationId;
}

/// Produces random v4 UUIDs. The production default.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidIdGen;

impl IdGen for UuidIdGen {
    fn next_job_id(&self) -> JobId {
        JobId::new(Uuid::new_v4().to_string())
    }

    fn next_dataset_id(&self) -> DatasetId {
        DatasetId::new(Uuid::new_v4().to_string())
    }

    fn next_finding_id(&self) -> FindingId {
        FindingId::new(Uuid::new_v4().to_string())
    }

    fn next_subscriber_id(&self) -> SubscriberId {
        SubscriberId::new(Uuid::new_v4().to_string())
    }

    fn next_attempt_id(&self) -> AttemptId {
        AttemptId::new(Uuid::new_v4().to_string())
    }

    fn next_notification_id(&self) -> NotificationId {
        NotificationId::new(Uuid::new_v4().to_string())
    }
}

/// Produces predictable, monotonically increasing ids. Test-only.
#[derive(Debug, Default)]
pub struct SequentialIdGen {
    counter: AtomicU64,
}

impl SequentialIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self, prefix: &str) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{prefix}-{n}")
    }
}

impl IdGen for SequentialIdGen {
    fn next_job_id(&self) -> JobId {
        JobId::new(self.next("job"))
    }

    fn next_dataset_id(&self) -> DatasetId {
        DatasetId::new(self.next("dataset"))
    }

    fn next_finding_id(&self) -> FindingId {
        FindingId::new(self.next("finding"))
    }

    fn next_subscriber_id(&self) -> SubscriberId {
        SubscriberId::new(self.next("sub"))
    }

    fn next_attempt_id(&self) -> AttemptId {
        AttemptId::new(self.next("attempt"))
    }

    fn next_notification_id(&self) -> NotificationId {
        NotificationId::new(self.next("notif"))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
