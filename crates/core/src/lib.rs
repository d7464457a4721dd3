// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Domain types shared by every pipeline crate: identifiers, the job/dataset/
//! finding/policy data model, the event log, and the clock abstraction.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod audit;
pub mod auth;
pub mod clock;
pub mod dataset;
pub mod error;
pub mod event;
pub mod extracted_text;
pub mod fanout;
pub mod finding;
pub mod id;
pub mod job;
pub mod notification;
pub mod operator;
pub mod owner;

pub use audit::AuditEntry;
pub use auth::{AllowAll, AuthGuard, Principal, ResourceRef};
pub use clock::{Clock, FakeClock, SystemClock};
pub use dataset::{Dataset, DatasetMetadata, DatasetStatus};
pub use error::{StageError, StageErrorKind};
pub use event::Event;
pub use extracted_text::{ExtractedText, ExtractionMethod};
pub use fanout::{
    DatasetUpdateData, EventFrame, FanoutEvent, FanoutEventKind, HeartbeatData, JobStatusData,
    NotificationData, SystemStatusData,
};
pub use finding::{Finding, FindingAction, FindingContext};
pub use id::{
    AttemptId, DatasetId, FindingId, IdGen, JobId, NotificationId, PolicyId, ProjectId,
    SequentialIdGen, SubscriberId, UserId, UuidIdGen,
};
pub use job::{Job, JobKind, JobMetadata, JobStatus, MetadataValue};
pub use notification::{Notification, NotificationKind};
pub use operator::{HashAlgorithm, Operator};
pub use owner::OwnerId;

/// Test-support builders, gated the same way `oj_core::test_support` is:
/// available to this crate's own tests unconditionally, and to downstream
/// crates only under `feature = "test-support"`.
#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    use crate::clock::FakeClock;
    use crate::dataset::Dataset;
    use crate::id::{DatasetId, ProjectId};
    use crate::job::{Job, JobKind};
    use crate::id::{JobId, UserId};

    pub fn fake_clock_at(epoch_ms: i64) -> FakeClock {
        let clock = FakeClock::new();
        clock.set_epoch_ms(epoch_ms);
        clock
    }

    pub fn sample_dataset(id: &str) -> Dataset {
        Dataset::new(
            DatasetId::new(id),
            ProjectId::new("project-1"),
            "contacts.txt",
            "txt",
            "text/plain",
            128,
            format!("/uploads/{id}"),
            0,
        )
    }

    pub fn sample_job(id: &str, kind: JobKind, dataset_id: &str) -> Job {
        Job::new(
            JobId::new(id),
            kind,
            DatasetId::new(dataset_id),
            UserId::new("user-1"),
            0,
            0,
        )
    }
}
