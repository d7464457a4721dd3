// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wire shape of events pushed to subscribers. A tagged sum over the finite
//! set of frame kinds, per the design note replacing dynamic "any" payloads;
//! each variant's `data` is a concrete struct, not a free-form map.

use serde::Serialize;

use crate::dataset::DatasetStatus;
use crate::id::{DatasetId, JobId, NotificationId};
use crate::job::JobStatus;
use crate::notification::NotificationKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FanoutEventKind {
    JobStatus,
    DatasetUpdate,
    Notification,
    Heartbeat,
    SystemStatus,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatusData {
    pub job_id: JobId,
    pub status: JobStatus,
    pub progress: u8,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetUpdateData {
    pub dataset_id: DatasetId,
    pub status: DatasetStatus,
    pub findings_count: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct NotificationData {
    pub id: NotificationId,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
}

#[derive(Debug, Clone, Serialize)]
pub struct HeartbeatData {
    pub timestamp: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SystemStatusData {
    pub message: String,
}

/// One frame pushed to a subscriber. Carries its own timestamp; the wire
/// encoding is `{type, data, timestamp}` per the outbound event contract.
#[derive(Debug, Clone)]
pub enum FanoutEvent {
    JobStatus(JobStatusData),
    DatasetUpdate(DatasetUpdateData),
    Notification(NotificationData),
    Heartbeat(HeartbeatData),
    SystemStatus(SystemStatusData),
}

impl FanoutEvent {
    pub fn kind(&self) -> FanoutEventKind {
        match self {
            FanoutEvent::JobStatus(_) => FanoutEventKind::JobStatus,
            FanoutEvent::DatasetUpdate(_) => FanoutEventKind::DatasetUpdate,
            FanoutEvent::Notification(_) => FanoutEventKind::Notification,
            FanoutEvent::Heartbeat(_) => FanoutEventKind::Heartbeat,
            FanoutEvent::SystemStatus(_) => FanoutEventKind::SystemStatus,
        }
    }

    pub fn into_frame(self, timestamp: i64) -> EventFrame {
        let kind = self.kind();
        let data = match self {
            FanoutEvent::JobStatus(d) => serde_json::to_value(d),
            FanoutEvent::DatasetUpdate(d) => serde_json::to_value(d),
            FanoutEvent::Notification(d) => serde_json::to_value(d),
            FanoutEvent::Heartbeat(d) => serde_json::to_value(d),
            FanoutEvent::SystemStatus(d) => serde_json::to_value(d),
        }
        .unwrap_or(serde_json::Value::Null);
        EventFrame {
            kind,
            data,
            timestamp,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct EventFrame {
    #[serde(rename = "type")]
    pub kind: FanoutEventKind,
    pub data: serde_json::Value,
    pub timestamp: i64,
}

impl EventFrame {
    /// `data: <json>\n\n` wire encoding for the `text/event-stream` subscriber
    /// transport.
    pub fn to_sse_data(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_status_frame_wraps_type_data_and_timestamp() {
        let event = FanoutEvent::JobStatus(JobStatusData {
            job_id: JobId::new("job-1"),
            status: JobStatus::Running,
            progress: 50,
            message: None,
        });
        let frame = event.into_frame(1_000);
        assert_eq!(frame.kind, FanoutEventKind::JobStatus);
        assert_eq!(frame.timestamp, 1_000);
        assert_eq!(frame.data["jobId"], "job-1");
    }

    #[test]
    fn heartbeat_carries_its_own_timestamp_field_too() {
        let event = FanoutEvent::Heartbeat(HeartbeatData { timestamp: 42 });
        let frame = event.into_frame(42);
        assert_eq!(frame.data["timestamp"], 42);
    }
}
