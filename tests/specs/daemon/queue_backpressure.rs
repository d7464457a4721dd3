// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue-depth backpressure: enqueues at capacity fail fast with
//! `kind=queue_full`, surfaced as a 503 at the API boundary.

use crate::prelude::*;

fn enqueue_body(job_id: &str, dataset_id: &str) -> serde_json::Value {
    serde_json::json!({
        "jobId": job_id,
        "userId": "user-1",
        "datasetId": dataset_id,
        "filePath": "/nonexistent/does-not-matter",
        "fileName": "contacts.txt",
        "fileSize": 128,
        "mimeType": "text/plain",
    })
}

#[test]
fn enqueue_at_capacity_returns_queue_full() {
    // Worker concurrency 0: nothing dequeues, so both accepted jobs stay
    // Queued and keep counting against max_queue_depth.
    let daemon = DaemonHandle::start(&[("REDACTFLOW_QUEUE_MAX_DEPTH", "2"), ("REDACTFLOW_WORKER_CONCURRENCY", "0")]);

    let (status, _) = http_post(&daemon.url("/v1/datasets"), &enqueue_body("job-1", "dataset-1"));
    assert_eq!(status, 201);
    let (status, _) = http_post(&daemon.url("/v1/datasets"), &enqueue_body("job-2", "dataset-2"));
    assert_eq!(status, 201);

    let (status, body) = http_post(&daemon.url("/v1/datasets"), &enqueue_body("job-3", "dataset-3"));
    assert_eq!(status, 503);
    assert_eq!(body["kind"], "queue_full");
}

#[test]
fn enqueue_below_capacity_succeeds() {
    let daemon = DaemonHandle::start(&[("REDACTFLOW_QUEUE_MAX_DEPTH", "5"), ("REDACTFLOW_WORKER_CONCURRENCY", "0")]);

    let (status, body) = http_post(&daemon.url("/v1/datasets"), &enqueue_body("job-1", "dataset-1"));
    assert_eq!(status, 201);
    assert_eq!(body["jobId"], "job-1");
    assert_eq!(body["datasetId"], "dataset-1");
}
