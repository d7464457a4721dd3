// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scenario: an input file exceeds the configured size ceiling. The
//! FileProcessing stage must fail the job with `file_too_large` on its
//! first attempt rather than retry or silently truncate.

use std::io::Write;

use crate::prelude::*;

#[test]
fn oversized_file_fails_with_file_too_large() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    file.write_all(&[b'a'; 64]).expect("write");
    let path = file.path().to_string_lossy().into_owned();

    let daemon = DaemonHandle::start(&[("REDACTFLOW_STORAGE_MAX_FILE_SIZE", "8")]);

    let body = serde_json::json!({
        "jobId": "job-oversized",
        "userId": "user-1",
        "datasetId": "dataset-oversized",
        "filePath": path,
        "fileName": "big.txt",
        "fileSize": 64,
        "mimeType": "text/plain",
    });
    let (status, _) = http_post(&daemon.url("/v1/datasets"), &body);
    assert_eq!(status, 201);

    let job_url = daemon.url("/v1/jobs/job-oversized");
    let mut last = serde_json::Value::Null;
    let terminal = wait_for(SPEC_WAIT_MAX_MS, || {
        let (status, job) = http_get(&job_url);
        last = job;
        status == 200 && last["status"] != "Queued" && last["status"] != "Running"
    });
    assert!(terminal, "job should reach a terminal status, last seen: {last}");

    assert_eq!(last["status"], "Failed", "job body: {last}");
    let error = last["error"].as_str().unwrap_or_default();
    assert!(error.contains("file_too_large"), "unexpected error: {error}");
}
