// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client for CLI commands: a thin `reqwest` wrapper around
//! redactflowd's HTTP/SSE surface, mirroring the same request/response
//! shapes the daemon's own `api` module defines.

use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("could not reach redactflowd: {0}")]
    Unreachable(#[from] reqwest::Error),

    #[error("redactflowd returned {status}: {message}")]
    Api { status: reqwest::StatusCode, message: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueFileProcessingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub dataset_id: String,
    pub file_path: String,
    pub file_name: String,
    pub file_size: u64,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueueFileProcessingResponse {
    pub job_id: String,
    pub dataset_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobView {
    pub job_id: String,
    pub kind: String,
    pub status: String,
    pub progress: u8,
    pub attempt: u32,
    pub dataset_id: String,
    pub error: Option<String>,
    pub created_at_epoch_ms: i64,
    pub started_at_epoch_ms: Option<i64>,
    pub ended_at_epoch_ms: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetView {
    pub dataset_id: String,
    pub filename: String,
    pub file_type: String,
    pub mime_type: String,
    pub byte_size: u64,
    pub status: String,
    pub findings_count: u32,
    pub output_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryResponse {
    pub job_id: String,
}

pub struct DaemonClient {
    http: reqwest::Client,
    base_url: String,
}

impl DaemonClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build().unwrap_or_default(),
            base_url: base_url.into(),
        }
    }

    pub async fn enqueue_file_processing(
        &self,
        req: &EnqueueFileProcessingRequest,
    ) -> Result<EnqueueFileProcessingResponse, ClientError> {
        let response = self.http.post(format!("{}/v1/datasets", self.base_url)).json(req).send().await?;
        Self::into_json(response).await
    }

    pub async fn get_job(&self, job_id: &str) -> Result<JobView, ClientError> {
        let response = self.http.get(format!("{}/v1/jobs/{job_id}", self.base_url)).send().await?;
        Self::into_json(response).await
    }

    pub async fn get_dataset(&self, dataset_id: &str) -> Result<DatasetView, ClientError> {
        let response = self.http.get(format!("{}/v1/datasets/{dataset_id}", self.base_url)).send().await?;
        Self::into_json(response).await
    }

    pub async fn cancel_job(&self, job_id: &str) -> Result<(), ClientError> {
        let response = self.http.post(format!("{}/v1/jobs/{job_id}/cancel", self.base_url)).send().await?;
        Self::expect_success(response).await
    }

    pub async fn retry_job(&self, job_id: &str) -> Result<RetryResponse, ClientError> {
        let response = self.http.post(format!("{}/v1/jobs/{job_id}/retry", self.base_url)).send().await?;
        Self::into_json(response).await
    }

    /// Streams raw `data:` payloads off `/v1/events` as they arrive. Each
    /// item is one event frame's JSON body; parsing it further is left to
    /// the caller since the CLI only ever re-prints it.
    pub async fn watch_events(&self) -> Result<impl Stream<Item = Result<String, ClientError>>, ClientError> {
        let response = self.http.get(format!("{}/v1/events", self.base_url)).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }
        Ok(sse_lines(response.bytes_stream()))
    }

    async fn expect_success(response: reqwest::Response) -> Result<(), ClientError> {
        if response.status().is_success() {
            Ok(())
        } else {
            let status = response.status();
            let message = response.text().await.unwrap_or_default();
            Err(ClientError::Api { status, message })
        }
    }

    async fn into_json<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Api { status, message });
        }
        Ok(response.json().await?)
    }
}

/// Re-chunks an SSE byte stream into individual `data:` payloads, stripping
/// the `data: ` prefix. Comment lines (`:`) and blank keep-alive frames are
/// skipped; anything else in a frame besides `data:` (the daemon never sends
/// `event:`/`id:` lines) is ignored rather than treated as an error.
fn sse_lines<S, B>(chunks: S) -> impl Stream<Item = Result<String, ClientError>>
where
    S: Stream<Item = reqwest::Result<B>>,
    B: AsRef<[u8]>,
{
    let mut buffer = String::new();
    chunks.filter_map(move |chunk| {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(err) => return futures::future::ready(Some(Err(ClientError::from(err)))),
        };
        buffer.push_str(&String::from_utf8_lossy(chunk.as_ref()));

        let mut out = None;
        while let Some(pos) = buffer.find("\n\n") {
            let frame = buffer[..pos].to_string();
            buffer.drain(..=pos + 1);
            for line in frame.lines() {
                if let Some(data) = line.strip_prefix("data: ").or_else(|| line.strip_prefix("data:")) {
                    out = Some(Ok(data.to_string()));
                }
            }
            if out.is_some() {
                break;
            }
        }
        futures::future::ready(out)
    })
}
