// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The PII detector client: calls the analyzer service, normalizes
//! detections, and applies the effective score threshold.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_SCORE_THRESHOLD: f32 = 0.5;
const DETECTOR_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, Serialize)]
pub struct AnalyzeRequest {
    pub text: String,
    pub language: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<String>>,
    pub score_threshold: f32,
    pub correlation_id: String,
}

impl AnalyzeRequest {
    pub fn new(text: impl Into<String>, correlation_id: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            language: "en".to_string(),
            entities: None,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            correlation_id: correlation_id.into(),
        }
    }

    /// `scoreThreshold` default 0.5; effective threshold is
    /// `max(scoreThreshold, policy.threshold)`.
    pub fn with_effective_threshold(mut self, policy_threshold: f32) -> Self {
        self.score_threshold = self.score_threshold.max(policy_threshold);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_explanation: Option<String>,
}

#[derive(Debug, Error)]
pub enum DetectError {
    #[error("detector unavailable: {0}")]
    Unavailable(String),
}

/// Calls the analyzer service. Real implementations are `reqwest`-backed;
/// fakes live behind `test-support` for engine/daemon tests.
#[async_trait]
pub trait DetectorClient: Send + Sync {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<Vec<Detection>, DetectError>;
}

/// Filters raw detections by the effective threshold and orders them by
/// `(start, end)`, overlaps intact — the detector contract never resolves
/// overlaps itself, that's the anonymizer's job.
pub fn apply_threshold(mut detections: Vec<Detection>, effective_threshold: f32) -> Vec<Detection> {
    detections.retain(|d| d.score >= effective_threshold);
    detections.sort_by_key(|d| (d.start, d.end));
    detections
}

pub struct HttpDetectorClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDetectorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(DETECTOR_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DetectorClient for HttpDetectorClient {
    async fn analyze(&self, request: AnalyzeRequest) -> Result<Vec<Detection>, DetectError> {
        let url = format!("{}/analyze", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| DetectError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(DetectError::Unavailable(format!(
                "detector returned {}",
                response.status()
            )));
        }
        response
            .json::<Vec<Detection>>()
            .await
            .map_err(|e| DetectError::Unavailable(e.to_string()))
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeDetectorClient {
    pub detections: Vec<Detection>,
    pub fail: bool,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl DetectorClient for FakeDetectorClient {
    async fn analyze(&self, _request: AnalyzeRequest) -> Result<Vec<Detection>, DetectError> {
        if self.fail {
            return Err(DetectError::Unavailable("fake outage".to_string()));
        }
        Ok(self.detections.clone())
    }
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
