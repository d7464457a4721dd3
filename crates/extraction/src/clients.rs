// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP collaborators for the `document` and `ocr` strategies.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DOCUMENT_TIMEOUT: Duration = Duration::from_secs(60);
const OCR_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ExtractorError {
    #[error("extraction collaborator unavailable: {0}")]
    Unavailable(String),
}

/// Calls the external document-extraction collaborator (Tika-style): raw
/// bytes in, `text/plain` out.
#[async_trait]
pub trait DocumentExtractorClient: Send + Sync {
    async fn extract(&self, bytes: &[u8], mime_type: &str) -> Result<String, ExtractorError>;
}

#[derive(Debug, Serialize)]
struct OcrOptions {
    languages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct OcrResponse {
    data: OcrResponseData,
}

#[derive(Debug, Deserialize)]
struct OcrResponseData {
    exit: OcrExit,
    stdout: String,
    stderr: String,
}

#[derive(Debug, Deserialize)]
struct OcrExit {
    code: i32,
    #[allow(dead_code)]
    signal: Option<i32>,
}

pub struct OcrOutput {
    pub text: String,
    pub stderr: String,
}

/// Calls the external OCR collaborator (Tesseract-style): image bytes in,
/// raw text plus diagnostics out.
#[async_trait]
pub trait OcrClient: Send + Sync {
    async fn recognize(&self, bytes: &[u8], language_hint: &str) -> Result<OcrOutput, ExtractorError>;
}

pub struct HttpDocumentExtractorClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpDocumentExtractorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(DOCUMENT_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl DocumentExtractorClient for HttpDocumentExtractorClient {
    async fn extract(&self, bytes: &[u8], mime_type: &str) -> Result<String, ExtractorError> {
        let url = format!("{}/extract", self.base_url);
        let response = self
            .http
            .put(&url)
            .header("Content-Type", mime_type.to_string())
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(|e| ExtractorError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExtractorError::Unavailable(format!(
                "document extractor returned {}",
                response.status()
            )));
        }
        response
            .text()
            .await
            .map_err(|e| ExtractorError::Unavailable(e.to_string()))
    }
}

pub struct HttpOcrClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpOcrClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder().timeout(OCR_TIMEOUT).build().unwrap_or_default(),
            base_url: base_url.into(),
        }
    }
}

#[async_trait]
impl OcrClient for HttpOcrClient {
    async fn recognize(&self, bytes: &[u8], language_hint: &str) -> Result<OcrOutput, ExtractorError> {
        let options = OcrOptions {
            languages: vec![language_hint.to_string()],
        };
        let options_json = serde_json::to_string(&options).map_err(|e| ExtractorError::Unavailable(e.to_string()))?;
        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(bytes.to_vec()))
            .part(
                "options",
                reqwest::multipart::Part::text(options_json).mime_str("application/json").map_err(|e| {
                    ExtractorError::Unavailable(e.to_string())
                })?,
            );
        let response = self
            .http
            .post(format!("{}/recognize", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ExtractorError::Unavailable(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ExtractorError::Unavailable(format!("ocr returned {}", response.status())));
        }
        let parsed: OcrResponse = response.json().await.map_err(|e| ExtractorError::Unavailable(e.to_string()))?;
        if parsed.data.exit.code != 0 {
            return Err(ExtractorError::Unavailable(format!(
                "ocr exited with code {}",
                parsed.data.exit.code
            )));
        }
        Ok(OcrOutput {
            text: parsed.data.stdout,
            stderr: parsed.data.stderr,
        })
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeDocumentExtractorClient {
    pub result: Result<String, String>,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl DocumentExtractorClient for FakeDocumentExtractorClient {
    async fn extract(&self, _bytes: &[u8], _mime_type: &str) -> Result<String, ExtractorError> {
        self.result.clone().map_err(ExtractorError::Unavailable)
    }
}

#[cfg(any(test, feature = "test-support"))]
pub struct FakeOcrClient {
    pub result: Result<OcrOutput, String>,
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl OcrClient for FakeOcrClient {
    async fn recognize(&self, _bytes: &[u8], _language_hint: &str) -> Result<OcrOutput, ExtractorError> {
        match &self.result {
            Ok(output) => Ok(OcrOutput {
                text: output.text.clone(),
                stderr: output.stderr.clone(),
            }),
            Err(e) => Err(ExtractorError::Unavailable(e.clone())),
        }
    }
}
