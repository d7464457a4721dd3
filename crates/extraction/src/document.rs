// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Document strategy: forwards raw bytes to the external document-extraction
//! collaborator and trusts its plain-text response.

use std::collections::HashMap;

use redactflow_core::{ExtractedText, ExtractionMethod};

use crate::clients::{DocumentExtractorClient, ExtractorError};

pub async fn extract_document(
    client: &dyn DocumentExtractorClient,
    bytes: &[u8],
    mime_type: &str,
) -> Result<ExtractedText, ExtractorError> {
    let text = client.extract(bytes, mime_type).await?;
    Ok(ExtractedText {
        text,
        encoding: "utf-8".to_string(),
        method: Some(ExtractionMethod::Document),
        confidence: 0.9,
        metadata: HashMap::new(),
        truncated: false,
        original_length: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::FakeDocumentExtractorClient;

    #[tokio::test]
    async fn successful_extraction_reports_fixed_confidence() {
        let client = FakeDocumentExtractorClient {
            result: Ok("extracted body".to_string()),
        };
        let result = extract_document(&client, b"bytes", "application/msword").await.unwrap();
        assert_eq!(result.text, "extracted body");
        assert_eq!(result.confidence, 0.9);
    }

    #[tokio::test]
    async fn collaborator_failure_propagates() {
        let client = FakeDocumentExtractorClient {
            result: Err("timed out".to_string()),
        };
        let result = extract_document(&client, b"bytes", "application/msword").await;
        assert!(result.is_err());
    }
}
