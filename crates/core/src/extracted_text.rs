// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transient per-job text extraction artifact.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Which strategy produced (or attempted to produce) the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionMethod {
    Direct,
    Pdf,
    PdfFallbackDocument,
    Document,
    Ocr,
    Hybrid,
    Failed,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedText {
    pub text: String,
    pub encoding: String,
    pub method: Option<ExtractionMethod>,
    pub confidence: f32,
    pub metadata: HashMap<String, String>,
    pub truncated: bool,
    pub original_length: Option<usize>,
}

impl ExtractedText {
    pub fn failed(error: impl Into<String>, now_epoch_ms: i64) -> Self {
        let mut metadata = HashMap::new();
        metadata.insert("error".to_string(), error.into());
        metadata.insert("timestamp".to_string(), now_epoch_ms.to_string());
        Self {
            text: String::new(),
            encoding: String::new(),
            method: Some(ExtractionMethod::Failed),
            confidence: 0.0,
            metadata,
            truncated: false,
            original_length: None,
        }
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_extraction_carries_error_and_zero_confidence() {
        let extracted = ExtractedText::failed("boom", 123);
        assert_eq!(extracted.method, Some(ExtractionMethod::Failed));
        assert_eq!(extracted.confidence, 0.0);
        assert_eq!(extracted.metadata.get("error"), Some(&"boom".to_string()));
    }
}
