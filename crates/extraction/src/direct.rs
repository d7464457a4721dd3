// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Direct strategy: read bytes as UTF-8, falling back to Latin-1 once.

use std::collections::HashMap;

use redactflow_core::{ExtractedText, ExtractionMethod};

pub fn extract_direct(bytes: &[u8]) -> ExtractedText {
    match std::str::from_utf8(bytes) {
        Ok(text) => ExtractedText {
            text: text.to_string(),
            encoding: "utf-8".to_string(),
            method: Some(ExtractionMethod::Direct),
            confidence: 1.0,
            metadata: HashMap::new(),
            truncated: false,
            original_length: None,
        },
        Err(_) => {
            let text: String = bytes.iter().map(|&b| b as char).collect();
            let mut metadata = HashMap::new();
            metadata.insert("fallbackEncoding".to_string(), "true".to_string());
            ExtractedText {
                text,
                encoding: "latin-1".to_string(),
                method: Some(ExtractionMethod::Direct),
                confidence: 0.8,
                metadata,
                truncated: false,
                original_length: None,
            }
        }
    }
}
