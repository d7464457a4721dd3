// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OCR strategy: forwards to the external OCR collaborator and estimates
//! confidence from stderr warnings plus textual shape heuristics, since the
//! collaborator itself reports no score.

use std::collections::HashMap;

use redactflow_core::{ExtractedText, ExtractionMethod};

use crate::clients::{ExtractorError, OcrClient};

const MIN_CONFIDENCE_PERCENT: f32 = 60.0;
const MAX_CONFIDENCE_PERCENT: f32 = 95.0;

pub async fn extract_ocr(
    client: &dyn OcrClient,
    bytes: &[u8],
    language_hint: &str,
) -> Result<ExtractedText, ExtractorError> {
    let output = client.recognize(bytes, language_hint).await?;
    let confidence_percent = estimate_confidence(&output.text, &output.stderr);

    let mut metadata = HashMap::new();
    if !output.stderr.is_empty() {
        metadata.insert("stderr".to_string(), output.stderr);
    }

    Ok(ExtractedText {
        text: output.text,
        encoding: "utf-8".to_string(),
        method: Some(ExtractionMethod::Ocr),
        confidence: confidence_percent / 100.0,
        metadata,
        truncated: false,
        original_length: None,
    })
}

/// `language_hint` defaults to English when the caller has no better signal.
pub const DEFAULT_LANGUAGE_HINT: &str = "eng";

fn estimate_confidence(text: &str, stderr: &str) -> f32 {
    let mut confidence = 80.0f32;

    let warning_count = stderr.to_ascii_lowercase().matches("warning").count() as f32;
    confidence -= warning_count * 5.0;

    let word_count = text.split_whitespace().count();
    if word_count < 3 {
        confidence -= 10.0;
    }

    let total = text.chars().count().max(1) as f32;
    let non_word = text.chars().filter(|c| !c.is_alphanumeric() && !c.is_whitespace()).count() as f32;
    if non_word / total > 0.3 {
        confidence -= 15.0;
    }

    if has_structured_tokens(text) {
        confidence += 10.0;
    }

    confidence.clamp(MIN_CONFIDENCE_PERCENT, MAX_CONFIDENCE_PERCENT)
}

fn has_structured_tokens(text: &str) -> bool {
    if text.contains('@') {
        return true;
    }
    text.split(|c: char| !c.is_ascii_digit() && c != '-')
        .any(|token| token.len() >= 3 && token.contains('-') && token.chars().any(|c| c.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::{FakeOcrClient, OcrOutput};

    #[tokio::test]
    async fn low_quality_scan_clamps_to_the_low_end() {
        let client = FakeOcrClient {
            result: Ok(OcrOutput {
                text: "@#$%".to_string(),
                stderr: "warning: low dpi\nwarning: skew detected\nwarning: noise".to_string(),
            }),
        };
        let result = extract_ocr(&client, b"image", DEFAULT_LANGUAGE_HINT).await.unwrap();
        assert!(result.confidence >= 0.60 && result.confidence <= 0.95);
    }

    #[tokio::test]
    async fn clean_text_with_structured_tokens_scores_above_base() {
        let client = FakeOcrClient {
            result: Ok(OcrOutput {
                text: "contact Alice at a@example.com for details please".to_string(),
                stderr: String::new(),
            }),
        };
        let result = extract_ocr(&client, b"image", DEFAULT_LANGUAGE_HINT).await.unwrap();
        assert!(result.confidence > 0.80);
    }

    #[tokio::test]
    async fn collaborator_failure_propagates() {
        let client = FakeOcrClient {
            result: Err("tesseract crashed".to_string()),
        };
        let result = extract_ocr(&client, b"image", DEFAULT_LANGUAGE_HINT).await;
        assert!(result.is_err());
    }
}
