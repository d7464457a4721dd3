// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Hybrid strategy: runs `document` and `ocr` for cross-validation and keeps
//! the longer non-trivial output, tie-broken toward higher confidence.
//! Reserved for callers that explicitly request it; the router never picks
//! it on its own.

use redactflow_core::{ExtractedText, ExtractionMethod};

use crate::clients::{DocumentExtractorClient, ExtractorError, OcrClient};
use crate::{document::extract_document, ocr::extract_ocr};

pub async fn extract_hybrid(
    document_client: &dyn DocumentExtractorClient,
    ocr_client: &dyn OcrClient,
    bytes: &[u8],
    mime_type: &str,
    language_hint: &str,
) -> Result<ExtractedText, ExtractorError> {
    let document_result = extract_document(document_client, bytes, mime_type).await;
    let ocr_result = extract_ocr(ocr_client, bytes, language_hint).await;

    let mut candidate = match (document_result, ocr_result) {
        (Ok(d), Ok(o)) => pick_longer(d, o),
        (Ok(d), Err(_)) => d,
        (Err(_), Ok(o)) => o,
        (Err(document_err), Err(_)) => return Err(document_err),
    };
    candidate.method = Some(ExtractionMethod::Hybrid);
    Ok(candidate)
}

fn pick_longer(document: ExtractedText, ocr: ExtractedText) -> ExtractedText {
    let document_len = document.text.trim().len();
    let ocr_len = ocr.text.trim().len();
    if document_len == 0 && ocr_len == 0 {
        return document;
    }
    match document_len.cmp(&ocr_len) {
        std::cmp::Ordering::Greater => document,
        std::cmp::Ordering::Less => ocr,
        std::cmp::Ordering::Equal => {
            if ocr.confidence > document.confidence {
                ocr
            } else {
                document
            }
        }
    }
}
