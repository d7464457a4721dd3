// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ties strategy selection, execution, fallbacks, and post-processing
//! together. The router is what stage processors call for TextExtraction.

use redactflow_core::{Clock, ExtractedText, ExtractionMethod};

use crate::clients::{DocumentExtractorClient, OcrClient};
use crate::direct::extract_direct;
use crate::document::extract_document;
use crate::hybrid::extract_hybrid;
use crate::ocr::{extract_ocr, DEFAULT_LANGUAGE_HINT};
use crate::pdf::extract_pdf;
use crate::postprocess::postprocess;
use crate::strategy::select_strategy;

const DEFAULT_MAX_TEXT_LENGTH: usize = 10 * 1024 * 1024;

pub struct ExtractionRouter<'a> {
    document_client: &'a dyn DocumentExtractorClient,
    ocr_client: &'a dyn OcrClient,
    clock: &'a dyn Clock,
    max_text_length: usize,
}

impl<'a> ExtractionRouter<'a> {
    pub fn new(document_client: &'a dyn DocumentExtractorClient, ocr_client: &'a dyn OcrClient, clock: &'a dyn Clock) -> Self {
        Self {
            document_client,
            ocr_client,
            clock,
            max_text_length: DEFAULT_MAX_TEXT_LENGTH,
        }
    }

    pub fn with_max_text_length(mut self, max_text_length: usize) -> Self {
        self.max_text_length = max_text_length;
        self
    }

    /// Runs the strategy selected for `(file_type, mime_type)`, falling
    /// through pdf/ocr failures to `document`, and post-processes the
    /// winning text. Never returns `Err`: total failure is represented as
    /// the `failed` extraction artifact the stage processor surfaces.
    pub async fn route(&self, bytes: &[u8], file_type: &str, mime_type: &str) -> ExtractedText {
        let strategy = select_strategy(file_type, mime_type);
        let outcome = self.run_strategy(strategy, bytes, mime_type).await;

        match outcome {
            Ok(extracted) => self.finish(extracted),
            Err(last_error) => ExtractedText::failed(last_error, self.clock.now_epoch_ms()),
        }
    }

    /// Explicitly requested cross-validation path; bypasses strategy
    /// selection entirely.
    pub async fn route_hybrid(&self, bytes: &[u8], mime_type: &str) -> ExtractedText {
        match extract_hybrid(self.document_client, self.ocr_client, bytes, mime_type, DEFAULT_LANGUAGE_HINT).await {
            Ok(extracted) => self.finish(extracted),
            Err(e) => ExtractedText::failed(e.to_string(), self.clock.now_epoch_ms()),
        }
    }

    async fn run_strategy(&self, strategy: ExtractionMethod, bytes: &[u8], mime_type: &str) -> Result<ExtractedText, String> {
        match strategy {
            ExtractionMethod::Direct => Ok(extract_direct(bytes)),
            ExtractionMethod::Pdf => match extract_pdf(bytes) {
                Ok(extracted) => Ok(extracted),
                Err(_) => {
                    let mut fallback = extract_document(self.document_client, bytes, mime_type)
                        .await
                        .map_err(|e| e.to_string())?;
                    fallback.method = Some(ExtractionMethod::PdfFallbackDocument);
                    Ok(fallback)
                }
            },
            ExtractionMethod::Document => extract_document(self.document_client, bytes, mime_type)
                .await
                .map_err(|e| e.to_string()),
            ExtractionMethod::Ocr => match extract_ocr(self.ocr_client, bytes, DEFAULT_LANGUAGE_HINT).await {
                Ok(extracted) => Ok(extracted),
                Err(_) => extract_document(self.document_client, bytes, mime_type)
                    .await
                    .map_err(|e| e.to_string()),
            },
            ExtractionMethod::Hybrid | ExtractionMethod::PdfFallbackDocument | ExtractionMethod::Failed => {
                extract_document(self.document_client, bytes, mime_type)
                    .await
                    .map_err(|e| e.to_string())
            }
        }
    }

    fn finish(&self, mut extracted: ExtractedText) -> ExtractedText {
        let processed = postprocess(&extracted.text, self.max_text_length);
        extracted.text = processed.text;
        extracted.truncated = processed.truncated;
        extracted.original_length = processed.original_length;
        extracted
    }
}

#[cfg(test)]
#[path = "router_tests.rs"]
mod tests;
