// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The text-extraction router: classifies a file, dispatches to a strategy,
//! falls back on failure, and post-processes the winning text.
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod clients;
mod direct;
mod document;
mod hybrid;
mod ocr;
mod pdf;
mod postprocess;
mod router;
mod strategy;

pub use clients::{DocumentExtractorClient, ExtractorError, HttpDocumentExtractorClient, HttpOcrClient, OcrClient, OcrOutput};
pub use ocr::DEFAULT_LANGUAGE_HINT;
pub use postprocess::{postprocess, PostProcessed};
pub use router::ExtractionRouter;
pub use strategy::{classify, select_strategy, FileFamily};

#[cfg(any(test, feature = "test-support"))]
pub use clients::{FakeDocumentExtractorClient, FakeOcrClient};
