// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deterministic strategy selection from file type and MIME type.

use redactflow_core::ExtractionMethod;

/// Broad file-type family used only to pick a strategy; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFamily {
    PlainText,
    Pdf,
    Office,
    Image,
    Unknown,
}

/// Classifies by extension/MIME first-principles the way callers see them;
/// a coarse classifier is enough since the router only needs the family.
pub fn classify(file_type: &str, mime_type: &str) -> FileFamily {
    let file_type = file_type.to_ascii_lowercase();
    let mime_type = mime_type.to_ascii_lowercase();

    if file_type == "pdf" || mime_type == "application/pdf" {
        return FileFamily::Pdf;
    }
    if mime_type.starts_with("image/") || matches!(file_type.as_str(), "png" | "jpg" | "jpeg" | "tiff" | "bmp") {
        return FileFamily::Image;
    }
    if matches!(file_type.as_str(), "doc" | "docx" | "xls" | "xlsx" | "ppt" | "pptx" | "odt")
        || mime_type.contains("officedocument")
        || mime_type == "application/msword"
    {
        return FileFamily::Office;
    }
    if matches!(file_type.as_str(), "txt" | "csv" | "md" | "json" | "log")
        || mime_type.starts_with("text/")
        || mime_type == "application/json"
    {
        return FileFamily::PlainText;
    }
    FileFamily::Unknown
}

/// Which strategy to run first. `hybrid` is never returned here — it is
/// reserved for callers explicitly requesting cross-validation.
pub fn select_strategy(file_type: &str, mime_type: &str) -> ExtractionMethod {
    match classify(file_type, mime_type) {
        FileFamily::PlainText => ExtractionMethod::Direct,
        FileFamily::Pdf => ExtractionMethod::Pdf,
        FileFamily::Office => ExtractionMethod::Document,
        FileFamily::Image => ExtractionMethod::Ocr,
        FileFamily::Unknown => {
            if mime_type.starts_with("text/") {
                ExtractionMethod::Direct
            } else {
                ExtractionMethod::Document
            }
        }
    }
}
