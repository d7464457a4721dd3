// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PDF strategy: a structural scan over the raw bytes, not a full renderer.
//! Text content of a PDF requires decompressing content streams, which is
//! out of scope here; this extracts what the container itself exposes
//! (page count, embedded-info presence) and falls through to `document` for
//! anything that doesn't look like a well-formed PDF.

use std::collections::HashMap;

use redactflow_core::{ExtractedText, ExtractionMethod};

const PDF_MAGIC: &[u8] = b"%PDF-";

pub struct PdfError;

pub fn extract_pdf(bytes: &[u8]) -> Result<ExtractedText, PdfError> {
    if !bytes.starts_with(PDF_MAGIC) {
        return Err(PdfError);
    }

    let page_count = count_occurrences(bytes, b"/Type/Page").max(count_occurrences(bytes, b"/Type /Page"));
    let has_embedded_info = count_occurrences(bytes, b"/Info") > 0;

    let text = extract_literal_strings(bytes);

    let mut metadata = HashMap::new();
    metadata.insert("pageCount".to_string(), page_count.to_string());
    metadata.insert("hasEmbeddedInfo".to_string(), has_embedded_info.to_string());

    Ok(ExtractedText {
        text,
        encoding: "utf-8".to_string(),
        method: Some(ExtractionMethod::Pdf),
        confidence: 0.9,
        metadata,
        truncated: false,
        original_length: None,
    })
}

fn count_occurrences(haystack: &[u8], needle: &[u8]) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.windows(needle.len()).filter(|w| *w == needle).count()
}

/// Pulls `(...)`-delimited literal strings out of content streams, a crude
/// approximation of the text a real PDF renderer would recover.
fn extract_literal_strings(bytes: &[u8]) -> String {
    let mut out = String::new();
    let mut depth = 0i32;
    let mut current = String::new();
    let mut escaped = false;
    for &b in bytes {
        match b {
            b'(' if !escaped => {
                depth += 1;
                if depth > 1 {
                    current.push('(');
                }
            }
            b')' if !escaped => {
                depth -= 1;
                if depth == 0 {
                    if !current.is_empty() {
                        out.push_str(&current);
                        out.push(' ');
                    }
                    current.clear();
                } else if depth > 0 {
                    current.push(')');
                }
            }
            b'\\' if depth > 0 && !escaped => {
                escaped = true;
                continue;
            }
            c if depth > 0 => {
                if c.is_ascii_graphic() || c == b' ' {
                    current.push(c as char);
                }
            }
            _ => {}
        }
        escaped = false;
    }
    out.trim().to_string()
}
