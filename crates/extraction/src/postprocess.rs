// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-processing applied uniformly after every extraction strategy.

const TRUNCATION_MARKER: &str = "[TRUNCATED]";

pub struct PostProcessed {
    pub text: String,
    pub truncated: bool,
    pub original_length: Option<usize>,
}

/// Collapses whitespace runs, strips control characters (keeping newline and
/// tab), normalizes line endings, collapses blank-line runs, and truncates to
/// `max_len` bytes with a trailing marker.
pub fn postprocess(raw: &str, max_len: usize) -> PostProcessed {
    let normalized = normalize_line_endings(raw);
    let stripped = strip_control_characters(&normalized);
    let collapsed = collapse_whitespace(&stripped);
    let collapsed = collapse_blank_lines(&collapsed);
    truncate(&collapsed, max_len)
}

fn normalize_line_endings(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\r', "\n")
}

fn strip_control_characters(s: &str) -> String {
    s.chars()
        .filter(|c| *c == '\n' || *c == '\t' || !c.is_control())
        .collect()
}

fn collapse_whitespace(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut last_was_space = false;
    for c in s.chars() {
        if c == ' ' || c == '\t' {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
        } else {
            out.push(c);
            last_was_space = false;
        }
    }
    out
}

fn collapse_blank_lines(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut newline_run = 0;
    for c in s.chars() {
        if c == '\n' {
            newline_run += 1;
            if newline_run <= 2 {
                out.push(c);
            }
        } else {
            newline_run = 0;
            out.push(c);
        }
    }
    out
}

fn truncate(s: &str, max_len: usize) -> PostProcessed {
    if s.len() <= max_len {
        return PostProcessed {
            text: s.to_string(),
            truncated: false,
            original_length: None,
        };
    }
    let mut boundary = max_len;
    while boundary > 0 && !s.is_char_boundary(boundary) {
        boundary -= 1;
    }
    let mut text = s[..boundary].to_string();
    text.push_str(TRUNCATION_MARKER);
    PostProcessed {
        text,
        truncated: true,
        original_length: Some(s.len()),
    }
}
