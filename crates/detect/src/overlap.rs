// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Overlap resolution ahead of anonymization: touching same-type ranges
//! merge; contained ranges collapse into their container; crossing ranges of
//! different types prefer the longer, tie-broken by earliest start.

use crate::detector::Detection;

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedRange {
    pub entity_type: String,
    pub start: usize,
    pub end: usize,
    pub score: f32,
}

impl From<Detection> for ResolvedRange {
    fn from(d: Detection) -> Self {
        Self {
            entity_type: d.entity_type,
            start: d.start,
            end: d.end,
            score: d.score,
        }
    }
}

fn contains(outer: &ResolvedRange, inner: &ResolvedRange) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

fn touches_same_type(a: &ResolvedRange, b: &ResolvedRange) -> bool {
    a.entity_type == b.entity_type && a.start <= b.end && b.start <= a.end
}

fn crosses(a: &ResolvedRange, b: &ResolvedRange) -> bool {
    a.start < b.end && b.start < a.end
}

/// Resolves overlaps in detections, assumed already sorted/filtered by the
/// detector client. Input order is not significant; output is sorted by
/// `(start, end)`.
pub fn resolve_overlaps(detections: Vec<Detection>) -> Vec<ResolvedRange> {
    let mut ranges: Vec<ResolvedRange> = detections.into_iter().map(ResolvedRange::from).collect();
    ranges.sort_by_key(|r| (r.start, r.end));

    let mut merged: Vec<ResolvedRange> = Vec::new();
    for range in ranges {
        if let Some(last) = merged.last_mut() {
            if contains(last, &range) {
                continue;
            }
            if contains(&range, last) {
                *last = range;
                continue;
            }
            if touches_same_type(last, &range) {
                last.start = last.start.min(range.start);
                last.end = last.end.max(range.end);
                last.score = last.score.max(range.score);
                continue;
            }
            if crosses(last, &range) {
                let keep_new = (range.end - range.start) > (last.end - last.start)
                    || ((range.end - range.start) == (last.end - last.start)
                        && range.start < last.start);
                if keep_new {
                    *last = range;
                }
                continue;
            }
        }
        merged.push(range);
    }
    merged
}

#[cfg(test)]
#[path = "overlap_tests.rs"]
mod tests;
