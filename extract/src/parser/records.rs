//! Splitting section bodies into individual record texts.
//!
//! Both splitters scan line by line, so their cost is linear in the section
//! length no matter how many records it holds.

use fusion_alert_core::{RequestField, ThreadField};

use super::sections::SectionSlice;

/// The text of one record, borrowed from its section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordText<'a> {
    /// Starts at the anchor line, trailing whitespace trimmed.
    pub text: &'a str,
    /// One-based line of the anchor in the normalized text.
    pub line: usize,
}

/// Splits the running-requests section into one record per `Request ID:` line.
///
/// Text before the first anchor is not part of any record.
pub fn split_request_records<'a>(section: &SectionSlice<'a>) -> Vec<RecordText<'a>> {
    let anchor = anchor_for(RequestField::RequestId.label());
    let mut records = Vec::new();
    let mut open: Option<(usize, usize)> = None;

    for (offset, line_idx, line) in indexed_lines(section.text) {
        if line.starts_with(&anchor) {
            if let Some((start, start_line)) = open.take() {
                records.push(record(section, start, offset, start_line));
            }
            open = Some((offset, line_idx));
        }
    }
    if let Some((start, start_line)) = open {
        records.push(record(section, start, section.text.len(), start_line));
    }

    tracing::debug!(records = records.len(), "split running-request records");
    records
}

/// Splits the JVM stack-trace section into one record per `JVM ID:` line.
///
/// A record ends at a line made only of at least `min_dashes` dashes, at the
/// next `JVM ID:` line, or at the end of the section.
pub fn split_thread_records<'a>(
    section: &SectionSlice<'a>,
    min_dashes: usize,
) -> Vec<RecordText<'a>> {
    let anchor = anchor_for(ThreadField::JvmId.label());
    let mut records = Vec::new();
    let mut open: Option<(usize, usize)> = None;

    for (offset, line_idx, line) in indexed_lines(section.text) {
        if line.starts_with(&anchor) {
            if let Some((start, start_line)) = open.take() {
                records.push(record(section, start, offset, start_line));
            }
            open = Some((offset, line_idx));
        } else if is_divider_line(line, min_dashes) {
            if let Some((start, start_line)) = open.take() {
                records.push(record(section, start, offset, start_line));
            }
        }
    }
    if let Some((start, start_line)) = open {
        records.push(record(section, start, section.text.len(), start_line));
    }

    tracing::debug!(records = records.len(), "split thread records");
    records
}

/// A line of dashes and nothing else, at least `min_dashes` long.
pub fn is_divider_line(line: &str, min_dashes: usize) -> bool {
    let line = line.trim();
    line.len() >= min_dashes.max(1) && line.bytes().all(|byte| byte == b'-')
}

fn anchor_for(label: &str) -> String {
    format!("{label}:")
}

/// Yields `(byte offset, zero-based line index, line)` for each line.
fn indexed_lines(text: &str) -> impl Iterator<Item = (usize, usize, &str)> {
    let mut offset = 0;
    text.split('\n').enumerate().map(move |(idx, line)| {
        let start = offset;
        offset += line.len() + 1;
        (start, idx, line)
    })
}

fn record<'a>(
    section: &SectionSlice<'a>,
    start: usize,
    end: usize,
    line_idx: usize,
) -> RecordText<'a> {
    RecordText {
        text: section.text[start..end].trim_end(),
        line: section.start_line + line_idx,
    }
}
