//! Locating the two top-level sections of a normalized alert.

use regex::Regex;
use std::sync::LazyLock;

use fusion_alert_core::Section;

/// The body of one section, borrowed from the normalized text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionSlice<'a> {
    pub section: Section,
    /// Text after the heading and its dashed rule, trimmed.
    pub text: &'a str,
    /// One-based line in the normalized text where `text` begins.
    pub start_line: usize,
}

/// Both sections of an alert; `None` when the heading is absent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlertSections<'a> {
    pub jvm_stack_trace: Option<SectionSlice<'a>>,
    pub running_requests: Option<SectionSlice<'a>>,
}

impl<'a> AlertSections<'a> {
    pub fn get(&self, section: Section) -> Option<&SectionSlice<'a>> {
        match section {
            Section::JvmStackTrace => self.jvm_stack_trace.as_ref(),
            Section::RunningRequests => self.running_requests.as_ref(),
        }
    }

    /// Sections whose heading was not found, thread section first.
    pub fn missing(&self) -> Vec<Section> {
        [Section::JvmStackTrace, Section::RunningRequests]
            .into_iter()
            .filter(|section| self.get(*section).is_none())
            .collect()
    }
}

/// Finds both sections in normalized alert text.
///
/// Each section runs from the end of its heading to the other section's
/// heading when that comes later, otherwise to the end of the text. A heading
/// at the start of a line is preferred over one embedded in running text.
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::sections::locate_sections;
///
/// let text = "Running Requests (Full Details)\nRequest ID: 1\nJVM Stack Trace\n---\nJVM ID: a";
/// let sections = locate_sections(text);
/// assert_eq!(sections.running_requests.unwrap().text, "Request ID: 1");
/// assert_eq!(sections.jvm_stack_trace.unwrap().text, "JVM ID: a");
/// ```
pub fn locate_sections(normalized: &str) -> AlertSections<'_> {
    let threads_at = find_heading(normalized, Section::JvmStackTrace.anchor());
    let requests_at = find_heading(normalized, Section::RunningRequests.anchor());

    let jvm_stack_trace = threads_at
        .map(|start| slice_section(normalized, Section::JvmStackTrace, start, requests_at));
    let running_requests = requests_at
        .map(|start| slice_section(normalized, Section::RunningRequests, start, threads_at));

    tracing::debug!(
        jvm_stack_trace = jvm_stack_trace.is_some(),
        running_requests = running_requests.is_some(),
        "located alert sections"
    );

    AlertSections {
        jvm_stack_trace,
        running_requests,
    }
}

fn find_heading(text: &str, anchor: &str) -> Option<usize> {
    let mut offset = 0;
    for line in text.split('\n') {
        if line.starts_with(anchor) {
            return Some(offset);
        }
        offset += line.len() + 1;
    }
    text.find(anchor)
}

fn slice_section<'a>(
    text: &'a str,
    section: Section,
    start: usize,
    other_start: Option<usize>,
) -> SectionSlice<'a> {
    // Optional dashed rule under the heading.
    static RULE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"\A\s+-+").expect("static regex must compile"));

    let end = other_start
        .filter(|other| *other > start)
        .unwrap_or(text.len());
    let mut body_start = start + section.anchor().len();
    if let Some(rule) = RULE_RE.find(&text[body_start..end]) {
        body_start += rule.end();
    }

    let body = &text[body_start..end];
    let leading = body.len() - body.trim_start().len();
    let body_start = body_start + leading;

    SectionSlice {
        section,
        text: body.trim(),
        start_line: line_number_at(text, body_start),
    }
}

/// One-based line number of byte `offset`.
pub(crate) fn line_number_at(text: &str, offset: usize) -> usize {
    text[..offset].bytes().filter(|byte| *byte == b'\n').count() + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALERT: &str = "FusionReactor Alert\n\nJVM Stack Trace\n---------------\nJVM ID: jvm1\nThread ID: main\n\nRunning Requests (Full Details)\n-------------------------------\nRequest ID: 17\nStatus: Running";

    #[test]
    fn test_threads_then_requests() {
        let sections = locate_sections(ALERT);
        let threads = sections.jvm_stack_trace.unwrap();
        assert_eq!(threads.text, "JVM ID: jvm1\nThread ID: main");
        assert_eq!(threads.start_line, 5);

        let requests = sections.running_requests.unwrap();
        assert_eq!(requests.text, "Request ID: 17\nStatus: Running");
        assert_eq!(requests.start_line, 10);
        assert!(sections.missing().is_empty());
    }

    #[test]
    fn test_requests_before_threads() {
        let text = "Running Requests (Full Details)\nRequest ID: 1\n\nJVM Stack Trace\n----\nJVM ID: a";
        let sections = locate_sections(text);
        assert_eq!(sections.running_requests.unwrap().text, "Request ID: 1");
        assert_eq!(sections.jvm_stack_trace.unwrap().text, "JVM ID: a");
    }

    #[test]
    fn test_missing_sections_are_reported() {
        let sections = locate_sections("JVM Stack Trace\n---\nJVM ID: a");
        assert_eq!(sections.missing(), vec![Section::RunningRequests]);

        let empty = locate_sections("");
        assert_eq!(
            empty.missing(),
            vec![Section::JvmStackTrace, Section::RunningRequests]
        );
    }

    #[test]
    fn test_line_start_heading_preferred() {
        let text = "See the JVM Stack Trace below.\nJVM Stack Trace\n---\nJVM ID: a";
        let threads = locate_sections(text).jvm_stack_trace.unwrap();
        assert_eq!(threads.text, "JVM ID: a");
        assert_eq!(threads.start_line, 4);
    }

    #[test]
    fn test_heading_without_rule() {
        let text = "JVM Stack Trace\nJVM ID: a";
        let threads = locate_sections(text).jvm_stack_trace.unwrap();
        assert_eq!(threads.text, "JVM ID: a");
        assert_eq!(threads.start_line, 2);
    }

    #[test]
    fn test_empty_section_body() {
        let text = "JVM Stack Trace\n---\nRunning Requests (Full Details)";
        let sections = locate_sections(text);
        assert_eq!(sections.jvm_stack_trace.unwrap().text, "");
        assert_eq!(sections.running_requests.unwrap().text, "");
    }
}
