//! `Label: value` parsing for record texts.

use fusion_alert_core::{FieldIssue, FieldMap, RequestField, ThreadField};

/// Key/value pairs of one record plus the lines that could not be read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedFields {
    pub fields: FieldMap,
    pub issues: Vec<FieldIssue>,
}

/// Canonical key for a running-request label.
pub fn request_key(label: &str) -> Option<&'static str> {
    RequestField::from_label(label).map(RequestField::key)
}

/// Canonical key for a thread-property label.
pub fn thread_key(label: &str) -> Option<&'static str> {
    ThreadField::from_label(label).map(ThreadField::key)
}

/// Parses `Label: value` lines.
///
/// Each line splits at its first `:`. Labels that `translate` recognizes are
/// stored under the canonical key, others under the label as written. Values
/// are trimmed; a later duplicate replaces an earlier one. Blank lines are
/// ignored. A non-blank line without a colon (or with an empty label) is
/// skipped and reported as [`FieldIssue::MalformedField`]; `first_line` is the
/// one-based line number of the first line of `text`.
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::fields::{parse_fields, request_key};
///
/// let parsed = parse_fields("Request ID: 7\nExecution Time (ms): 1200\nSession: abc", 1, request_key);
/// assert_eq!(parsed.fields["requestID"], "7");
/// assert_eq!(parsed.fields["duration"], "1200");
/// assert_eq!(parsed.fields["Session"], "abc");
/// assert!(parsed.issues.is_empty());
/// ```
pub fn parse_fields<F>(text: &str, first_line: usize, translate: F) -> ParsedFields
where
    F: Fn(&str) -> Option<&'static str>,
{
    let mut parsed = ParsedFields::default();

    for (idx, line) in text.split('\n').enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let Some((label, value)) = line.split_once(':').map(|(l, v)| (l.trim(), v.trim()))
        else {
            parsed.issues.push(malformed(first_line + idx, line));
            continue;
        };
        if label.is_empty() {
            parsed.issues.push(malformed(first_line + idx, line));
            continue;
        }

        let key = translate(label).map_or_else(|| label.to_string(), str::to_string);
        parsed.fields.insert(key, value.to_string());
    }

    parsed
}

fn malformed(line: usize, text: &str) -> FieldIssue {
    tracing::debug!(line, text, "skipping line without `Label: value` shape");
    FieldIssue::MalformedField {
        line,
        text: text.to_string(),
    }
}

/// Splits a thread record at its first blank line into the property text and
/// the stack-trace text, both trimmed. The stack trace is empty when the
/// record has no blank line.
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::fields::split_stack_trace;
///
/// let (props, stack) = split_stack_trace("JVM ID: a\nThread ID: t\n\nframe.a()\nframe.b()");
/// assert_eq!(props, "JVM ID: a\nThread ID: t");
/// assert_eq!(stack, "frame.a()\nframe.b()");
/// ```
pub fn split_stack_trace(record: &str) -> (&str, &str) {
    match record.find("\n\n") {
        Some(idx) => (record[..idx].trim(), record[idx..].trim()),
        None => (record.trim(), ""),
    }
}

/// Non-blank stack-trace lines, top frame first.
pub fn stack_frame_lines(stack: &str) -> impl Iterator<Item = &str> {
    stack.split('\n').map(str::trim).filter(|line| !line.is_empty())
}
