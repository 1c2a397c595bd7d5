//! Thread classification.
//!
//! Turns a thread record into a [`JavaThread`] with typed identity fields and
//! one [`StackTraceItem`] per frame. The model derives the `cfthread` and
//! ColdFusion-frame flags from the IDs and frame text.

use fusion_alert_core::{FieldIssue, JavaThread, StackTraceItem, ThreadField};

use super::fields::{parse_fields, split_stack_trace, stack_frame_lines, thread_key};
use super::records::RecordText;

/// Builds a [`JavaThread`] from one thread record.
///
/// Properties before the first blank line are parsed as `Label: value`; the
/// rest is the stack trace. Unrecognized properties go to
/// [`JavaThread::extra`]. A record without a `Thread ID` is kept with an empty
/// ID and a [`FieldIssue::MissingField`].
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::classify::classify_thread;
/// use fusion_alert_extract::records::RecordText;
///
/// let record = RecordText {
///     text: "JVM ID: jvm1\nThread ID: CFThread-3\n\ncoldfusion.runtime.CFPage.invoke(job.cfm:8)",
///     line: 1,
/// };
/// let thread = classify_thread(&record);
/// assert!(thread.is_cf_thread());
/// assert!(thread.has_coldfusion());
/// assert!(thread.is_active_coldfusion());
/// ```
pub fn classify_thread(record: &RecordText<'_>) -> JavaThread {
    let (properties, stack) = split_stack_trace(record.text);
    let parsed = parse_fields(properties, record.line, thread_key);
    let mut fields = parsed.fields;
    let mut issues = parsed.issues;

    let jvm_id = fields.remove(ThreadField::JvmId.key()).unwrap_or_default();
    let thread_id = fields.remove(ThreadField::ThreadId.key()).unwrap_or_default();
    let priority = fields.remove(ThreadField::Priority.key());
    let hashcode = fields.remove(ThreadField::Hashcode.key());

    if thread_id.is_empty() {
        tracing::debug!(line = record.line, "thread record has no thread ID");
        issues.push(FieldIssue::MissingField {
            field: ThreadField::ThreadId.key().to_string(),
        });
    }

    let stacktrace: Vec<StackTraceItem> =
        stack_frame_lines(stack).map(StackTraceItem::new).collect();

    let mut thread = JavaThread::new(jvm_id, thread_id, stacktrace)
        .with_extra(fields)
        .with_issues(issues)
        .at_line(record.line);
    if let Some(priority) = priority {
        thread = thread.with_priority(priority);
    }
    if let Some(hashcode) = hashcode {
        thread = thread.with_hashcode(hashcode);
    }
    thread
}
