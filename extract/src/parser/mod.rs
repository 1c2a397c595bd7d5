//! FusionReactor alert parser.
//!
//! An alert report is free text with two sections: a `JVM Stack Trace` with
//! one record per thread, and `Running Requests (Full Details)` with one
//! record per in-flight request. Parsing runs in fixed stages:
//!
//! 1. [`normalize`] repairs line wrapping and line endings;
//! 2. [`sections`] finds the two section bodies;
//! 3. [`records`] cuts each body into record texts;
//! 4. [`fields`] reads `Label: value` lines into canonical keys;
//! 5. [`classify`] turns thread records into typed [`JavaThread`]s.
//!
//! Every stage is public so callers can inspect intermediate text, but most
//! consumers should use [`parse_alert`](crate::parse_alert).
//!
//! [`JavaThread`]: fusion_alert_core::JavaThread

pub mod classify;
pub mod fields;
pub mod normalize;
pub mod records;
pub mod sections;

use fusion_alert_core::{Alert, FieldIssue, JavaThread, RequestField, RunningRequest};
use tracing::debug;

use crate::config::ParseOptions;
use crate::error::ParseError;

use self::classify::classify_thread;
use self::fields::{parse_fields, request_key};
use self::normalize::normalize_alert_text;
use self::records::{RecordText, split_request_records, split_thread_records};
use self::sections::locate_sections;

/// Runs the whole pipeline over raw alert text.
pub(crate) fn parse_alert_text(raw: &str, options: &ParseOptions) -> Result<Alert, ParseError> {
    let normalized = normalize_alert_text(raw);
    let sections = locate_sections(&normalized);
    let missing = sections.missing();

    if !options.is_lenient() {
        if let Some(section) = missing.first() {
            return Err(ParseError::MissingSection { section: *section });
        }
    }
    for section in &missing {
        tracing::warn!(%section, "alert section missing; continuing without its records");
    }

    let running_requests: Vec<RunningRequest> = sections
        .running_requests
        .map(|section| {
            split_request_records(&section)
                .iter()
                .map(build_request)
                .collect()
        })
        .unwrap_or_default();

    let java_threads: Vec<JavaThread> = sections
        .jvm_stack_trace
        .map(|section| {
            split_thread_records(&section, options.divider_min_dashes)
                .iter()
                .map(classify_thread)
                .collect()
        })
        .unwrap_or_default();

    debug!(
        input_bytes = raw.len(),
        requests = running_requests.len(),
        threads = java_threads.len(),
        "parsed alert"
    );

    Ok(Alert::new(running_requests, java_threads).with_missing_sections(missing))
}

fn build_request(record: &RecordText<'_>) -> RunningRequest {
    let parsed = parse_fields(record.text, record.line, request_key);
    let mut issues = parsed.issues;

    let request_id = RequestField::RequestId.key();
    if parsed.fields.get(request_id).is_none_or(String::is_empty) {
        debug!(line = record.line, "request record has no request ID");
        issues.push(FieldIssue::MissingField {
            field: request_id.to_string(),
        });
    }

    RunningRequest::new(parsed.fields)
        .at_line(record.line)
        .with_issues(issues)
}
