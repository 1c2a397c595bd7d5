//! Structural checks over a parsed alert.
//!
//! None of these stop a report from being built. They flag data that makes
//! the request-to-thread join ambiguous or incomplete.
//!
//! # Examples
//!
//! ```
//! use fusion_alert_core::*;
//!
//! let alert = Alert::new(
//!     Vec::new(),
//!     vec![
//!         JavaThread::new("jvm1", "jrpp-1", Vec::new()),
//!         JavaThread::new("jvm2", "jrpp-1", Vec::new()),
//!     ],
//! );
//! let errors = validate_alert(&alert);
//! assert_eq!(errors, vec![ValidationError::DuplicateThreadId("jrpp-1".into())]);
//! ```

use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::Alert;

/// Alert consistency findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(rename_all = "snake_case")]
pub enum ValidationError {
    /// Two threads share an ID; requests join to the first one.
    #[error("duplicate thread ID: {0}")]
    DuplicateThreadId(String),
    /// Two running requests share an ID.
    #[error("duplicate request ID: {0}")]
    DuplicateRequestId(String),
    /// A request names a thread that is not in the stack-trace section.
    #[error("request {request_id} runs on thread {thread_id}, which has no stack trace")]
    UnmatchedThread {
        request_id: String,
        thread_id: String,
    },
}

/// Validates an alert, returning every finding in source order.
///
/// Records with an empty identifier are skipped here; they already carry a
/// `MissingField` issue.
pub fn validate_alert(alert: &Alert) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    let mut seen_threads: HashSet<&str> = HashSet::new();
    for thread in alert.java_threads() {
        let id = thread.thread_id();
        if id.is_empty() {
            continue;
        }
        if !seen_threads.insert(id) {
            errors.push(ValidationError::DuplicateThreadId(id.to_string()));
        }
    }

    let mut seen_requests: HashSet<&str> = HashSet::new();
    for request in alert.running_requests() {
        let id = request.request_id();
        if !id.is_empty() && !seen_requests.insert(id) {
            errors.push(ValidationError::DuplicateRequestId(id.to_string()));
        }

        let thread_id = request.thread_id();
        if !thread_id.is_empty() && !seen_threads.contains(thread_id) {
            errors.push(ValidationError::UnmatchedThread {
                request_id: id.to_string(),
                thread_id: thread_id.to_string(),
            });
        }
    }

    errors
}
