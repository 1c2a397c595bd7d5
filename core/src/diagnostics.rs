//! Non-fatal issues found while parsing individual records.
//!
//! A malformed line or an unparseable number never aborts a parse. The issue
//! is attached to the record it came from and can be collected across the
//! whole alert as a flat list of [`Diagnostic`]s.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A problem with one field of one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldIssue {
    /// A property line had no `:` between label and value. The line is
    /// skipped rather than stored under a made-up key.
    #[error("line {line}: expected `Label: value`, found {text:?}")]
    MalformedField { line: usize, text: String },

    /// A numeric field held text that does not parse as a number.
    #[error("field `{field}` is not a number: {value:?}")]
    FieldCoercion { field: String, value: String },

    /// The record has no value for its identifying field.
    #[error("record has no `{field}` field")]
    MissingField { field: String },
}

/// Which collection a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    RunningRequest,
    JavaThread,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RunningRequest => write!(f, "running_request"),
            Self::JavaThread => write!(f, "java_thread"),
        }
    }
}

/// Locates a record inside an alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordRef {
    pub kind: RecordKind,
    /// Zero-based position in source order.
    pub index: usize,
    /// One-based line of the record anchor in the normalized text.
    pub line: usize,
}

/// A [`FieldIssue`] together with the record it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub record: RecordRef,
    pub issue: FieldIssue,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} #{} (line {}): {}",
            self.record.kind, self.record.index, self.record.line, self.issue
        )
    }
}
