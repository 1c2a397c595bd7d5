//! Canonical field tables for alert records.
//!
//! FusionReactor prints every record as `Label: value` lines with
//! human-readable labels such as `Execution Time (ms)`. These tables map each
//! recognized label to the canonical key used everywhere else in the model
//! (`duration`), and record whether the value is numeric.
//!
//! # Examples
//!
//! ```
//! use fusion_alert_core::{FieldKind, RequestField};
//!
//! let field = RequestField::from_label("Execution Time (ms)").unwrap();
//! assert_eq!(field, RequestField::Duration);
//! assert_eq!(field.key(), "duration");
//! assert_eq!(field.kind(), FieldKind::Number);
//! ```

use serde::{Deserialize, Serialize};

/// Whether a field value is free text or must coerce to a number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Text,
    Number,
}

/// Every label a running-request record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestField {
    RequestId,
    RequestUrl,
    Status,
    StartedAt,
    StartedAtDate,
    ThreadId,
    IpAddress,
    Method,
    Duration,
    UsedMemoryPercent,
    MaxMemoryKb,
    UsedMemoryKb,
    TotalMemoryKb,
    FreeMemoryKb,
    QueryString,
    StatusCode,
    CpuTime,
    JdbcQueriesRun,
    JdbcTotalTime,
    JdbcTotalExecutionTime,
    JdbcTotalRowCount,
    AmfRequest,
    BytesSent,
    TimeToFirstByte,
    TimeToLastByte,
    TimeToStreamOpen,
    TimeToStreamClose,
    UserAgent,
}

impl RequestField {
    /// All request fields in the order FusionReactor prints them.
    pub const ALL: [RequestField; 28] = [
        Self::RequestId,
        Self::RequestUrl,
        Self::Status,
        Self::StartedAt,
        Self::StartedAtDate,
        Self::ThreadId,
        Self::IpAddress,
        Self::Method,
        Self::Duration,
        Self::UsedMemoryPercent,
        Self::MaxMemoryKb,
        Self::UsedMemoryKb,
        Self::TotalMemoryKb,
        Self::FreeMemoryKb,
        Self::QueryString,
        Self::StatusCode,
        Self::CpuTime,
        Self::JdbcQueriesRun,
        Self::JdbcTotalTime,
        Self::JdbcTotalExecutionTime,
        Self::JdbcTotalRowCount,
        Self::AmfRequest,
        Self::BytesSent,
        Self::TimeToFirstByte,
        Self::TimeToLastByte,
        Self::TimeToStreamOpen,
        Self::TimeToStreamClose,
        Self::UserAgent,
    ];

    fn entry(self) -> (&'static str, &'static str, FieldKind) {
        use FieldKind::{Number, Text};
        match self {
            Self::RequestId => ("Request ID", "requestID", Text),
            Self::RequestUrl => ("Request URL", "requestUrl", Text),
            Self::Status => ("Status", "status", Text),
            Self::StartedAt => ("Started (Milliseconds)", "startedAt", Number),
            Self::StartedAtDate => ("Started (Date/Time)", "startedAtDate", Text),
            Self::ThreadId => ("Thread ID", "threadID", Text),
            Self::IpAddress => ("Client IP Address", "ipAddress", Text),
            Self::Method => ("Request Method", "method", Text),
            Self::Duration => ("Execution Time (ms)", "duration", Number),
            Self::UsedMemoryPercent => ("Used Memory (percentage)", "usedMemoryPercent", Text),
            Self::MaxMemoryKb => ("Max Memory (KB)", "maxMemoryKB", Number),
            Self::UsedMemoryKb => ("Used Memory (KB)", "usedMemoryKB", Number),
            Self::TotalMemoryKb => ("Total Memory (KB)", "totalMemoryKB", Number),
            Self::FreeMemoryKb => ("Free Memory (KB)", "freeMemoryKB", Number),
            Self::QueryString => ("Query String", "queryString", Text),
            Self::StatusCode => ("Return Status Code", "statusCode", Text),
            Self::CpuTime => ("CPU Time (ms)", "cpuTime", Number),
            Self::JdbcQueriesRun => ("JDBC Queries Run", "jdbcQueriesRun", Number),
            Self::JdbcTotalTime => ("JDBC Total Time", "jdbcTotalTime", Number),
            Self::JdbcTotalExecutionTime => {
                ("JDBC Total Execution Time", "jdbcTotalExecutionTime", Number)
            }
            Self::JdbcTotalRowCount => ("JDBC Total Row Count", "jdbcTotalRowCount", Number),
            Self::AmfRequest => ("AMF Request", "amfRequest", Text),
            Self::BytesSent => ("Bytes Sent", "bytesSent", Number),
            Self::TimeToFirstByte => ("Time to First Byte (ms)", "timeToFirstByte", Number),
            Self::TimeToLastByte => ("Time to Last Byte (ms)", "timeToLastByte", Number),
            Self::TimeToStreamOpen => ("Time to Stream Open (ms)", "timeToStreamOpen", Number),
            Self::TimeToStreamClose => ("Time to Stream Close (ms)", "timeToStreamClose", Text),
            Self::UserAgent => ("User Agent", "userAgent", Text),
        }
    }

    /// Human-readable label as printed in the alert.
    pub fn label(self) -> &'static str {
        self.entry().0
    }

    /// Canonical key used in parsed records and serialized output.
    pub fn key(self) -> &'static str {
        self.entry().1
    }

    /// Whether the report coerces this field to a number.
    pub fn kind(self) -> FieldKind {
        self.entry().2
    }

    /// Looks up a field by its printed label.
    ///
    /// Matching is exact after collapsing whitespace runs, so a label that is
    /// a substring of another (`Status` inside `Return Status Code`) never
    /// shadows it.
    pub fn from_label(label: &str) -> Option<Self> {
        let compact = compact_label(label);
        Self::ALL.into_iter().find(|f| f.label() == compact)
    }
}

/// Every label a JVM thread record can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ThreadField {
    JvmId,
    ThreadId,
    Priority,
    Hashcode,
}

impl ThreadField {
    pub const ALL: [ThreadField; 4] = [
        Self::JvmId,
        Self::ThreadId,
        Self::Priority,
        Self::Hashcode,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::JvmId => "JVM ID",
            Self::ThreadId => "Thread ID",
            Self::Priority => "Priority",
            Self::Hashcode => "Hashcode",
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            Self::JvmId => "jvmID",
            Self::ThreadId => "threadID",
            Self::Priority => "priority",
            Self::Hashcode => "hashcode",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let compact = compact_label(label);
        Self::ALL.into_iter().find(|f| f.label() == compact)
    }
}

/// Collapses whitespace runs so `Execution  Time (ms)` still matches.
fn compact_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}
