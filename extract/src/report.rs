//! Ranked reports over a parsed alert.
//!
//! A [`Report`] borrows its [`Alert`]: request views point at the matched
//! thread instead of copying it, so the alert must outlive the report.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Serialize, Serializer};

use fusion_alert_core::{
    Alert, Diagnostic, FieldIssue, FieldKind, JavaThread, RecordKind, RecordRef, RequestField,
    RunningRequest, Section, StackTraceItem, ValidationError, validate_alert,
};

/// One running request projected to typed report fields.
///
/// Text fields borrow the alert's values. Numeric fields are coerced from the
/// printed text; a value that does not parse becomes `None` and adds a
/// [`FieldIssue::FieldCoercion`] to [`issues`](Self::issues).
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunningRequestView<'a> {
    #[serde(rename = "requestID")]
    pub request_id: Option<&'a str>,
    pub request_url: Option<&'a str>,
    pub status: Option<&'a str>,
    #[serde(serialize_with = "serialize_number")]
    pub started_at: Option<f64>,
    pub started_at_date: Option<&'a str>,
    #[serde(rename = "threadID")]
    pub thread_id: Option<&'a str>,
    pub ip_address: Option<&'a str>,
    pub method: Option<&'a str>,
    #[serde(serialize_with = "serialize_number")]
    pub duration: Option<f64>,
    pub used_memory_percent: Option<&'a str>,
    #[serde(rename = "maxMemoryKB", serialize_with = "serialize_number")]
    pub max_memory_kb: Option<f64>,
    #[serde(rename = "usedMemoryKB", serialize_with = "serialize_number")]
    pub used_memory_kb: Option<f64>,
    #[serde(rename = "totalMemoryKB", serialize_with = "serialize_number")]
    pub total_memory_kb: Option<f64>,
    #[serde(rename = "freeMemoryKB", serialize_with = "serialize_number")]
    pub free_memory_kb: Option<f64>,
    pub query_string: Option<&'a str>,
    pub status_code: Option<&'a str>,
    #[serde(serialize_with = "serialize_number")]
    pub cpu_time: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub jdbc_queries_run: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub jdbc_total_time: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub jdbc_total_execution_time: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub jdbc_total_row_count: Option<f64>,
    pub amf_request: Option<&'a str>,
    #[serde(serialize_with = "serialize_number")]
    pub bytes_sent: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub time_to_first_byte: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub time_to_last_byte: Option<f64>,
    #[serde(serialize_with = "serialize_number")]
    pub time_to_stream_open: Option<f64>,
    pub time_to_stream_close: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    /// First thread whose ID equals this request's `threadID`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thread: Option<&'a JavaThread>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub issues: Vec<FieldIssue>,
    /// Position of the request in [`Alert::running_requests`].
    #[serde(skip)]
    pub source_index: usize,
    #[serde(skip)]
    pub line: usize,
}

impl<'a> RunningRequestView<'a> {
    /// Projects one request and joins it to its thread.
    ///
    /// Every [`FieldKind::Number`] field is coerced, in table order; the rest
    /// borrow the printed text.
    pub fn project(alert: &'a Alert, source_index: usize, request: &'a RunningRequest) -> Self {
        let mut issues = Vec::new();
        let numbers: HashMap<RequestField, f64> = RequestField::ALL
            .into_iter()
            .filter(|field| field.kind() == FieldKind::Number)
            .filter_map(|field| Some((field, coerce_field(request, field, &mut issues)?)))
            .collect();
        let number = |field: RequestField| numbers.get(&field).copied();
        let text = move |field: RequestField| request.get(field);

        let thread = Some(request.thread_id())
            .filter(|id| !id.is_empty())
            .and_then(|id| alert.thread_by_id(id));

        Self {
            request_id: text(RequestField::RequestId),
            request_url: text(RequestField::RequestUrl),
            status: text(RequestField::Status),
            started_at: number(RequestField::StartedAt),
            started_at_date: text(RequestField::StartedAtDate),
            thread_id: text(RequestField::ThreadId),
            ip_address: text(RequestField::IpAddress),
            method: text(RequestField::Method),
            duration: number(RequestField::Duration),
            used_memory_percent: text(RequestField::UsedMemoryPercent),
            max_memory_kb: number(RequestField::MaxMemoryKb),
            used_memory_kb: number(RequestField::UsedMemoryKb),
            total_memory_kb: number(RequestField::TotalMemoryKb),
            free_memory_kb: number(RequestField::FreeMemoryKb),
            query_string: text(RequestField::QueryString),
            status_code: text(RequestField::StatusCode),
            cpu_time: number(RequestField::CpuTime),
            jdbc_queries_run: number(RequestField::JdbcQueriesRun),
            jdbc_total_time: number(RequestField::JdbcTotalTime),
            jdbc_total_execution_time: number(RequestField::JdbcTotalExecutionTime),
            jdbc_total_row_count: number(RequestField::JdbcTotalRowCount),
            amf_request: text(RequestField::AmfRequest),
            bytes_sent: number(RequestField::BytesSent),
            time_to_first_byte: number(RequestField::TimeToFirstByte),
            time_to_last_byte: number(RequestField::TimeToLastByte),
            time_to_stream_open: number(RequestField::TimeToStreamOpen),
            time_to_stream_close: text(RequestField::TimeToStreamClose),
            user_agent: text(RequestField::UserAgent),
            thread,
            issues,
            source_index,
            line: request.line(),
        }
    }

    /// `startedAt` as a UTC timestamp.
    pub fn started_at_utc(&self) -> Option<DateTime<Utc>> {
        self.started_at
            .and_then(|millis| DateTime::from_timestamp_millis(millis as i64))
    }
}

/// An active ColdFusion thread as listed in the report.
#[derive(Debug, Clone, Serialize)]
pub struct ColdFusionThreadView<'a> {
    #[serde(rename = "jvmID")]
    pub jvm_id: &'a str,
    #[serde(rename = "threadID")]
    pub thread_id: &'a str,
    #[serde(rename = "isCFThread")]
    pub is_cf_thread: bool,
    pub hashcode: Option<&'a str>,
    pub priority: Option<&'a str>,
    pub stacktrace: &'a [StackTraceItem],
}

impl<'a> From<&'a JavaThread> for ColdFusionThreadView<'a> {
    fn from(thread: &'a JavaThread) -> Self {
        Self {
            jvm_id: thread.jvm_id(),
            thread_id: thread.thread_id(),
            is_cf_thread: thread.is_cf_thread(),
            hashcode: thread.hashcode(),
            priority: thread.priority(),
            stacktrace: thread.stacktrace(),
        }
    }
}

/// Requests ranked slowest first, plus the busy ColdFusion threads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub running_requests_report: Vec<RunningRequestView<'a>>,
    pub coldfusion_threads_report: Vec<ColdFusionThreadView<'a>>,
}

impl Report<'_> {
    /// Coercion issues raised while projecting requests, in ranked order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.running_requests_report
            .iter()
            .flat_map(|view| {
                let record = RecordRef {
                    kind: RecordKind::RunningRequest,
                    index: view.source_index,
                    line: view.line,
                };
                view.issues.iter().map(move |issue| Diagnostic {
                    record,
                    issue: issue.clone(),
                })
            })
            .collect()
    }
}

/// Builds the report for an alert.
///
/// Requests are sorted by `duration`, largest first. The sort is stable, so
/// requests with equal durations keep their source order; requests without a
/// usable duration come last.
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::{build_report, parse_alert};
///
/// let alert = parse_alert(
///     "JVM Stack Trace\nRunning Requests (Full Details)\n\
///      Request ID: 1\nExecution Time (ms): 10\n\
///      Request ID: 2\nExecution Time (ms): 900",
/// )
/// .unwrap();
/// let report = build_report(&alert);
/// let order: Vec<_> = report
///     .running_requests_report
///     .iter()
///     .map(|view| view.request_id.unwrap())
///     .collect();
/// assert_eq!(order, vec!["2", "1"]);
/// ```
pub fn build_report(alert: &Alert) -> Report<'_> {
    let mut running_requests_report: Vec<RunningRequestView<'_>> = alert
        .running_requests()
        .iter()
        .enumerate()
        .map(|(index, request)| RunningRequestView::project(alert, index, request))
        .collect();
    running_requests_report.sort_by(|a, b| by_duration_desc(a.duration, b.duration));

    let coldfusion_threads_report: Vec<ColdFusionThreadView<'_>> = alert
        .coldfusion_threads()
        .map(ColdFusionThreadView::from)
        .collect();

    tracing::debug!(
        requests = running_requests_report.len(),
        coldfusion_threads = coldfusion_threads_report.len(),
        "built alert report"
    );

    Report {
        running_requests_report,
        coldfusion_threads_report,
    }
}

fn by_duration_desc(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Everything a caller needs from one alert, ready to serialize.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertDocument<'a> {
    pub running_requests: &'a [RunningRequest],
    pub java_threads: &'a [JavaThread],
    pub coldfusion_threads: Vec<&'a JavaThread>,
    pub report: Report<'a>,
    /// Parse issues followed by coercion issues.
    pub diagnostics: Vec<Diagnostic>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationError>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub missing_sections: Vec<Section>,
}

/// Builds the full analysis of a parsed alert.
pub fn analyze(alert: &Alert) -> AlertDocument<'_> {
    let report = build_report(alert);
    let mut diagnostics = alert.diagnostics();
    diagnostics.extend(report.diagnostics());

    AlertDocument {
        running_requests: alert.running_requests(),
        java_threads: alert.java_threads(),
        coldfusion_threads: alert.coldfusion_threads().collect(),
        report,
        diagnostics,
        validation: validate_alert(alert),
        missing_sections: alert.missing_sections().to_vec(),
    }
}

/// Parses a printed number. Thousands separators (`1,024`) are accepted;
/// infinities and NaN are not.
pub fn parse_number(raw: &str) -> Option<f64> {
    static GROUPED_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").expect("static regex must compile")
    });

    let raw = raw.trim();
    let cleaned: Cow<'_, str> = if GROUPED_RE.is_match(raw) {
        Cow::Owned(raw.replace(',', ""))
    } else {
        Cow::Borrowed(raw)
    };
    cleaned.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn coerce_field(
    request: &RunningRequest,
    field: RequestField,
    issues: &mut Vec<FieldIssue>,
) -> Option<f64> {
    let raw = request.get(field)?.trim();
    if raw.is_empty() {
        return None;
    }
    let value = parse_number(raw);
    if value.is_none() {
        tracing::debug!(field = field.key(), value = raw, "numeric field did not parse");
        issues.push(FieldIssue::FieldCoercion {
            field: field.key().to_string(),
            value: raw.to_string(),
        });
    }
    value
}

/// Writes whole numbers as integers so `1200` does not become `1200.0`.
fn serialize_number<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    match value {
        Some(value) if value.fract() == 0.0 && value.abs() <= MAX_EXACT => {
            serializer.serialize_i64(*value as i64)
        }
        Some(value) => serializer.serialize_f64(*value),
        None => serializer.serialize_none(),
    }
}
