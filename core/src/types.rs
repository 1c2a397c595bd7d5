//! Parsed alert data model.
//!
//! An [`Alert`] owns every [`RunningRequest`] and [`JavaThread`] found in one
//! FusionReactor alert, in source order. Records are built once by the
//! extraction pipeline and never mutated afterwards; re-parsing produces a new
//! [`Alert`].
//!
//! Request values are kept exactly as printed. Numeric coercion happens when
//! a report is built, so the raw text stays available for diagnostics.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Deserialize, Serialize, Serializer};

use crate::diagnostics::{Diagnostic, FieldIssue, RecordKind, RecordRef};
use crate::fields::{RequestField, ThreadField};

/// Canonical key (or raw label when unrecognized) to trimmed value.
pub type FieldMap = BTreeMap<String, String>;

/// Top-frame marker of a thread parked on a monitor.
pub const IDLE_WAIT_MARKER: &str = "java.lang.Object.wait";

/// ID prefix of threads spawned by `<cfthread>`, matched case-insensitively.
pub const CF_THREAD_PREFIX: &str = "cfthread-";

/// Whether a thread ID names a thread spawned by `<cfthread>`.
pub fn is_cf_thread_id(thread_id: &str) -> bool {
    thread_id
        .get(..CF_THREAD_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(CF_THREAD_PREFIX))
}

/// Whether a frame line references a `.cfm` or `.cfc` template.
pub fn is_coldfusion_frame(code: &str) -> bool {
    let code = code.to_ascii_lowercase();
    code.contains(".cfm") || code.contains(".cfc")
}

/// The two top-level blocks of an alert report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Section {
    JvmStackTrace,
    RunningRequests,
}

impl Section {
    /// The literal heading that opens this section.
    pub fn anchor(self) -> &'static str {
        match self {
            Self::JvmStackTrace => "JVM Stack Trace",
            Self::RunningRequests => "Running Requests (Full Details)",
        }
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.anchor())
    }
}

/// One frame line of a thread's call stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StackTraceItem {
    code: String,
    #[serde(rename = "isColdFusion")]
    is_coldfusion: bool,
}

impl StackTraceItem {
    /// Wraps a frame line and tags it with [`is_coldfusion_frame`].
    pub fn new(code: impl Into<String>) -> Self {
        let code = code.into();
        let is_coldfusion = is_coldfusion_frame(&code);
        Self {
            code,
            is_coldfusion,
        }
    }

    /// The frame line, verbatim.
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Whether the frame references a `.cfm` or `.cfc` template.
    pub fn is_coldfusion(&self) -> bool {
        self.is_coldfusion
    }
}

/// A snapshot of one JVM thread.
///
/// The ColdFusion frame list is always derived from [`stacktrace`], never
/// stored separately. The `cfthread` flag is derived from the thread ID.
///
/// [`stacktrace`]: JavaThread::stacktrace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JavaThread {
    jvm_id: String,
    thread_id: String,
    priority: Option<String>,
    hashcode: Option<String>,
    is_cf_thread: bool,
    stacktrace: Vec<StackTraceItem>,
    extra: FieldMap,
    line: usize,
    issues: Vec<FieldIssue>,
}

impl JavaThread {
    /// Creates a thread with its identity and frames (top first).
    pub fn new(
        jvm_id: impl Into<String>,
        thread_id: impl Into<String>,
        stacktrace: Vec<StackTraceItem>,
    ) -> Self {
        let thread_id = thread_id.into();
        let is_cf_thread = is_cf_thread_id(&thread_id);
        Self {
            jvm_id: jvm_id.into(),
            thread_id,
            priority: None,
            hashcode: None,
            is_cf_thread,
            stacktrace,
            extra: FieldMap::new(),
            line: 0,
            issues: Vec::new(),
        }
    }

    pub fn with_priority(mut self, priority: impl Into<String>) -> Self {
        self.priority = Some(priority.into());
        self
    }

    pub fn with_hashcode(mut self, hashcode: impl Into<String>) -> Self {
        self.hashcode = Some(hashcode.into());
        self
    }

    /// Attaches properties whose labels are not in [`ThreadField`].
    pub fn with_extra(mut self, extra: FieldMap) -> Self {
        self.extra = extra;
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    pub fn with_issues(mut self, issues: Vec<FieldIssue>) -> Self {
        self.issues = issues;
        self
    }

    pub fn jvm_id(&self) -> &str {
        &self.jvm_id
    }

    pub fn thread_id(&self) -> &str {
        &self.thread_id
    }

    pub fn priority(&self) -> Option<&str> {
        self.priority.as_deref()
    }

    pub fn hashcode(&self) -> Option<&str> {
        self.hashcode.as_deref()
    }

    /// Whether the thread was started through a ColdFusion `cfthread` tag.
    pub fn is_cf_thread(&self) -> bool {
        self.is_cf_thread
    }

    pub fn stacktrace(&self) -> &[StackTraceItem] {
        &self.stacktrace
    }

    /// Frames that reference ColdFusion templates, in stack order.
    pub fn coldfusion_stacktrace(&self) -> impl Iterator<Item = &StackTraceItem> {
        self.stacktrace.iter().filter(|item| item.is_coldfusion())
    }

    pub fn has_coldfusion(&self) -> bool {
        self.stacktrace.iter().any(StackTraceItem::is_coldfusion)
    }

    pub fn top_frame(&self) -> Option<&StackTraceItem> {
        self.stacktrace.first()
    }

    /// A CF thread that is doing work: it has frames and its top frame is not
    /// parked in `java.lang.Object.wait`.
    pub fn is_active_coldfusion(&self) -> bool {
        self.is_cf_thread
            && self
                .top_frame()
                .is_some_and(|frame| !frame.code().contains(IDLE_WAIT_MARKER))
    }

    pub fn extra(&self) -> &FieldMap {
        &self.extra
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }
}

impl Serialize for JavaThread {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let coldfusion: Vec<&StackTraceItem> = self.coldfusion_stacktrace().collect();
        let mut len = 8;
        if !self.extra.is_empty() {
            len += 1;
        }
        if !self.issues.is_empty() {
            len += 1;
        }

        let mut state = serializer.serialize_struct("JavaThread", len)?;
        state.serialize_field(ThreadField::JvmId.key(), &self.jvm_id)?;
        state.serialize_field(ThreadField::ThreadId.key(), &self.thread_id)?;
        state.serialize_field(ThreadField::Priority.key(), &self.priority)?;
        state.serialize_field(ThreadField::Hashcode.key(), &self.hashcode)?;
        state.serialize_field("isCFThread", &self.is_cf_thread)?;
        state.serialize_field("hasColdFusion", &!coldfusion.is_empty())?;
        state.serialize_field("stacktrace", &self.stacktrace)?;
        state.serialize_field("coldfusionStacktrace", &coldfusion)?;
        if !self.extra.is_empty() {
            state.serialize_field("extra", &self.extra)?;
        }
        if !self.issues.is_empty() {
            state.serialize_field("issues", &self.issues)?;
        }
        state.end()
    }
}

/// A snapshot of one in-flight HTTP request.
///
/// Values are stored as printed, keyed by canonical field key (see
/// [`RequestField::key`]) or by the raw label when it is not recognized.
/// Serialized output nests the raw labels under `extra`, so they can never
/// collide with a canonical key or with `issues`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunningRequest {
    fields: FieldMap,
    line: usize,
    issues: Vec<FieldIssue>,
}

impl RunningRequest {
    pub fn new(fields: FieldMap) -> Self {
        Self {
            fields,
            line: 0,
            issues: Vec::new(),
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    pub fn with_issues(mut self, issues: Vec<FieldIssue>) -> Self {
        self.issues = issues;
        self
    }

    /// Raw text of a recognized field.
    pub fn get(&self, field: RequestField) -> Option<&str> {
        self.fields.get(field.key()).map(String::as_str)
    }

    /// Raw text by key, including unrecognized labels.
    pub fn get_raw(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn request_id(&self) -> &str {
        self.get(RequestField::RequestId).unwrap_or_default()
    }

    pub fn thread_id(&self) -> &str {
        self.get(RequestField::ThreadId).unwrap_or_default()
    }

    pub fn line(&self) -> usize {
        self.line
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }
}

impl Serialize for RunningRequest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra: BTreeMap<&str, &str> = self
            .fields
            .iter()
            .filter(|(key, _)| {
                RequestField::ALL
                    .iter()
                    .all(|field| field.key() != key.as_str())
            })
            .map(|(key, value)| (key.as_str(), value.as_str()))
            .collect();

        let mut map = serializer.serialize_map(None)?;
        for field in RequestField::ALL {
            if let Some(value) = self.get(field) {
                map.serialize_entry(field.key(), value)?;
            }
        }
        if !extra.is_empty() {
            map.serialize_entry("extra", &extra)?;
        }
        if !self.issues.is_empty() {
            map.serialize_entry("issues", &self.issues)?;
        }
        map.end()
    }
}

/// The full parse result of one alert report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    running_requests: Vec<RunningRequest>,
    java_threads: Vec<JavaThread>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing_sections: Vec<Section>,
}

impl Alert {
    pub fn new(running_requests: Vec<RunningRequest>, java_threads: Vec<JavaThread>) -> Self {
        Self {
            running_requests,
            java_threads,
            missing_sections: Vec::new(),
        }
    }

    /// Records sections that were absent and tolerated by lenient parsing.
    pub fn with_missing_sections(mut self, sections: Vec<Section>) -> Self {
        self.missing_sections = sections;
        self
    }

    pub fn running_requests(&self) -> &[RunningRequest] {
        &self.running_requests
    }

    pub fn java_threads(&self) -> &[JavaThread] {
        &self.java_threads
    }

    pub fn missing_sections(&self) -> &[Section] {
        &self.missing_sections
    }

    /// Active ColdFusion threads, in source order.
    pub fn coldfusion_threads(&self) -> impl Iterator<Item = &JavaThread> {
        self.java_threads
            .iter()
            .filter(|thread| thread.is_active_coldfusion())
    }

    /// First thread whose ID equals `thread_id` exactly.
    pub fn thread_by_id(&self, thread_id: &str) -> Option<&JavaThread> {
        self.java_threads
            .iter()
            .find(|thread| thread.thread_id() == thread_id)
    }

    pub fn is_empty(&self) -> bool {
        self.running_requests.is_empty() && self.java_threads.is_empty()
    }

    /// Every per-record issue, requests first, each in source order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        let requests = self
            .running_requests
            .iter()
            .enumerate()
            .flat_map(|(index, request)| {
                let record = RecordRef {
                    kind: RecordKind::RunningRequest,
                    index,
                    line: request.line(),
                };
                request.issues().iter().map(move |issue| Diagnostic {
                    record,
                    issue: issue.clone(),
                })
            });
        let threads = self
            .java_threads
            .iter()
            .enumerate()
            .flat_map(|(index, thread)| {
                let record = RecordRef {
                    kind: RecordKind::JavaThread,
                    index,
                    line: thread.line(),
                };
                thread.issues().iter().map(move |issue| Diagnostic {
                    record,
                    issue: issue.clone(),
                })
            });
        requests.chain(threads).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(code: &str) -> StackTraceItem {
        StackTraceItem::new(code)
    }

    #[test]
    fn test_coldfusion_stacktrace_is_filtered_view() {
        let thread = JavaThread::new(
            "jvm1",
            "cfthread-1",
            vec![
                frame("java.net.SocketInputStream.read(Native Method)"),
                frame("coldfusion.runtime.CFPage.invoke(index.cfm:12)"),
                frame("coldfusion.filter.PathFilter.invoke(PathFilter.java:94)"),
                frame("cfapi2ecfc.runFunction(api.cfc:40)"),
            ],
        );

        let codes: Vec<&str> = thread.coldfusion_stacktrace().map(|f| f.code()).collect();
        assert_eq!(
            codes,
            vec![
                "coldfusion.runtime.CFPage.invoke(index.cfm:12)",
                "cfapi2ecfc.runFunction(api.cfc:40)"
            ]
        );
        assert!(thread.has_coldfusion());
    }

    #[test]
    fn test_cf_thread_flag_follows_thread_id() {
        assert!(JavaThread::new("jvm1", "cfthread-1", Vec::new()).is_cf_thread());
        assert!(JavaThread::new("jvm1", "CFThread-20", Vec::new()).is_cf_thread());
        assert!(!JavaThread::new("jvm1", "ajp-nio-8016-exec-3", Vec::new()).is_cf_thread());
        assert!(!JavaThread::new("jvm1", "my-cfthread-1", Vec::new()).is_cf_thread());
        assert!(!JavaThread::new("jvm1", "", Vec::new()).is_cf_thread());
        assert!(!is_cf_thread_id("cfthread"));
        assert!(!is_cf_thread_id("é-cfthread-"));
    }

    #[test]
    fn test_frame_flag_follows_template_extension() {
        assert!(frame("cfindex2ecfm123.runPage(/www/index.cfm:44)").is_coldfusion());
        assert!(frame("cfapi2ecfc.runFunction(/www/Api.CFC:10)").is_coldfusion());
        assert!(!frame("java.lang.Thread.run(Thread.java:748)").is_coldfusion());
        assert!(!frame("cfindex2ecfm123.runPage").is_coldfusion());
    }

    #[test]
    fn test_has_coldfusion_false_without_frames() {
        let thread = JavaThread::new("jvm1", "main", Vec::new());
        assert!(!thread.has_coldfusion());
        assert_eq!(thread.coldfusion_stacktrace().count(), 0);
    }

    #[test]
    fn test_active_coldfusion_requires_cf_thread_and_frames() {
        let no_frames = JavaThread::new("jvm1", "cfthread-1", Vec::new());
        assert!(!no_frames.is_active_coldfusion());

        let not_cf = JavaThread::new("jvm1", "jrpp-4", vec![frame("a.cfm:1")]);
        assert!(!not_cf.is_active_coldfusion());

        let working = JavaThread::new("jvm1", "cfthread-1", vec![frame("a.cfm:1")]);
        assert!(working.is_active_coldfusion());
    }

    #[test]
    fn test_waiting_cf_thread_is_not_active() {
        let waiting = JavaThread::new(
            "jvm1",
            "cfthread-9",
            vec![
                frame("java.lang.Object.wait(Native Method)"),
                frame("coldfusion.thread.Task.run(task.cfm:3)"),
            ],
        );
        assert!(waiting.is_cf_thread());
        assert!(!waiting.is_active_coldfusion());
    }

    #[test]
    fn test_java_thread_serializes_canonical_keys() {
        let thread = JavaThread::new("jvm1", "cfthread-7", vec![frame("foo.cfm:10")])
            .with_priority("5")
            .with_hashcode("1234");
        let json = serde_json::to_value(&thread).unwrap();

        assert_eq!(json["jvmID"], "jvm1");
        assert_eq!(json["threadID"], "cfthread-7");
        assert_eq!(json["priority"], "5");
        assert_eq!(json["hashcode"], "1234");
        assert_eq!(json["isCFThread"], true);
        assert_eq!(json["hasColdFusion"], true);
        assert_eq!(json["stacktrace"][0]["code"], "foo.cfm:10");
        assert_eq!(json["stacktrace"][0]["isColdFusion"], true);
        assert_eq!(json["coldfusionStacktrace"].as_array().unwrap().len(), 1);
        assert!(json.get("extra").is_none());
        assert!(json.get("issues").is_none());
    }

    #[test]
    fn test_running_request_nests_unknown_labels() {
        let mut fields = FieldMap::new();
        fields.insert("requestID".to_string(), "42".to_string());
        fields.insert("duration".to_string(), "150".to_string());
        fields.insert("Session ID".to_string(), "abc".to_string());
        let request = RunningRequest::new(fields);

        assert_eq!(request.request_id(), "42");
        assert_eq!(request.get(RequestField::Duration), Some("150"));
        assert_eq!(request.get_raw("Session ID"), Some("abc"));
        assert_eq!(request.thread_id(), "");

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["requestID"], "42");
        assert_eq!(json["duration"], "150");
        assert_eq!(json["extra"]["Session ID"], "abc");
        assert!(json.get("Session ID").is_none());
        assert!(json.get("issues").is_none());
    }

    #[test]
    fn test_raw_issues_label_does_not_clash_with_issues() {
        let mut fields = FieldMap::new();
        fields.insert("requestID".to_string(), "42".to_string());
        fields.insert("issues".to_string(), "none reported".to_string());
        let request = RunningRequest::new(fields).with_issues(vec![FieldIssue::MissingField {
            field: "threadID".to_string(),
        }]);

        let json = serde_json::to_string(&request).unwrap();
        assert_eq!(json.matches("\"issues\"").count(), 2);
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["extra"]["issues"], "none reported");
        assert_eq!(value["issues"].as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_thread_by_id_returns_first_exact_match() {
        let alert = Alert::new(
            Vec::new(),
            vec![
                JavaThread::new("jvm1", "jrpp-1", Vec::new()),
                JavaThread::new("jvm2", "jrpp-1", Vec::new()),
                JavaThread::new("jvm1", "JRPP-2", Vec::new()),
            ],
        );
        assert_eq!(alert.thread_by_id("jrpp-1").unwrap().jvm_id(), "jvm1");
        assert!(alert.thread_by_id("jrpp-2").is_none());
    }

    #[test]
    fn test_diagnostics_locate_records() {
        let request = RunningRequest::new(FieldMap::new())
            .at_line(12)
            .with_issues(vec![FieldIssue::MissingField {
                field: "requestID".to_string(),
            }]);
        let thread = JavaThread::new("jvm1", "", Vec::new())
            .at_line(3)
            .with_issues(vec![FieldIssue::MalformedField {
                line: 4,
                text: "oops".to_string(),
            }]);
        let alert = Alert::new(vec![request], vec![thread]);

        let diagnostics = alert.diagnostics();
        assert_eq!(diagnostics.len(), 2);
        assert_eq!(diagnostics[0].record.kind, RecordKind::RunningRequest);
        assert_eq!(diagnostics[0].record.line, 12);
        assert_eq!(diagnostics[1].record.kind, RecordKind::JavaThread);
        assert_eq!(diagnostics[1].record.index, 0);
    }

    #[test]
    fn test_section_anchor_text() {
        assert_eq!(Section::JvmStackTrace.to_string(), "JVM Stack Trace");
        assert_eq!(
            Section::RunningRequests.anchor(),
            "Running Requests (Full Details)"
        );
    }
}
