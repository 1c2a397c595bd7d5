use std::fs;
use std::path::PathBuf;

use fusion_alert_core::{
    FieldIssue, RecordKind, Section, ValidationError, is_cf_thread_id, validate_alert,
};
use fusion_alert_extract::normalize::normalize_alert_text;
use fusion_alert_extract::{
    ParseError, ParseOptions, analyze, build_report, parse_alert, parse_alert_with_options,
};

const FIXTURES: [&str; 3] = ["alert-full.txt", "alert-wrapped.txt", "alert-truncated.txt"];

#[test]
fn test_full_alert_records() {
    let alert = parse_alert(&fixture("alert-full.txt")).expect("fixture should parse");

    assert_eq!(alert.java_threads().len(), 5);
    assert_eq!(alert.running_requests().len(), 4);
    assert!(alert.missing_sections().is_empty());

    let first = &alert.java_threads()[0];
    assert_eq!(first.jvm_id(), "1f3a-prod");
    assert_eq!(first.thread_id(), "cfthread-12");
    assert_eq!(first.priority(), Some("5"));
    assert_eq!(first.hashcode(), Some("18273645"));
    assert_eq!(first.extra().get("State").map(String::as_str), Some("RUNNABLE"));
    assert_eq!(first.stacktrace().len(), 6);
    assert_eq!(first.coldfusion_stacktrace().count(), 2);
    assert_eq!(first.line(), 9);

    let request = &alert.running_requests()[0];
    assert_eq!(request.request_id(), "48211");
    assert_eq!(
        request.get_raw("requestUrl"),
        Some("http://shop.example.com/search.cfm?q=widgets")
    );
    assert_eq!(request.get_raw("statusCode"), Some("200"));
    assert_eq!(request.get_raw("status"), Some("Running"));
    assert_eq!(
        request.get_raw("userAgent"),
        Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36")
    );
}

#[test]
fn test_full_alert_report_ranking_and_join() {
    let alert = parse_alert(&fixture("alert-full.txt")).expect("fixture should parse");
    let report = build_report(&alert);

    let order: Vec<_> = report
        .running_requests_report
        .iter()
        .map(|view| view.request_id.unwrap_or_default())
        .collect();
    assert_eq!(order, vec!["48230", "48211", "48240", "48250"]);

    let slowest = &report.running_requests_report[0];
    assert_eq!(slowest.duration, Some(58004.0));
    assert_eq!(slowest.method, Some("POST"));
    assert_eq!(slowest.jdbc_queries_run, Some(418.0));
    let thread = slowest.thread.expect("sync request runs on a known thread");
    assert_eq!(thread.thread_id(), "cfthread-12");
    assert!(thread.has_coldfusion());

    let search = &report.running_requests_report[1];
    assert_eq!(search.jdbc_total_row_count, Some(1204.0));
    assert_eq!(search.max_memory_kb, Some(4_194_304.0));
    assert_eq!(search.used_memory_percent, Some("61%"));
    assert_eq!(search.amf_request, Some("false"));
    assert_eq!(
        search.started_at_utc().map(|started| started.to_rfc3339()),
        Some("2024-03-05T14:21:40+00:00".to_string())
    );

    assert!(report.running_requests_report[2].thread.is_none());

    let pending = &report.running_requests_report[3];
    assert_eq!(pending.duration, None);
    assert_eq!(
        pending.issues,
        vec![FieldIssue::FieldCoercion {
            field: "duration".to_string(),
            value: "pending".to_string()
        }]
    );

    let active: Vec<_> = report
        .coldfusion_threads_report
        .iter()
        .map(|view| view.thread_id)
        .collect();
    assert_eq!(active, vec!["cfthread-12", "CFThread-20"]);
}

#[test]
fn test_full_alert_validation_flags_unmatched_threads() {
    let alert = parse_alert(&fixture("alert-full.txt")).expect("fixture should parse");
    let findings = validate_alert(&alert);
    assert_eq!(
        findings,
        vec![
            ValidationError::UnmatchedThread {
                request_id: "48240".to_string(),
                thread_id: "ajp-nio-8016-exec-9".to_string(),
            },
            ValidationError::UnmatchedThread {
                request_id: "48250".to_string(),
                thread_id: "ajp-nio-8016-exec-11".to_string(),
            },
        ]
    );
}

#[test]
fn test_wrapped_crlf_alert_is_repaired() {
    let text = fixture("alert-wrapped.txt").replace('\n', "\r\n");
    let alert = parse_alert(&text).expect("fixture should parse");

    assert_eq!(alert.java_threads().len(), 2);
    let jetty = &alert.java_threads()[0];
    assert_eq!(jetty.thread_id(), "FusionReactor Web Server (Jetty worker-7)");
    assert_eq!(
        jetty.top_frame().map(|frame| frame.code()),
        Some("sun.nio.ch.EPollArrayWrapper.epollWait([Native Method])")
    );
    assert!(!jetty.is_cf_thread());

    let request = &alert.running_requests()[0];
    assert_eq!(
        request.get_raw("requestUrl"),
        Some("http://intranet.example.com/import.cfm?batch=7")
    );
    assert_eq!(request.get_raw("status"), Some("Running"));
    assert_eq!(
        request.get_raw("userAgent"),
        Some(
            "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 \
             (KHTML, like Gecko) Version/17.0 Safari/605.1.15"
        )
    );
    assert_eq!(request.get_raw("Session ID"), Some("7F2A"));
    assert_eq!(request.line(), 23);
    assert_eq!(
        request.issues(),
        &[FieldIssue::MalformedField {
            line: 28,
            text: "this line has no delimiter".to_string()
        }]
    );

    let report = build_report(&alert);
    let top = &report.running_requests_report[0];
    assert_eq!(top.request_id, Some("9001"));
    assert_eq!(top.bytes_sent, Some(10240.0));
    assert_eq!(top.thread.map(|thread| thread.thread_id()), Some("cfthread-2"));

    let document = analyze(&alert);
    assert_eq!(document.diagnostics.len(), 1);
    assert_eq!(document.diagnostics[0].record.kind, RecordKind::RunningRequest);
    assert_eq!(document.diagnostics[0].record.line, 23);
}

#[test]
fn test_truncated_alert_strict_and_lenient() {
    let text = fixture("alert-truncated.txt");

    assert_eq!(
        parse_alert(&text).unwrap_err(),
        ParseError::MissingSection {
            section: Section::RunningRequests
        }
    );

    let alert = parse_alert_with_options(&text, &ParseOptions::lenient())
        .expect("lenient parse never fails");
    assert_eq!(alert.missing_sections(), &[Section::RunningRequests]);
    assert!(alert.running_requests().is_empty());
    assert_eq!(alert.java_threads().len(), 2);
    let active: Vec<_> = alert.coldfusion_threads().map(|t| t.thread_id()).collect();
    assert_eq!(active, vec!["cfthread-8"]);
}

#[test]
fn test_single_request_joins_active_cf_thread() {
    let text = "\
JVM Stack Trace
---------------
JVM ID: jvm1
Thread ID: cfthread-7

foo.cfm:10

Running Requests (Full Details)
-------------------------------
Request ID: 42
Execution Time (ms): 150
Thread ID: cfthread-7
";
    let alert = parse_alert(text).expect("alert should parse");
    let report = build_report(&alert);

    assert_eq!(report.running_requests_report.len(), 1);
    let view = &report.running_requests_report[0];
    assert_eq!(view.request_id, Some("42"));
    assert_eq!(view.duration, Some(150.0));
    assert_eq!(view.thread_id, Some("cfthread-7"));
    assert!(view.issues.is_empty());

    let thread = view.thread.expect("request joins its thread");
    assert_eq!(thread.jvm_id(), "jvm1");
    assert_eq!(thread.thread_id(), "cfthread-7");
    assert!(thread.is_cf_thread());
    assert!(thread.has_coldfusion());
    assert_eq!(
        thread.stacktrace().iter().map(|frame| frame.code()).collect::<Vec<_>>(),
        vec!["foo.cfm:10"]
    );

    let active: Vec<_> = report
        .coldfusion_threads_report
        .iter()
        .map(|view| (view.jvm_id, view.thread_id))
        .collect();
    assert_eq!(active, vec![("jvm1", "cfthread-7")]);

    let json = serde_json::to_value(analyze(&alert)).expect("document serializes");
    let ranked = &json["report"]["runningRequestsReport"][0];
    assert_eq!(ranked["duration"], 150);
    assert_eq!(ranked["thread"]["isCFThread"], true);
    assert_eq!(ranked["thread"]["hasColdFusion"], true);
}

#[test]
fn test_waiting_cf_thread_is_left_out_of_report() {
    let text = "\
JVM Stack Trace
JVM ID: jvm1
Thread ID: cfthread-8

java.lang.Object.wait(Native Method)
Running Requests (Full Details)
";
    let alert = parse_alert(text).expect("alert should parse");
    assert!(alert.java_threads()[0].is_cf_thread());
    assert!(build_report(&alert).coldfusion_threads_report.is_empty());
}

#[test]
fn test_normalization_is_idempotent_over_fixtures() {
    for name in FIXTURES {
        let raw = fixture(name);
        for text in [raw.clone(), raw.replace('\n', "\r\n")] {
            let once = normalize_alert_text(&text);
            assert_eq!(normalize_alert_text(&once), once, "{name} is not a fixed point");
        }
    }
}

#[test]
fn test_thread_invariants_over_fixtures() {
    for name in FIXTURES {
        let alert = parse_alert_with_options(&fixture(name), &ParseOptions::lenient())
            .expect("lenient parse never fails");

        for thread in alert.java_threads() {
            assert_eq!(
                thread.has_coldfusion(),
                thread.coldfusion_stacktrace().next().is_some(),
                "{name}: hasColdFusion mismatch for {}",
                thread.thread_id()
            );
            assert_eq!(
                thread.is_cf_thread(),
                thread.thread_id().to_lowercase().starts_with("cfthread-"),
                "{name}: isCFThread mismatch for {}",
                thread.thread_id()
            );
            assert_eq!(thread.is_cf_thread(), is_cf_thread_id(thread.thread_id()));
        }

        for active in alert.coldfusion_threads() {
            assert!(active.is_cf_thread());
            let top = active.top_frame().expect("active threads have frames");
            assert!(!top.code().contains("java.lang.Object.wait"));
        }
    }
}

#[test]
fn test_report_invariants_over_fixtures() {
    for name in FIXTURES {
        let alert = parse_alert_with_options(&fixture(name), &ParseOptions::lenient())
            .expect("lenient parse never fails");
        let report = build_report(&alert);

        assert_eq!(report.running_requests_report.len(), alert.running_requests().len());
        let durations: Vec<_> = report
            .running_requests_report
            .iter()
            .map(|view| view.duration)
            .collect();
        for pair in durations.windows(2) {
            match (pair[0], pair[1]) {
                (Some(a), Some(b)) => assert!(a >= b, "{name}: {a} ranked above {b}"),
                (None, Some(_)) => panic!("{name}: missing duration ranked above a number"),
                _ => {}
            }
        }

        for view in &report.running_requests_report {
            if let Some(thread) = view.thread {
                assert_eq!(Some(thread.thread_id()), view.thread_id);
            }
        }

        assert_eq!(
            report.coldfusion_threads_report.len(),
            alert.coldfusion_threads().count()
        );
    }
}

#[test]
fn test_json_document_uses_canonical_keys() {
    let alert = parse_alert(&fixture("alert-full.txt")).expect("fixture should parse");
    let json = serde_json::to_value(analyze(&alert)).expect("document serializes");

    let thread = &json["javaThreads"][0];
    assert_eq!(thread["jvmID"], "1f3a-prod");
    assert_eq!(thread["isCFThread"], true);
    assert_eq!(thread["hasColdFusion"], true);
    assert_eq!(thread["coldfusionStacktrace"].as_array().map(Vec::len), Some(2));

    let ranked = &json["report"]["runningRequestsReport"][0];
    assert_eq!(ranked["requestID"], "48230");
    assert_eq!(ranked["duration"], 58004);
    assert_eq!(ranked["thread"]["threadID"], "cfthread-12");

    assert_eq!(json["coldfusionThreads"].as_array().map(Vec::len), Some(2));
    assert_eq!(json["validation"].as_array().map(Vec::len), Some(2));
}

fn fixture(name: &str) -> String {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    fs::read_to_string(path).expect("fixture file must be readable")
}
