//! Output formatting for alert analyses.

use crate::report::{AlertDocument, RunningRequestView};

/// Supported output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
pub enum OutputFormat {
    #[default]
    Json,
    Yaml,
    Markdown,
    Table,
}

impl OutputFormat {
    /// File extension for documents written in this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Yaml => "yaml",
            Self::Markdown => "md",
            Self::Table => "txt",
        }
    }
}

/// Formats an analyzed alert in the requested output format.
pub fn format_document(document: &AlertDocument<'_>, format: OutputFormat) -> Result<String, String> {
    match format {
        OutputFormat::Json => serde_json::to_string_pretty(document)
            .map_err(|e| format!("JSON serialization failed: {e}")),
        OutputFormat::Yaml => {
            serde_yaml::to_string(document).map_err(|e| format!("YAML serialization failed: {e}"))
        }
        OutputFormat::Markdown => Ok(document_to_markdown(document)),
        OutputFormat::Table => Ok(document_to_table(document)),
    }
}

fn started_label(view: &RunningRequestView<'_>) -> String {
    match view.started_at_utc() {
        Some(started) => started.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
        None => view.started_at_date.unwrap_or("-").to_string(),
    }
}

fn duration_label(view: &RunningRequestView<'_>) -> String {
    view.duration
        .map_or_else(|| "-".to_string(), |duration| format!("{duration}"))
}

fn cf_frame_count(view: &RunningRequestView<'_>) -> usize {
    view.thread
        .map_or(0, |thread| thread.coldfusion_stacktrace().count())
}

fn document_to_markdown(document: &AlertDocument<'_>) -> String {
    let mut out = String::new();
    let report = &document.report;

    out.push_str("# FusionReactor Alert\n\n");
    out.push_str(&format!(
        "- **Running requests:** {}\n",
        document.running_requests.len()
    ));
    out.push_str(&format!("- **JVM threads:** {}\n", document.java_threads.len()));
    out.push_str(&format!(
        "- **Active ColdFusion threads:** {}\n",
        document.coldfusion_threads.len()
    ));
    for section in &document.missing_sections {
        out.push_str(&format!("- **Missing section:** {section}\n"));
    }
    out.push('\n');

    if !report.running_requests_report.is_empty() {
        out.push_str("## Running Requests\n\n");
        out.push_str("| Request ID | Duration (ms) | Started | Method | URL | Thread | CF frames |\n");
        out.push_str("|------------|---------------|---------|--------|-----|--------|-----------|\n");
        for view in &report.running_requests_report {
            out.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} | {} |\n",
                view.request_id.unwrap_or("-"),
                duration_label(view),
                started_label(view),
                view.method.unwrap_or("-"),
                view.request_url.unwrap_or("-"),
                view.thread_id.unwrap_or("-"),
                cf_frame_count(view),
            ));
        }
        out.push('\n');
    }

    if !report.coldfusion_threads_report.is_empty() {
        out.push_str("## Active ColdFusion Threads\n\n");
        for thread in &report.coldfusion_threads_report {
            out.push_str(&format!("### {} ({})\n\n", thread.thread_id, thread.jvm_id));
            for frame in thread.stacktrace.iter().filter(|frame| frame.is_coldfusion()) {
                out.push_str(&format!("- `{}`\n", frame.code()));
            }
            out.push('\n');
        }
    }

    if !document.diagnostics.is_empty() || !document.validation.is_empty() {
        out.push_str("## Diagnostics\n\n");
        for diagnostic in &document.diagnostics {
            out.push_str(&format!("- {diagnostic}\n"));
        }
        for finding in &document.validation {
            out.push_str(&format!("- {finding}\n"));
        }
    }

    out
}

fn document_to_table(document: &AlertDocument<'_>) -> String {
    let mut out = String::new();
    let report = &document.report;

    out.push_str(&format!(
        "Requests: {}  Threads: {}  Active CF threads: {}\n",
        document.running_requests.len(),
        document.java_threads.len(),
        document.coldfusion_threads.len()
    ));

    if !report.running_requests_report.is_empty() {
        let max_id = report
            .running_requests_report
            .iter()
            .map(|view| view.request_id.unwrap_or("-").len())
            .max()
            .unwrap_or(2)
            .max("ID".len());

        out.push_str(&format!(
            "\n{:<width$}  {:>10}  {:<23}  {:<6}  URL\n",
            "ID",
            "MS",
            "STARTED",
            "METHOD",
            width = max_id
        ));
        for view in &report.running_requests_report {
            out.push_str(&format!(
                "{:<width$}  {:>10}  {:<23}  {:<6}  {}\n",
                view.request_id.unwrap_or("-"),
                duration_label(view),
                started_label(view),
                view.method.unwrap_or("-"),
                view.request_url.unwrap_or("-"),
                width = max_id
            ));
        }
    }

    if !report.coldfusion_threads_report.is_empty() {
        out.push_str("\nActive ColdFusion threads:\n");
        for thread in &report.coldfusion_threads_report {
            let top = thread.stacktrace.first().map_or("-", |frame| frame.code());
            out.push_str(&format!("  {}  {}\n", thread.thread_id, top));
        }
    }

    let issue_count = document.diagnostics.len() + document.validation.len();
    if issue_count > 0 {
        out.push_str(&format!("\n{issue_count} diagnostic(s)\n"));
    }

    out
}
