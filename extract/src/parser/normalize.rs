//! Alert-text normalization.
//!
//! Mail clients re-wrap long lines and mix line endings. Normalization undoes
//! that so the later stages can work line by line. The output is a fixed
//! point: normalizing it again changes nothing.

use regex::Regex;
use std::borrow::Cow;
use std::sync::LazyLock;

use fusion_alert_core::{RequestField, Section, ThreadField};

/// Annotation FusionReactor appends to requests whose response is still open.
pub const STREAMING_NOTE: &str = "[Note: Data is still streaming]";

const USER_AGENT_PREFIX: &str = "User Agent:";

/// Normalizes raw alert text.
///
/// Steps, in order:
/// 1. trim the whole text and convert `\r\n` / `\r` to `\n`;
/// 2. trim every line, dropping the streaming note (a line holding only the
///    note disappears);
/// 3. join a line starting with `http` onto the previous line, unless that
///    line is blank;
/// 4. collapse whitespace inside `[Native Method]`;
/// 5. rejoin a `FusionReactor Web Server (...)` thread name wrapped over two
///    lines;
/// 6. append wrapped continuation lines to a `User Agent:` line.
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::normalize::normalize_alert_text;
///
/// let raw = "  Request URL:\r\nhttp://example.com/a.cfm  \r\n";
/// assert_eq!(normalize_alert_text(raw), "Request URL: http://example.com/a.cfm");
/// ```
pub fn normalize_alert_text(raw: &str) -> String {
    static NATIVE_METHOD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"\[Native\s+Method\]").expect("static regex must compile")
    });
    static WEB_SERVER_THREAD_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(FusionReactor Web Server \([^\n)]+)\n([^)\n]+\))")
            .expect("static regex must compile")
    });

    let unified = raw.trim().replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<Cow<'_, str>> = Vec::new();
    for line in unified.split('\n').filter_map(clean_line) {
        match lines.last_mut() {
            Some(prev) if line.starts_with("http") && !prev.is_empty() => {
                let prev = prev.to_mut();
                prev.push(' ');
                prev.push_str(&line);
            }
            _ => lines.push(line),
        }
    }
    let text = lines.join("\n");

    let text = NATIVE_METHOD_RE.replace_all(&text, "[Native Method]");
    let text = WEB_SERVER_THREAD_RE.replace_all(&text, "${1} ${2}");

    join_wrapped_user_agents(&text)
}

/// Trims a line and strips the streaming note; `None` drops the line.
fn clean_line(line: &str) -> Option<Cow<'_, str>> {
    let trimmed = line.trim();
    if !trimmed.contains(STREAMING_NOTE) {
        return Some(Cow::Borrowed(trimmed));
    }
    let cleaned = trimmed.replace(STREAMING_NOTE, "");
    let cleaned = cleaned.trim();
    (!cleaned.is_empty()).then(|| Cow::Owned(cleaned.to_string()))
}

fn join_wrapped_user_agents(text: &str) -> String {
    let mut joined: Vec<String> = Vec::new();
    let mut in_user_agent = false;

    for line in text.split('\n') {
        if in_user_agent && is_user_agent_continuation(line) {
            if let Some(prev) = joined.last_mut() {
                prev.push(' ');
                prev.push_str(line);
                continue;
            }
        }
        in_user_agent = line.starts_with(USER_AGENT_PREFIX);
        joined.push(line.to_string());
    }

    joined.join("\n")
}

fn is_user_agent_continuation(line: &str) -> bool {
    !line.is_empty()
        && !starts_with_field_label(line)
        && !line.chars().all(|ch| ch == '-')
        && ![Section::JvmStackTrace, Section::RunningRequests]
            .iter()
            .any(|section| line.starts_with(section.anchor()))
}

/// A recognized label, or one shaped like a property label (`Session ID:`).
fn starts_with_field_label(line: &str) -> bool {
    line.split_once(':').is_some_and(|(label, _)| {
        RequestField::from_label(label).is_some()
            || ThreadField::from_label(label).is_some()
            || looks_like_label(label)
    })
}

fn looks_like_label(label: &str) -> bool {
    label.starts_with(|ch: char| ch.is_ascii_uppercase())
        && label
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || matches!(ch, ' ' | '(' | ')'))
}
