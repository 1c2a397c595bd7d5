//! Parsing and ranking of FusionReactor alert reports.
//!
//! FusionReactor mails an alert when a ColdFusion server runs hot. The mail
//! lists every in-flight request and a stack trace of every JVM thread. This
//! crate turns that text into a typed [`Alert`] and ranks its requests so the
//! slowest ones, and the busy `cfthread`s behind them, come first.
//!
//! # Main entry points
//!
//! - [`parse_alert`]: parse with strict defaults.
//! - [`parse_alert_with_options`]: parse with [`ParseOptions`], e.g. lenient
//!   handling of a missing section.
//! - [`build_report`]: rank requests and join them to their threads.
//! - [`analyze`]: everything above plus diagnostics, in one serializable
//!   [`AlertDocument`].
//! - [`batch::parse_files`]: parse many alert files in parallel.
//!
//! # Example
//!
//! ```
//! use fusion_alert_extract::{build_report, parse_alert};
//!
//! let text = "\
//! JVM Stack Trace
//! ---------------
//! JVM ID: jvm1
//! Thread ID: cfthread-4
//!
//! coldfusion.runtime.CFPage.invoke(/www/slow.cfm:17)
//! ---------
//! Running Requests (Full Details)
//! -------------------------------
//! Request ID: 88
//! Thread ID: cfthread-4
//! Execution Time (ms): 31000
//! ";
//!
//! let alert = parse_alert(text).unwrap();
//! let report = build_report(&alert);
//! let slowest = &report.running_requests_report[0];
//! assert_eq!(slowest.duration, Some(31000.0));
//! assert!(slowest.thread.unwrap().has_coldfusion());
//! ```
//!
//! [`Alert`]: fusion_alert_core::Alert

pub mod batch;
pub mod config;
pub mod error;
pub mod output;
pub mod parser;
pub mod report;

pub use config::{ParseOptions, SectionPolicy};
pub use error::{BatchError, ConfigError, ParseError};
pub use parser::{classify, fields, normalize, records, sections};
pub use report::{
    AlertDocument, ColdFusionThreadView, Report, RunningRequestView, analyze, build_report,
};

use fusion_alert_core::Alert;

/// Parses alert text with strict defaults.
///
/// # Errors
///
/// Returns [`ParseError::MissingSection`] when either section heading is
/// absent. Empty input fails on the `JVM Stack Trace` section.
pub fn parse_alert(text: &str) -> Result<Alert, ParseError> {
    parse_alert_with_options(text, &ParseOptions::default())
}

/// Parses alert text.
///
/// Parsing is pure: the same text and options always give the same alert.
///
/// # Errors
///
/// Under [`SectionPolicy::Strict`], returns [`ParseError::MissingSection`] for
/// the first absent section heading. Lenient parsing never fails.
///
/// # Examples
///
/// ```
/// use fusion_alert_extract::{ParseOptions, parse_alert_with_options};
///
/// let alert = parse_alert_with_options("", &ParseOptions::lenient()).unwrap();
/// assert!(alert.is_empty());
/// assert_eq!(alert.missing_sections().len(), 2);
/// ```
pub fn parse_alert_with_options(text: &str, options: &ParseOptions) -> Result<Alert, ParseError> {
    parser::parse_alert_text(text, options)
}
