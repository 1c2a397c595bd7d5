//! Data model for parsed FusionReactor alert reports.
//!
//! A FusionReactor alert email describes a running ColdFusion application
//! server at one instant: the HTTP requests in flight and a stack trace of
//! every JVM thread. This crate defines the typed form of that report:
//!
//! - [`Alert`]: the parse result, owning all records in source order.
//! - [`RunningRequest`]: one in-flight request, values kept as printed.
//! - [`JavaThread`]: one thread snapshot with its classified frames.
//! - [`StackTraceItem`]: one frame line.
//! - [`RequestField`] / [`ThreadField`]: the label-to-key tables.
//! - [`FieldIssue`] / [`Diagnostic`]: non-fatal per-record problems.
//!
//! Parsing lives in `fusion-alert-extract`; this crate holds no parsing logic.
//!
//! # Example
//!
//! ```
//! use fusion_alert_core::*;
//!
//! let thread = JavaThread::new("jvm1", "cfthread-7", vec![StackTraceItem::new("foo.cfm:10")]);
//! let alert = Alert::new(Vec::new(), vec![thread]);
//!
//! assert!(alert.java_threads()[0].is_cf_thread());
//! assert_eq!(alert.coldfusion_threads().count(), 1);
//! assert!(validate_alert(&alert).is_empty());
//! ```

mod diagnostics;
mod fields;
mod types;
mod validate;

pub use diagnostics::{Diagnostic, FieldIssue, RecordKind, RecordRef};
pub use fields::{FieldKind, RequestField, ThreadField};
pub use types::*;
pub use validate::{ValidationError, validate_alert};
