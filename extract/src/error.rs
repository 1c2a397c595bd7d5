//! Error types for alert extraction.
//!
//! Only a missing section is fatal to a parse. Problems inside a record are
//! reported as [`FieldIssue`](fusion_alert_core::FieldIssue)s on that record.

use std::path::PathBuf;

use fusion_alert_core::Section;
use thiserror::Error;

/// Fatal parse failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A section heading was not found and the options require it.
    #[error("missing section: `{section}` heading not found")]
    MissingSection { section: Section },
}

/// Failures loading or saving [`ParseOptions`](crate::ParseOptions).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Failures while parsing a set of alert files.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },

    /// The worker pool could not be started.
    #[error("failed to build worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
