//! Parallel parsing of many alert files.
//!
//! Each file is parsed independently; results come back in input order.

use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info};

use fusion_alert_core::Alert;

use crate::config::ParseOptions;
use crate::error::BatchError;

/// Settings for [`parse_files`].
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    pub inputs: Vec<PathBuf>,
    /// Worker count; `None` picks one from the available parallelism.
    pub jobs: Option<usize>,
    pub options: ParseOptions,
}

/// The outcome for one input file.
#[derive(Debug)]
pub struct BatchEntry {
    pub path: PathBuf,
    pub result: Result<Alert, BatchError>,
}

impl BatchEntry {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Parses every input on a dedicated worker pool.
///
/// Per-file failures are returned in the entry; only a pool that cannot be
/// started fails the whole batch.
pub fn parse_files(config: &BatchConfig) -> Result<Vec<BatchEntry>, BatchError> {
    let jobs = config
        .jobs
        .unwrap_or_else(|| default_parallel_jobs(config.inputs.len()))
        .max(1);
    info!(inputs = config.inputs.len(), jobs, "parsing alert batch");

    let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;
    let entries: Vec<BatchEntry> = pool.install(|| {
        config
            .inputs
            .par_iter()
            .map(|path| BatchEntry {
                path: path.clone(),
                result: parse_file(path, &config.options),
            })
            .collect()
    });

    let failed = entries.iter().filter(|entry| !entry.is_ok()).count();
    debug!(parsed = entries.len() - failed, failed, "alert batch finished");
    Ok(entries)
}

/// Reads and parses a single alert file.
pub fn parse_file(path: &Path, options: &ParseOptions) -> Result<Alert, BatchError> {
    let text = std::fs::read_to_string(path).map_err(|source| BatchError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    crate::parse_alert_with_options(&text, options).map_err(|source| BatchError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn default_parallel_jobs(input_count: usize) -> usize {
    let cpu_count = std::thread::available_parallelism()
        .map(|parallelism| parallelism.get())
        .unwrap_or(4);
    cpu_count.min(8).max(1).min(input_count.max(1))
}
