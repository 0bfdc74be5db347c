//! Job records: reading them from disk and persisting job reports.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::HarnessError;
use crate::plugin::Payload;
use crate::state_machine::JobReport;

/// A persisted unit of work: which plugin to run, and with what input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub plugin_name: String,
    #[serde(default)]
    pub input: Payload,
}

impl JobRecord {
    /// Read and parse a job record, failing on any problem.
    pub fn from_path(path: &Path) -> Result<Self, HarnessError> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents).map_err(|err| HarnessError::InvalidRecord {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(contents)
    }
}

/// Load a job record, logging a warning and returning `None` when the path
/// is missing or the record cannot be read.
pub fn load(path: &Path) -> Option<JobRecord> {
    if !path.is_file() {
        warn!(path = %path.display(), "Job record not found, skipping");
        return None;
    }

    match JobRecord::from_path(path) {
        Ok(record) => {
            debug!(path = %path.display(), plugin = %record.plugin_name, "Loaded job record");
            Some(record)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "Unreadable job record, skipping");
            None
        }
    }
}

/// Write a job report as `<job-id>.json` under `dir`, creating it if needed.
pub fn store_report(dir: &Path, report: &JobReport) -> Result<PathBuf, HarnessError> {
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.json", report.job_id));
    fs::write(&path, serde_json::to_string_pretty(report)?)?;
    Ok(path)
}

/// Render a plugin output for display.
pub fn render_output(output: &Payload, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(output)
    } else {
        serde_json::to_string(output)
    }
}
