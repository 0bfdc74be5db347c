//! Per-batch job statistics.

use chrono::{DateTime, Utc};

use crate::state_machine::{ExecutionState, JobReport};

/// One finished job as seen by the statistics table.
#[derive(Debug, Clone, PartialEq)]
pub struct JobStat {
    pub job_id: String,
    pub plugin_name: String,
    pub state: ExecutionState,
    pub runtime_ms: i64,
}

/// Accumulates runtime statistics over a batch of jobs.
#[derive(Debug, Clone)]
pub struct BatchStatistics {
    started_at: DateTime<Utc>,
    rows: Vec<JobStat>,
    skipped: usize,
}

impl Default for BatchStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl BatchStatistics {
    pub fn new() -> Self {
        Self {
            started_at: Utc::now(),
            rows: Vec::new(),
            skipped: 0,
        }
    }

    pub fn record(&mut self, report: &JobReport) {
        self.rows.push(JobStat {
            job_id: report.job_id.clone(),
            plugin_name: report.plugin_name.clone(),
            state: report.state,
            runtime_ms: report.duration_ms,
        });
    }

    /// Count a job that never reached phase dispatch.
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.skipped == 0
    }

    pub fn count(&self, state: ExecutionState) -> usize {
        self.rows.iter().filter(|row| row.state == state).count()
    }

    pub fn skipped(&self) -> usize {
        self.skipped
    }

    /// Sum of the jobs' own runtimes.
    pub fn total_runtime_ms(&self) -> i64 {
        self.rows.iter().map(|row| row.runtime_ms).sum()
    }

    pub fn average_runtime_ms(&self) -> f64 {
        self.total_runtime_ms() as f64 / self.rows.len().max(1) as f64
    }

    /// Wall time since the batch started.
    pub fn elapsed_ms(&self) -> i64 {
        (Utc::now() - self.started_at).num_milliseconds()
    }

    /// Render the statistics table for a batch that took `wall_ms`.
    pub fn render(&self, wall_ms: i64) -> String {
        let rule = "_".repeat(78);
        let mut lines = vec![
            rule.clone(),
            format!("{:<4} | {:<36} | {:<20} | {:>9}", "#", "Job", "Plugin", "Runtime"),
            rule.clone(),
        ];
        for (index, row) in self.rows.iter().enumerate() {
            lines.push(format!(
                "{:<4} | {:<36} | {:<20} | {:>7}ms  {}",
                index + 1,
                row.job_id,
                row.plugin_name,
                row.runtime_ms,
                row.state
            ));
        }
        lines.push(rule);
        lines.push(format!(
            "Jobs: {} success, {} failure, {} aborted, {} skipped",
            self.count(ExecutionState::Success),
            self.count(ExecutionState::Failure),
            self.count(ExecutionState::Aborted),
            self.skipped
        ));
        lines.push(format!(
            "Total execution time: {}ms, wall time: {}ms, average per job: {:.3}ms",
            self.total_runtime_ms(),
            wall_ms,
            self.average_runtime_ms()
        ));
        lines.join("\n")
    }
}
