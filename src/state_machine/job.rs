use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::{ExecutionState, Phase};
use crate::plugin::{Payload, PhaseError};

/// Classifies why a phase did not go through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The plugin does not implement the capability for the phase.
    MissingCapability,
    /// The capability ran and returned an error.
    Invocation,
    /// The capability panicked.
    Panic,
}

impl From<&PhaseError> for FailureKind {
    fn from(err: &PhaseError) -> Self {
        match err {
            PhaseError::Missing { .. } => FailureKind::MissingCapability,
            PhaseError::Failed(_) => FailureKind::Invocation,
            PhaseError::Panicked(_) => FailureKind::Panic,
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::MissingCapability => write!(f, "Missing capability"),
            FailureKind::Invocation => write!(f, "Invocation error"),
            FailureKind::Panic => write!(f, "Panic"),
        }
    }
}

/// A phase diagnostic kept in the job report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub phase: Phase,
    pub kind: FailureKind,
    pub message: String,
}

/// The state a single phase reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseRecord {
    pub phase: Phase,
    pub state: ExecutionState,
}

/// One run attempt of a job record against a plugin instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub plugin_name: String,
    pub state: ExecutionState,
    pub phase_history: Vec<PhaseRecord>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    pub fn new(plugin_name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            plugin_name: plugin_name.into(),
            state: ExecutionState::Uninitialized,
            phase_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether `phase` ran and reported `Running`.
    pub fn phase_went_through(&self, phase: Phase) -> bool {
        self.phase_history
            .iter()
            .any(|record| record.phase == phase && record.state == ExecutionState::Running)
    }

    pub(super) fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Structured report produced once a job reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobReport {
    pub job_id: String,
    pub plugin_name: String,
    pub state: ExecutionState,
    pub output: Payload,
    pub errors: Vec<Diagnostic>,
    pub phases: Vec<PhaseRecord>,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: i64,
}

impl JobReport {
    /// Generate a report from a finished job, its collected output and the
    /// diagnostics raised along the way.
    pub fn from_job(job: &Job, output: Payload, errors: Vec<Diagnostic>) -> Self {
        let now = Utc::now();
        let duration = now - job.created_at;

        Self {
            job_id: job.id.clone(),
            plugin_name: job.plugin_name.clone(),
            state: job.state,
            output,
            errors,
            phases: job.phase_history.clone(),
            started_at: job.created_at,
            completed_at: now,
            duration_ms: duration.num_milliseconds(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn job_creation_defaults() {
        let job = Job::new("example.echo");
        assert_eq!(job.plugin_name, "example.echo");
        assert_eq!(job.state, ExecutionState::Uninitialized);
        assert!(job.phase_history.is_empty());
        assert!(Uuid::parse_str(&job.id).is_ok());
    }

    #[test]
    fn job_ids_are_unique() {
        assert_ne!(Job::new("a").id, Job::new("a").id);
    }

    #[test]
    fn phase_went_through_needs_running() {
        let mut job = Job::new("example.echo");
        job.phase_history.push(PhaseRecord {
            phase: Phase::Process,
            state: ExecutionState::Failure,
        });
        assert!(!job.phase_went_through(Phase::Process));

        job.phase_history.push(PhaseRecord {
            phase: Phase::Setup,
            state: ExecutionState::Running,
        });
        assert!(job.phase_went_through(Phase::Setup));
    }

    #[test]
    fn report_from_job() {
        let mut job = Job::new("example.cube");
        job.state = ExecutionState::Success;
        let mut output = Payload::new();
        output.insert("result".into(), json!(27));

        let report = JobReport::from_job(&job, output, Vec::new());

        assert_eq!(report.job_id, job.id);
        assert_eq!(report.plugin_name, "example.cube");
        assert_eq!(report.state, ExecutionState::Success);
        assert_eq!(report.output["result"], json!(27));
        assert!(report.errors.is_empty());
        assert!(report.duration_ms >= 0);
        assert!(report.completed_at >= report.started_at);
    }

    #[test]
    fn failure_kind_from_phase_error() {
        let missing = PhaseError::missing(Phase::Setup);
        assert_eq!(FailureKind::from(&missing), FailureKind::MissingCapability);
        assert_eq!(
            FailureKind::from(&PhaseError::failed("boom")),
            FailureKind::Invocation
        );
        assert_eq!(
            FailureKind::from(&PhaseError::Panicked("boom".into())),
            FailureKind::Panic
        );
    }

    #[test]
    fn report_serializes_state_and_errors() {
        let mut job = Job::new("example.square");
        job.state = ExecutionState::Failure;
        let errors = vec![Diagnostic {
            phase: Phase::Process,
            kind: FailureKind::Invocation,
            message: "missing `x`".into(),
        }];

        let report = JobReport::from_job(&job, Payload::new(), errors);
        let value = serde_json::to_value(&report).unwrap();

        assert_eq!(value["state"], json!("failure"));
        assert_eq!(value["errors"][0]["phase"], json!("process"));
        assert_eq!(value["errors"][0]["kind"], json!("invocation"));
    }
}
