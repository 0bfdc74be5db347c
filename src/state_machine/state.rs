use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Job, PhaseRecord};

/// A named step in a plugin's lifecycle.
///
/// Each phase maps to exactly one plugin capability. The mapping is fixed and
/// never derived from the plugin itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Setup,
    Process,
    Teardown,
    Abort,
}

impl Phase {
    pub const ALL: [Phase; 4] = [Phase::Setup, Phase::Process, Phase::Teardown, Phase::Abort];

    /// Name of the capability implementing this phase.
    pub fn capability(self) -> &'static str {
        match self {
            Phase::Setup => "setup",
            Phase::Process => "process",
            Phase::Teardown => "teardown",
            Phase::Abort => "abort",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.capability())
    }
}

/// Execution state of a job.
///
/// `Uninitialized` holds before any phase runs, `Running` means the last
/// attempted phase did not fail, and `Success`, `Failure` and `Aborted` are
/// terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionState {
    Uninitialized,
    Running,
    Success,
    Failure,
    Aborted,
}

impl ExecutionState {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ExecutionState::Success | ExecutionState::Failure | ExecutionState::Aborted
        )
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionState::Uninitialized => write!(f, "uninitialized"),
            ExecutionState::Running => write!(f, "running"),
            ExecutionState::Success => write!(f, "success"),
            ExecutionState::Failure => write!(f, "failure"),
            ExecutionState::Aborted => write!(f, "aborted"),
        }
    }
}

/// The result of evaluating a state transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Dispatch this phase next.
    Next(Phase),
    /// The job reached a terminal state.
    Complete(ExecutionState),
}

/// Drives a `Job` through the lifecycle phases.
pub struct StateMachine;

impl StateMachine {
    /// Compute the next transition for the given job after `phase` reported
    /// `reported` (`Running` when the phase went through, `Failure` otherwise).
    ///
    /// - `Setup` that did not run aborts the sequence with `Failure`.
    /// - `Process` always proceeds to `Teardown`, whatever it reported.
    /// - `Teardown` completes with `Success` only when both `Process` and
    ///   `Teardown` reported `Running`.
    /// - `Abort` completes with `Aborted`, or `Failure` when it did not run.
    ///
    /// A job already in a terminal state is left untouched.
    pub fn next(job: &mut Job, phase: Phase, reported: ExecutionState) -> Transition {
        if job.state.is_terminal() {
            return Transition::Complete(job.state);
        }

        let went_through = reported == ExecutionState::Running;
        let transition = match phase {
            Phase::Setup if went_through => Transition::Next(Phase::Process),
            Phase::Setup => Transition::Complete(ExecutionState::Failure),
            Phase::Process => Transition::Next(Phase::Teardown),
            Phase::Teardown => {
                if went_through && job.phase_went_through(Phase::Process) {
                    Transition::Complete(ExecutionState::Success)
                } else {
                    Transition::Complete(ExecutionState::Failure)
                }
            }
            Phase::Abort if went_through => Transition::Complete(ExecutionState::Aborted),
            Phase::Abort => Transition::Complete(ExecutionState::Failure),
        };

        job.phase_history.push(PhaseRecord {
            phase,
            state: reported,
        });
        job.state = match transition {
            Transition::Next(_) => ExecutionState::Running,
            Transition::Complete(state) => state,
        };
        job.touch();

        transition
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RUNNING: ExecutionState = ExecutionState::Running;
    const FAILURE: ExecutionState = ExecutionState::Failure;

    fn make_job() -> Job {
        Job::new("example.cube")
    }

    #[test]
    fn happy_path_walks_all_phases() {
        let mut job = make_job();
        assert_eq!(job.state, ExecutionState::Uninitialized);

        let t = StateMachine::next(&mut job, Phase::Setup, RUNNING);
        assert_eq!(t, Transition::Next(Phase::Process));
        assert_eq!(job.state, RUNNING);

        let t = StateMachine::next(&mut job, Phase::Process, RUNNING);
        assert_eq!(t, Transition::Next(Phase::Teardown));

        let t = StateMachine::next(&mut job, Phase::Teardown, RUNNING);
        assert_eq!(t, Transition::Complete(ExecutionState::Success));
        assert_eq!(job.state, ExecutionState::Success);
    }

    #[test]
    fn setup_failure_skips_remaining_phases() {
        let mut job = make_job();

        let t = StateMachine::next(&mut job, Phase::Setup, FAILURE);
        assert_eq!(t, Transition::Complete(FAILURE));
        assert_eq!(job.state, FAILURE);
        assert_eq!(job.phase_history.len(), 1);
    }

    #[test]
    fn process_failure_still_runs_teardown() {
        let mut job = make_job();
        StateMachine::next(&mut job, Phase::Setup, RUNNING);

        let t = StateMachine::next(&mut job, Phase::Process, FAILURE);
        assert_eq!(t, Transition::Next(Phase::Teardown));
        assert!(!job.state.is_terminal());

        let t = StateMachine::next(&mut job, Phase::Teardown, RUNNING);
        assert_eq!(t, Transition::Complete(FAILURE));
    }

    #[test]
    fn teardown_failure_fails_the_job() {
        let mut job = make_job();
        StateMachine::next(&mut job, Phase::Setup, RUNNING);
        StateMachine::next(&mut job, Phase::Process, RUNNING);

        let t = StateMachine::next(&mut job, Phase::Teardown, FAILURE);
        assert_eq!(t, Transition::Complete(FAILURE));
    }

    #[test]
    fn abort_outcomes() {
        let mut job = make_job();
        let t = StateMachine::next(&mut job, Phase::Abort, RUNNING);
        assert_eq!(t, Transition::Complete(ExecutionState::Aborted));

        let mut job = make_job();
        let t = StateMachine::next(&mut job, Phase::Abort, FAILURE);
        assert_eq!(t, Transition::Complete(FAILURE));
    }

    #[test]
    fn terminal_state_is_never_left() {
        let mut job = make_job();
        StateMachine::next(&mut job, Phase::Setup, FAILURE);

        let t = StateMachine::next(&mut job, Phase::Process, RUNNING);
        assert_eq!(t, Transition::Complete(FAILURE));
        let t = StateMachine::next(&mut job, Phase::Abort, RUNNING);
        assert_eq!(t, Transition::Complete(FAILURE));
        assert_eq!(job.state, FAILURE);
        assert_eq!(job.phase_history.len(), 1);
    }

    #[test]
    fn phase_history_is_recorded() {
        let mut job = make_job();
        StateMachine::next(&mut job, Phase::Setup, RUNNING);
        StateMachine::next(&mut job, Phase::Process, FAILURE);
        StateMachine::next(&mut job, Phase::Teardown, RUNNING);

        let phases: Vec<_> = job.phase_history.iter().map(|r| (r.phase, r.state)).collect();
        assert_eq!(
            phases,
            vec![
                (Phase::Setup, RUNNING),
                (Phase::Process, FAILURE),
                (Phase::Teardown, RUNNING),
            ]
        );
    }

    #[test]
    fn display_names() {
        assert_eq!(ExecutionState::Uninitialized.to_string(), "uninitialized");
        assert_eq!(ExecutionState::Aborted.to_string(), "aborted");
        assert_eq!(Phase::Teardown.to_string(), "teardown");
        assert_eq!(Phase::Abort.capability(), "abort");
    }

    #[test]
    fn state_serializes_lowercase() {
        let json = serde_json::to_string(&ExecutionState::Success).unwrap();
        assert_eq!(json, "\"success\"");
        let phase: Phase = serde_json::from_str("\"process\"").unwrap();
        assert_eq!(phase, Phase::Process);
    }
}
