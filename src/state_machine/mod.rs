mod job;
mod state;

pub use job::{Diagnostic, FailureKind, Job, JobReport, PhaseRecord};
pub use state::{ExecutionState, Phase, StateMachine, Transition};
