//! Plugin capability interface.
//!
//! A plugin implements any subset of the lifecycle phases. It declares which
//! ones through [`Plugin::capabilities`], and the runner only invokes the
//! phases the plugin says it supports.

mod builtin;
mod function;
mod registry;

use std::fmt;

use thiserror::Error;

use crate::state_machine::Phase;

pub use function::{FunctionPlugin, PluginFn};
pub use registry::{PluginRegistry, PluginResolver};

/// Structured payload exchanged with plugins: a string-keyed mapping.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// Error reported by a single phase invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("capability `{capability}` is not implemented")]
    Missing { capability: &'static str },

    #[error("{0}")]
    Failed(String),

    #[error("panicked: {0}")]
    Panicked(String),
}

impl PhaseError {
    pub fn missing(phase: Phase) -> Self {
        PhaseError::Missing {
            capability: phase.capability(),
        }
    }

    pub fn failed(message: impl fmt::Display) -> Self {
        PhaseError::Failed(message.to_string())
    }
}

/// The set of phases a plugin implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);

    pub fn all() -> Self {
        Self::of(&Phase::ALL)
    }

    pub fn of(phases: &[Phase]) -> Self {
        phases.iter().fold(Self::NONE, |caps, &phase| caps.with(phase))
    }

    pub fn with(self, phase: Phase) -> Self {
        Capabilities(self.0 | Self::bit(phase))
    }

    pub fn supports(self, phase: Phase) -> bool {
        self.0 & Self::bit(phase) != 0
    }

    fn bit(phase: Phase) -> u8 {
        1 << phase as u8
    }
}

/// A unit of work driven through the lifecycle phases.
///
/// Every phase method has a default body reporting the capability as
/// missing, so implementors only write the phases they declare.
pub trait Plugin: Send {
    /// Type name used in diagnostics.
    fn name(&self) -> &str;

    fn capabilities(&self) -> Capabilities;

    fn supports(&self, phase: Phase) -> bool {
        self.capabilities().supports(phase)
    }

    /// Receives the job input before any other phase.
    fn setup(&mut self, _input: &Payload) -> Result<(), PhaseError> {
        Err(PhaseError::missing(Phase::Setup))
    }

    /// Main work. The returned payload becomes part of the job output.
    fn process(&mut self) -> Result<Payload, PhaseError> {
        Err(PhaseError::missing(Phase::Process))
    }

    /// Release resources. Keys returned here override those from `process`.
    fn teardown(&mut self) -> Result<Payload, PhaseError> {
        Err(PhaseError::missing(Phase::Teardown))
    }

    /// Stop an in-flight job.
    fn abort(&mut self) -> Result<(), PhaseError> {
        Err(PhaseError::missing(Phase::Abort))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ProcessOnly;

    impl Plugin for ProcessOnly {
        fn name(&self) -> &str {
            "ProcessOnly"
        }

        fn capabilities(&self) -> Capabilities {
            Capabilities::of(&[Phase::Process])
        }

        fn process(&mut self) -> Result<Payload, PhaseError> {
            Ok(Payload::new())
        }
    }

    #[test]
    fn capabilities_set_operations() {
        let caps = Capabilities::of(&[Phase::Setup, Phase::Teardown]);
        assert!(caps.supports(Phase::Setup));
        assert!(caps.supports(Phase::Teardown));
        assert!(!caps.supports(Phase::Process));
        assert!(!caps.supports(Phase::Abort));

        assert!(caps.with(Phase::Abort).supports(Phase::Abort));
        assert!(Phase::ALL.iter().all(|&p| Capabilities::all().supports(p)));
        assert!(Phase::ALL.iter().all(|&p| !Capabilities::NONE.supports(p)));
    }

    #[test]
    fn default_phase_bodies_report_missing() {
        let mut plugin = ProcessOnly;
        assert!(plugin.supports(Phase::Process));
        assert!(!plugin.supports(Phase::Setup));
        assert_eq!(
            plugin.setup(&Payload::new()),
            Err(PhaseError::Missing { capability: "setup" })
        );
        assert_eq!(plugin.abort(), Err(PhaseError::missing(Phase::Abort)));
        assert!(plugin.process().is_ok());
    }

    #[test]
    fn phase_error_display() {
        assert_eq!(
            PhaseError::missing(Phase::Teardown).to_string(),
            "capability `teardown` is not implemented"
        );
        assert_eq!(PhaseError::failed("disk full").to_string(), "disk full");
        assert_eq!(
            PhaseError::Panicked("index out of bounds".into()).to_string(),
            "panicked: index out of bounds"
        );
    }
}
