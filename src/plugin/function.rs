use std::sync::Arc;

use serde_json::Value;

use super::{Capabilities, Payload, PhaseError, Plugin};
use crate::state_machine::Phase;

/// A plain function exposed as a plugin.
pub type PluginFn = Arc<dyn Fn(&Payload) -> Result<Value, String> + Send + Sync>;

// Keys the harness may place in the input that the wrapped function never sees.
const BOOKKEEPING_KEYS: [&str; 2] = ["job_id", "plugin_name"];

/// Wraps a function so it can be driven like any other plugin.
///
/// `process` calls the function with the job input and stores its return
/// value under `"result"`.
pub struct FunctionPlugin {
    name: String,
    function: PluginFn,
    input: Payload,
}

impl FunctionPlugin {
    pub fn new(name: impl Into<String>, function: PluginFn) -> Self {
        Self {
            name: name.into(),
            function,
            input: Payload::new(),
        }
    }
}

impl Plugin for FunctionPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[Phase::Setup, Phase::Process, Phase::Teardown])
    }

    fn setup(&mut self, input: &Payload) -> Result<(), PhaseError> {
        self.input.extend(input.clone());
        Ok(())
    }

    fn process(&mut self) -> Result<Payload, PhaseError> {
        let mut arguments = self.input.clone();
        for key in BOOKKEEPING_KEYS {
            arguments.remove(key);
        }

        let result = (self.function)(&arguments).map_err(PhaseError::Failed)?;
        let mut output = Payload::new();
        output.insert("result".into(), result);
        Ok(output)
    }

    fn teardown(&mut self) -> Result<Payload, PhaseError> {
        Ok(Payload::new())
    }
}
