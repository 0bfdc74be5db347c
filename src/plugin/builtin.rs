//! Example plugins shipped with the harness.

use std::sync::Arc;

use serde_json::Value;

use super::{Capabilities, Payload, PhaseError, Plugin, PluginRegistry};
use crate::state_machine::Phase;

pub(super) fn register_all(registry: &mut PluginRegistry) {
    registry.register("example.cube", || Box::new(Cube::default()));
    registry.register("example.echo", || Box::new(Echo::default()));
    registry.register_fn("example.square", Arc::new(square));
}

/// Computes `x³`; `x` defaults to 0.
#[derive(Debug, Default)]
pub struct Cube {
    input: Payload,
    aborted: bool,
}

impl Plugin for Cube {
    fn name(&self) -> &str {
        "Cube"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    fn setup(&mut self, input: &Payload) -> Result<(), PhaseError> {
        self.input.extend(input.clone());
        Ok(())
    }

    fn process(&mut self) -> Result<Payload, PhaseError> {
        let x = self.input.get("x").cloned().unwrap_or(Value::from(0));
        let mut output = Payload::new();
        output.insert("result".into(), power(&x, 3)?);
        Ok(output)
    }

    fn teardown(&mut self) -> Result<Payload, PhaseError> {
        let mut output = Payload::new();
        if self.aborted {
            output.insert("aborted".into(), Value::Bool(true));
        }
        Ok(output)
    }

    fn abort(&mut self) -> Result<(), PhaseError> {
        self.aborted = true;
        Ok(())
    }
}

/// Copies its input to its output.
#[derive(Debug, Default)]
pub struct Echo {
    input: Payload,
}

impl Plugin for Echo {
    fn name(&self) -> &str {
        "Echo"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::of(&[Phase::Setup, Phase::Process, Phase::Teardown])
    }

    fn setup(&mut self, input: &Payload) -> Result<(), PhaseError> {
        self.input = input.clone();
        Ok(())
    }

    fn process(&mut self) -> Result<Payload, PhaseError> {
        Ok(self.input.clone())
    }

    fn teardown(&mut self) -> Result<Payload, PhaseError> {
        Ok(Payload::new())
    }
}

fn square(args: &Payload) -> Result<Value, String> {
    let x = args.get("x").ok_or("missing argument `x`")?;
    power(x, 2).map_err(|err| err.to_string())
}

// Integer inputs stay integers as long as the result fits in an i64.
fn power(x: &Value, exponent: u32) -> Result<Value, PhaseError> {
    if let Some(n) = x.as_i64()
        && let Some(result) = n.checked_pow(exponent)
    {
        return Ok(Value::from(result));
    }
    let Some(f) = x.as_f64() else {
        return Err(PhaseError::failed(format!("expected a number, got {x}")));
    };
    let result = f.powi(exponent as i32);
    if !result.is_finite() {
        return Err(PhaseError::failed(format!("result out of range: {x}^{exponent}")));
    }
    Ok(Value::from(result))
}
