use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, error, info, warn};

use crate::error::HarnessError;
use crate::plugin::{Payload, PhaseError, Plugin, PluginResolver};
use crate::record::JobRecord;
use crate::state_machine::{
    Diagnostic, ExecutionState, FailureKind, Job, JobReport, Phase, StateMachine, Transition,
};

/// What a single phase dispatch reported.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub phase: Phase,
    /// `Running` when the phase went through, `Failure` otherwise.
    pub state: ExecutionState,
    pub output: Payload,
    pub diagnostic: Option<Diagnostic>,
}

impl PhaseOutcome {
    fn running(phase: Phase, output: Payload) -> Self {
        Self {
            phase,
            state: ExecutionState::Running,
            output,
            diagnostic: None,
        }
    }

    fn failed(phase: Phase, err: &PhaseError) -> Self {
        Self {
            phase,
            state: ExecutionState::Failure,
            output: Payload::new(),
            diagnostic: Some(Diagnostic {
                phase,
                kind: FailureKind::from(err),
                message: err.to_string(),
            }),
        }
    }
}

/// Invoke the capability for `phase` on `plugin` and translate the outcome
/// into an execution state.
///
/// Never fails: a missing capability, an error returned by the capability and
/// a panic inside it all end up as a `Failure` outcome with a diagnostic.
pub fn dispatch(plugin: &mut dyn Plugin, phase: Phase, input: &Payload) -> PhaseOutcome {
    let capability = phase.capability();
    let plugin_name = plugin.name().to_string();

    if !plugin.supports(phase) {
        error!(capability, plugin = %plugin_name, "No such capability {capability} in plugin {plugin_name}");
        return PhaseOutcome::failed(phase, &PhaseError::missing(phase));
    }

    debug!(plugin = %plugin_name, phase = %phase, "Dispatching phase");
    let result = panic::catch_unwind(AssertUnwindSafe(|| invoke(plugin, phase, input)))
        .unwrap_or_else(|payload| Err(PhaseError::Panicked(panic_message(payload.as_ref()))));

    match result {
        Ok(output) => PhaseOutcome::running(phase, output),
        Err(err @ PhaseError::Missing { .. }) => {
            // Declared but not implemented.
            error!(capability, plugin = %plugin_name, "No such capability {capability} in plugin {plugin_name}");
            PhaseOutcome::failed(phase, &err)
        }
        Err(err) => {
            error!(error = %err, plugin = %plugin_name, phase = %phase, "Error while calling {plugin_name}.{phase}");
            PhaseOutcome::failed(phase, &err)
        }
    }
}

fn invoke(plugin: &mut dyn Plugin, phase: Phase, input: &Payload) -> Result<Payload, PhaseError> {
    match phase {
        Phase::Setup => plugin.setup(input).map(|()| Payload::new()),
        Phase::Process => plugin.process(),
        Phase::Teardown => plugin.teardown(),
        Phase::Abort => plugin.abort().map(|()| Payload::new()),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

type Callback = Box<dyn Fn(&JobReport) + Send + Sync>;

/// Drives job records through the plugin lifecycle.
///
/// Holds no per-job state: every call resolves a fresh plugin instance, so a
/// single runner can serve any number of jobs.
pub struct JobRunner<R> {
    resolver: R,
    callbacks: Vec<Callback>,
}

impl<R: PluginResolver> JobRunner<R> {
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            callbacks: Vec::new(),
        }
    }

    /// Register a closure called with every finished report.
    pub fn connect_callback(&mut self, callback: impl Fn(&JobReport) + Send + Sync + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Resolve the record's plugin and run setup, process and teardown.
    ///
    /// Only plugin resolution can fail; phase failures are reported through
    /// the returned report's state.
    pub fn run(&self, record: &JobRecord) -> Result<JobReport, HarnessError> {
        let mut plugin = self.resolve(record)?;
        Ok(self.execute(plugin.as_mut(), record))
    }

    /// Resolve the record's plugin and invoke its abort capability.
    pub fn abort(&self, record: &JobRecord) -> Result<JobReport, HarnessError> {
        let mut plugin = self.resolve(record)?;
        Ok(self.abort_plugin(plugin.as_mut(), record))
    }

    /// Run the setup → process → teardown sequence on an already resolved
    /// plugin instance.
    pub fn execute(&self, plugin: &mut dyn Plugin, record: &JobRecord) -> JobReport {
        self.drive(plugin, record, Phase::Setup)
    }

    /// Invoke the abort capability on an already resolved plugin instance.
    pub fn abort_plugin(&self, plugin: &mut dyn Plugin, record: &JobRecord) -> JobReport {
        self.drive(plugin, record, Phase::Abort)
    }

    fn resolve(&self, record: &JobRecord) -> Result<Box<dyn Plugin>, HarnessError> {
        self.resolver.resolve(&record.plugin_name).inspect_err(|err| {
            error!(plugin = %record.plugin_name, error = %err, "Plugin failed to be instantiated");
        })
    }

    fn drive(&self, plugin: &mut dyn Plugin, record: &JobRecord, first: Phase) -> JobReport {
        let mut job = Job::new(record.plugin_name.as_str());
        let mut output = Payload::new();
        let mut errors = Vec::new();

        let mut phase = first;
        loop {
            let outcome = dispatch(plugin, phase, &record.input);
            output.extend(outcome.output);
            errors.extend(outcome.diagnostic);

            match StateMachine::next(&mut job, phase, outcome.state) {
                Transition::Next(next) => phase = next,
                Transition::Complete(_) => break,
            }
        }

        // Output is only exposed once the job is terminal.
        let report = JobReport::from_job(&job, output, errors);
        info!(
            job_id = %report.job_id,
            plugin = %report.plugin_name,
            state = %report.state,
            duration_ms = report.duration_ms,
            "Job finished"
        );
        self.notify(&report);
        report
    }

    fn notify(&self, report: &JobReport) {
        for callback in &self.callbacks {
            if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| callback(report))) {
                warn!(
                    job_id = %report.job_id,
                    error = %panic_message(payload.as_ref()),
                    "Completion callback panicked"
                );
            }
        }
    }
}
