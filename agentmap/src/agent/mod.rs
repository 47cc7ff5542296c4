//! The Agent Lifecycle Engine (spec.md §4.1): every agent exposes a single
//! public operation, `run`, built once on [`lifecycle::run`]. Concrete agent
//! types implement only [`Agent::process`] and, optionally,
//! [`Agent::pre_process`] / [`Agent::post_process`].

pub mod builtins;
pub mod factory;
pub mod lifecycle;
pub mod validation;

use crate::error::AgentMapError;
use crate::graph::node_spec::{InputField, NodeSpec};
use crate::services::capability::CapabilityConsumer;
use crate::state::StateBag;
use crate::tracker::ExecutionTracker;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};

/// Output-field validation mode (spec.md §3, §4.1). `Warn` is the default:
/// multi-output is the composition contract for fan-out workflows, so
/// dropping a declared field is usually a bug (warn) while extras are often
/// legitimate (preserve).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputValidation {
    Ignore,
    Warn,
    Error,
}

impl Default for OutputValidation {
    fn default() -> Self {
        OutputValidation::Warn
    }
}

impl OutputValidation {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ignore" => Some(OutputValidation::Ignore),
            "warn" => Some(OutputValidation::Warn),
            "error" => Some(OutputValidation::Error),
            _ => None,
        }
    }
}

/// What `process` (or a `post_process` hook) returned, before output
/// coercion (spec.md §4.1 steps 4-6).
#[derive(Debug, Clone)]
pub enum ProcessOutput {
    /// A single value, destined for the agent's sole output field, or for
    /// multi-output validation when the agent declares more than one.
    Value(Value),
    /// `{"state_updates": M}`: an explicit multi-field write intent that
    /// bypasses output-field validation entirely.
    StateUpdates(Map<String, Value>),
    /// `process` returned nothing meaningful (e.g. a unit/None return).
    None,
}

impl ProcessOutput {
    pub fn from_value(v: Value) -> Self {
        if v.is_null() {
            ProcessOutput::None
        } else {
            ProcessOutput::Value(v)
        }
    }
}

/// Identity and infrastructure shared by every agent instance (spec.md §3
/// "Agent instance"). Constructed once at graph assembly; immutable apart
/// from the per-run execution tracker handle, which the runner injects via
/// [`AgentIdentity::set_execution_tracker`] before every `run` call.
pub struct AgentIdentity {
    pub name: String,
    pub agent_type: String,
    pub prompt: String,
    pub context: Value,
    pub input_fields: Vec<InputField>,
    pub output_fields: Vec<String>,
    pub output_validation: OutputValidation,
    tracker: Mutex<Option<Arc<Mutex<ExecutionTracker>>>>,
}

impl AgentIdentity {
    pub fn from_spec(spec: &NodeSpec) -> Self {
        let output_validation = spec
            .context_str("output_validation")
            .and_then(OutputValidation::parse)
            .unwrap_or_default();
        Self {
            name: spec.name.clone(),
            agent_type: spec.agent_type.clone(),
            prompt: spec.prompt.clone(),
            context: spec.context.clone(),
            input_fields: spec.input_fields.clone(),
            output_fields: spec.output_fields.clone(),
            output_validation,
            tracker: Mutex::new(None),
        }
    }

    /// Injects the current run's execution tracker (spec.md §3 "Execution
    /// tracker" lifecycle: "passed into every node via
    /// `set_execution_tracker`").
    pub fn set_execution_tracker(&self, tracker: Arc<Mutex<ExecutionTracker>>) {
        *self.tracker.lock().expect("tracker lock poisoned") = Some(tracker);
    }

    pub fn execution_tracker(&self) -> Option<Arc<Mutex<ExecutionTracker>>> {
        self.tracker.lock().expect("tracker lock poisoned").clone()
    }

    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    pub fn context_get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }

    pub fn context_f64(&self, key: &str) -> Option<f64> {
        self.context.get(key).and_then(Value::as_f64)
    }

    pub fn context_u64(&self, key: &str) -> Option<u64> {
        self.context.get(key).and_then(Value::as_u64)
    }
}

/// The single public operation every compiled node invokes. Implementations
/// provide only business logic ([`process`](Agent::process)) and optional
/// hooks; the fixed pipeline lives in [`lifecycle::run`].
#[async_trait]
pub trait Agent: CapabilityConsumer {
    fn identity(&self) -> &AgentIdentity;

    /// Default is identity: rewrites neither `state` nor `inputs`.
    async fn pre_process(
        &self,
        state: &StateBag,
        inputs: StateBag,
    ) -> Result<(StateBag, StateBag), AgentMapError> {
        Ok((state.clone(), inputs))
    }

    /// The agent's business logic (spec.md §4.1 step 4).
    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError>;

    /// Default is identity. May replace `output` with
    /// `ProcessOutput::StateUpdates` to bypass output-field validation.
    async fn post_process(
        &self,
        _state: &StateBag,
        _inputs: &StateBag,
        output: ProcessOutput,
    ) -> Result<ProcessOutput, AgentMapError> {
        Ok(output)
    }

    /// Re-entry point for [`crate::error::AgentMapError::InterruptSignal`]
    /// resumption (spec.md §4.5): the interrupt call-site behaves as a
    /// function that "returned" `resume_value`. Only
    /// [`builtins::suspend_agent::SuspendAgent`] overrides this; every other
    /// agent's default is unreachable because only `SuspendAgent` raises an
    /// interrupt in the first place.
    async fn resume(&self, resume_value: Value) -> Result<ProcessOutput, AgentMapError> {
        Ok(ProcessOutput::from_value(resume_value))
    }
}

/// A constructed, service-injected, immutable-from-here agent as stored in a
/// [`crate::graph::compiled::CompiledGraph`].
pub type AgentHandle = Arc<dyn Agent>;
