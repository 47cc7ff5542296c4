//! The trivial built-ins (spec.md §4.8): `Default`, `Echo`, `Failure`,
//! `Input`. None declare capabilities; their entire purpose is to exercise
//! the lifecycle pipeline without any business logic of their own.

use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::CapabilityConsumer;
use crate::state::StateBag;
use async_trait::async_trait;
use serde_json::Value;

/// Returns `inputs` collapsed to a single JSON object, or `Value::Null` if
/// empty — the common "whatever came in, goes back out" shape several
/// trivial built-ins share.
fn inputs_as_value(inputs: &StateBag) -> Value {
    if inputs.is_empty() {
        Value::Null
    } else {
        Value::Object(inputs.as_map().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

/// Produces a constant, context-derived output regardless of input
/// (spec.md §4.8 "Default"). Used as a graph's inert placeholder node.
pub struct DefaultAgent {
    identity: AgentIdentity,
}

impl DefaultAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity }
    }
}

impl CapabilityConsumer for DefaultAgent {}

#[async_trait]
impl Agent for DefaultAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, _inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let mut message = format!("[{}] DefaultAgent executed", self.identity.name);
        if !self.identity.prompt.is_empty() {
            message.push_str(&format!(" with prompt: '{}'", self.identity.prompt));
        }
        Ok(ProcessOutput::from_value(Value::String(message)))
    }
}

/// Returns its projected inputs verbatim (spec.md §4.8 "Echo").
pub struct EchoAgent {
    identity: AgentIdentity,
}

impl EchoAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity }
    }
}

impl CapabilityConsumer for EchoAgent {}

#[async_trait]
impl Agent for EchoAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        // With exactly one declared input/output field, echo that field's
        // own value rather than wrapping it in a single-key object, so
        // `msg -> msg` round-trips the scalar (spec.md §4.8 "Echo").
        if self.identity.input_fields.len() == 1 && self.identity.output_fields.len() == 1 {
            if let Some(only) = inputs.as_map().values().next() {
                return Ok(ProcessOutput::from_value(only.clone()));
            }
        }
        Ok(ProcessOutput::from_value(inputs_as_value(inputs)))
    }
}

/// Always fails `process`, forcing `last_action_success = false` so a graph
/// can exercise its failure-routing edges deliberately (spec.md §4.8
/// "Failure", used in tests and CSV validation fixtures).
pub struct FailureAgent {
    identity: AgentIdentity,
}

impl FailureAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity }
    }
}

impl CapabilityConsumer for FailureAgent {}

#[async_trait]
impl Agent for FailureAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, _inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        Err(AgentMapError::ProcessError(format!(
            "node '{}' is a Failure agent",
            self.identity.name
        )))
    }
}

/// Passes the prompt text through as its sole output, standing in for a
/// point where external input enters the graph (spec.md §4.8 "Input").
pub struct InputAgent {
    identity: AgentIdentity,
}

impl InputAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity }
    }
}

impl CapabilityConsumer for InputAgent {}

#[async_trait]
impl Agent for InputAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        if !self.identity.prompt.is_empty() {
            return Ok(ProcessOutput::from_value(Value::String(self.identity.prompt.clone())));
        }
        Ok(ProcessOutput::from_value(inputs_as_value(inputs)))
    }
}
