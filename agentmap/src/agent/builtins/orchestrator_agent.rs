//! `Orchestrator`: picks the best next node out of a candidate set, via an
//! injected [`OrchestratorService`] under one of three strategies
//! (spec.md §4.8 "Orchestrator").

use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::{CapabilityConsumer, CapabilityId, ServiceHandle};
use crate::services::providers::{OrchestratorService, OrchestratorStrategy};
use crate::state::StateBag;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

const DEFAULT_OUTPUT_KEY: &str = "selected_node";
const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;

pub struct OrchestratorAgent {
    identity: AgentIdentity,
    orchestrator: Option<Arc<dyn OrchestratorService>>,
}

impl OrchestratorAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self {
            identity,
            orchestrator: None,
        }
    }

    fn strategy(&self) -> OrchestratorStrategy {
        match self.identity.context_str("strategy") {
            Some("llm") => OrchestratorStrategy::Llm,
            Some("tiered") => OrchestratorStrategy::Tiered,
            _ => OrchestratorStrategy::Algorithm,
        }
    }

    fn confidence_threshold(&self) -> f64 {
        self.identity
            .context_f64("confidence_threshold")
            .unwrap_or(DEFAULT_CONFIDENCE_THRESHOLD)
    }

    fn available_nodes(&self, inputs: &StateBag) -> Result<Vec<String>, AgentMapError> {
        let from_context = self
            .identity
            .context_get("available_nodes")
            .and_then(Value::as_array);
        let from_inputs = inputs.get("available_nodes").and_then(Value::as_array);
        let raw = from_inputs.or(from_context).ok_or_else(|| {
            AgentMapError::ValidationError(format!(
                "node '{}' (Orchestrator) has no available_nodes to choose from",
                self.identity.name
            ))
        })?;
        Ok(raw
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect())
    }

    fn input_text(&self, inputs: &StateBag) -> String {
        if let Some(Value::String(s)) = inputs.get("input") {
            return s.clone();
        }
        if !self.identity.prompt.is_empty() {
            return self.identity.prompt.clone();
        }
        inputs
            .as_map()
            .values()
            .find_map(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

impl CapabilityConsumer for OrchestratorAgent {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        vec![CapabilityId::Orchestrator]
    }

    fn configure_capability(&mut self, capability: &CapabilityId, handle: ServiceHandle) {
        if let (CapabilityId::Orchestrator, ServiceHandle::Orchestrator(service)) = (capability, handle) {
            self.orchestrator = Some(service);
        }
    }
}

#[async_trait]
impl Agent for OrchestratorAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let orchestrator = self.orchestrator.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected OrchestratorService",
                self.identity.name
            ))
        })?;

        let nodes = self.available_nodes(inputs)?;
        let text = self.input_text(inputs);

        let selected = orchestrator
            .select_best_node(&text, &nodes, self.strategy(), self.confidence_threshold())
            .await
            .map_err(|e| AgentMapError::ProcessError(e.to_string()))?;

        let key = self
            .identity
            .output_fields
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_OUTPUT_KEY.to_string());
        Ok(ProcessOutput::Value(Value::Object(
            [(key, Value::String(selected))].into_iter().collect(),
        )))
    }
}
