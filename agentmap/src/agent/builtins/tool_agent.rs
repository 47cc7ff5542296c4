//! `Tool`: executes a single configured tool directly; when more than one
//! candidate tool is configured, delegates the choice to an injected
//! [`ToolSelectionService`] before executing (spec.md §4.8 "Tool").
//!
//! Tool execution itself is modelled as invoking a named mapping function
//! resolved through [`FunctionResolutionService`] — the same mechanism an
//! agent's `func:NAME` input field uses — rather than inventing a second
//! callable contract.

use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::{CapabilityConsumer, CapabilityId, ServiceHandle};
use crate::services::providers::{FunctionResolutionService, ToolSelectionService};
use crate::state::StateBag;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct ToolAgent {
    identity: AgentIdentity,
    function_resolution: Option<Arc<dyn FunctionResolutionService>>,
    tool_selection: Option<Arc<dyn ToolSelectionService>>,
}

impl ToolAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self {
            identity,
            function_resolution: None,
            tool_selection: None,
        }
    }

    fn candidate_tools(&self) -> Vec<String> {
        if let Some(list) = self.identity.context_get("tools").and_then(Value::as_array) {
            return list.iter().filter_map(Value::as_str).map(str::to_string).collect();
        }
        if let Some(one) = self.identity.context_str("tool") {
            return vec![one.to_string()];
        }
        Vec::new()
    }

    fn input_text(&self, inputs: &StateBag) -> String {
        if let Some(Value::String(s)) = inputs.get("input") {
            return s.clone();
        }
        inputs
            .as_map()
            .values()
            .find_map(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    }
}

impl CapabilityConsumer for ToolAgent {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        let mut caps = vec![CapabilityId::FunctionResolution];
        if self.candidate_tools().len() > 1 {
            caps.push(CapabilityId::ToolSelection);
        }
        caps
    }

    fn configure_capability(&mut self, capability: &CapabilityId, handle: ServiceHandle) {
        match (capability, handle) {
            (CapabilityId::FunctionResolution, ServiceHandle::FunctionResolution(service)) => {
                self.function_resolution = Some(service);
            }
            (CapabilityId::ToolSelection, ServiceHandle::ToolSelection(service)) => {
                self.tool_selection = Some(service);
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Agent for ToolAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let tools = self.candidate_tools();
        if tools.is_empty() {
            return Err(AgentMapError::ValidationError(format!(
                "node '{}' (Tool) has no configured tool(s)",
                self.identity.name
            )));
        }

        let selected = if tools.len() == 1 {
            tools[0].clone()
        } else {
            let selector = self.tool_selection.as_ref().ok_or_else(|| {
                AgentMapError::ConfigurationError(format!(
                    "node '{}' has multiple candidate tools but no ToolSelectionService was injected",
                    self.identity.name
                ))
            })?;
            selector
                .select_tool(&self.input_text(inputs), &tools)
                .await
                .map_err(|e| AgentMapError::ProcessError(e.to_string()))?
        };

        let resolver = self.function_resolution.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected FunctionResolutionService",
                self.identity.name
            ))
        })?;
        let tool_fn = resolver.import_mapping_function(&selected).ok_or_else(|| {
            AgentMapError::ConfigurationError(format!("tool '{selected}' did not resolve to a callable"))
        })?;

        let result = tool_fn(inputs);
        Ok(ProcessOutput::Value(Value::Object(
            result.as_map().iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::EdgeMap;
    use crate::graph::node_spec::NodeSpec;
    use crate::services::providers::{MappingFn, ProviderError};
    use serde_json::json;

    fn spec(context: Value) -> NodeSpec {
        NodeSpec {
            name: "tool".to_string(),
            agent_type: "Tool".to_string(),
            prompt: String::new(),
            context,
            input_fields: vec![],
            output_fields: vec!["result".to_string()],
            edges: EdgeMap::default(),
        }
    }

    struct StubFunctionResolution;
    impl FunctionResolutionService for StubFunctionResolution {
        fn import_routing_function(&self, _name: &str) -> Option<crate::graph::edges::RoutingFn> {
            None
        }
        fn import_mapping_function(&self, name: &str) -> Option<MappingFn> {
            if name == "lookup" {
                Some(Arc::new(|inputs: &StateBag| {
                    let mut out = StateBag::new();
                    out.insert("result", json!(format!("looked up {:?}", inputs.get("input"))));
                    out
                }))
            } else {
                None
            }
        }
    }

    struct StubToolSelection;
    #[async_trait::async_trait]
    impl ToolSelectionService for StubToolSelection {
        async fn select_tool(
            &self,
            _input_text: &str,
            candidate_tool_names: &[String],
        ) -> Result<String, ProviderError> {
            Ok(candidate_tool_names[0].clone())
        }
    }

    #[tokio::test]
    async fn single_tool_executes_directly() {
        let mut agent = ToolAgent::new(AgentIdentity::from_spec(&spec(json!({"tool": "lookup"}))));
        agent.configure_capability(
            &CapabilityId::FunctionResolution,
            ServiceHandle::FunctionResolution(Arc::new(StubFunctionResolution)),
        );
        let mut inputs = StateBag::new();
        inputs.insert("input", json!("x"));
        let out = agent.process(&inputs).await.unwrap();
        assert!(matches!(out, ProcessOutput::Value(Value::Object(_))));
    }

    #[tokio::test]
    async fn multiple_tools_require_selection_service() {
        let agent = ToolAgent::new(AgentIdentity::from_spec(&spec(
            json!({"tools": ["lookup", "other"]}),
        )));
        let result = agent.process(&StateBag::new()).await;
        assert!(matches!(result, Err(AgentMapError::ConfigurationError(_))));
    }

    #[tokio::test]
    async fn multiple_tools_delegates_to_selector() {
        let mut agent = ToolAgent::new(AgentIdentity::from_spec(&spec(
            json!({"tools": ["lookup", "other"]}),
        )));
        agent.configure_capability(
            &CapabilityId::FunctionResolution,
            ServiceHandle::FunctionResolution(Arc::new(StubFunctionResolution)),
        );
        agent.configure_capability(
            &CapabilityId::ToolSelection,
            ServiceHandle::ToolSelection(Arc::new(StubToolSelection)),
        );
        let out = agent.process(&StateBag::new()).await.unwrap();
        assert!(matches!(out, ProcessOutput::Value(Value::Object(_))));
    }
}
