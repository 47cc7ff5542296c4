//! `LLM`: direct single-call completion, or routing mode where the
//! provider itself picks a model/path from `routing_context`; optionally
//! accumulates a conversation history under a configurable state key
//! (spec.md §4.8 "LLM").

use crate::agent::builtins::template::render;
use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::{CapabilityConsumer, CapabilityId, ServiceHandle};
use crate::services::providers::LlmService;
use crate::state::StateBag;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const MEMORY_SNAPSHOT_KEY: &str = "__llm_memory_snapshot";
const DEFAULT_MEMORY_KEY: &str = "conversation_history";
const DEFAULT_OUTPUT_KEY: &str = "response";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Direct,
    Routing,
}

pub struct LlmAgent {
    identity: AgentIdentity,
    llm: Option<Arc<dyn LlmService>>,
}

impl LlmAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity, llm: None }
    }

    fn mode(&self) -> Mode {
        match self.identity.context_str("mode") {
            Some("routing") => Mode::Routing,
            _ => Mode::Direct,
        }
    }

    fn memory_key(&self) -> Option<&str> {
        self.identity.context_str("memory_key").or({
            if self
                .identity
                .context_get("memory")
                .and_then(Value::as_bool)
                .unwrap_or(false)
            {
                Some(DEFAULT_MEMORY_KEY)
            } else {
                None
            }
        })
    }

    fn memory_limit(&self) -> Option<usize> {
        self.identity.context_u64("memory_limit").map(|n| n as usize)
    }

    fn output_key(&self) -> String {
        self.identity
            .output_fields
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_OUTPUT_KEY.to_string())
    }
}

impl CapabilityConsumer for LlmAgent {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        vec![CapabilityId::Llm]
    }

    fn configure_capability(&mut self, capability: &CapabilityId, handle: ServiceHandle) {
        if let (CapabilityId::Llm, ServiceHandle::Llm(llm)) = (capability, handle) {
            self.llm = Some(llm);
        }
    }
}

#[async_trait]
impl Agent for LlmAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    /// Smuggles the existing conversation history from the full state (not
    /// just the projected inputs) in under a fixed internal key, since
    /// `process` only ever sees `inputs` (spec.md §4.1 "Pre-process").
    async fn pre_process(
        &self,
        state: &StateBag,
        mut inputs: StateBag,
    ) -> Result<(StateBag, StateBag), AgentMapError> {
        if let Some(key) = self.memory_key() {
            let history = state.get(key).cloned().unwrap_or_else(|| json!([]));
            inputs.insert(MEMORY_SNAPSHOT_KEY, history);
        }
        Ok((state.clone(), inputs))
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let llm = self.llm.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected LlmService",
                self.identity.name
            ))
        })?;

        let template = self.identity.context_str("template").or({
            if self.identity.prompt.is_empty() {
                None
            } else {
                Some(self.identity.prompt.as_str())
            }
        });
        let user_text = render(template, inputs);

        let history: Vec<Value> = inputs
            .get(MEMORY_SNAPSHOT_KEY)
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut messages = history.clone();
        messages.push(json!({"role": "user", "content": user_text}));

        let provider = self.identity.context_str("provider");
        let model = self.identity.context_str("model");
        let temperature = self.identity.context_f64("temperature");
        let max_tokens = self.identity.context_u64("max_tokens").map(|n| n as u32);
        let routing_context = match self.mode() {
            Mode::Routing => Some(self.identity.context.clone()),
            Mode::Direct => None,
        };

        let response = llm
            .call_llm(
                provider,
                &messages,
                model,
                temperature,
                max_tokens,
                routing_context.as_ref(),
            )
            .await
            .map_err(|e| AgentMapError::ProcessError(e.to_string()))?;

        let mut updates = Map::new();
        updates.insert(self.output_key(), Value::String(response.clone()));

        if let Some(key) = self.memory_key() {
            let mut updated_history = history;
            updated_history.push(json!({"role": "user", "content": user_text}));
            updated_history.push(json!({"role": "assistant", "content": response}));
            if let Some(limit) = self.memory_limit() {
                if updated_history.len() > limit {
                    let drop = updated_history.len() - limit;
                    updated_history.drain(0..drop);
                }
            }
            updates.insert(key.to_string(), Value::Array(updated_history));
        }

        Ok(ProcessOutput::StateUpdates(updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::EdgeMap;
    use crate::graph::node_spec::NodeSpec;
    use crate::services::providers::ProviderError;

    fn spec(context: Value) -> NodeSpec {
        NodeSpec {
            name: "llm".to_string(),
            agent_type: "LLM".to_string(),
            prompt: "say hi to {name}".to_string(),
            context,
            input_fields: vec![],
            output_fields: vec!["reply".to_string()],
            edges: EdgeMap::default(),
        }
    }

    struct EchoingLlm;
    #[async_trait::async_trait]
    impl LlmService for EchoingLlm {
        async fn call_llm(
            &self,
            _provider: Option<&str>,
            messages: &[Value],
            _model: Option<&str>,
            _temperature: Option<f64>,
            _max_tokens: Option<u32>,
            _routing_context: Option<&Value>,
        ) -> Result<String, ProviderError> {
            Ok(format!("reply to: {}", messages.last().unwrap()["content"]))
        }
    }

    #[tokio::test]
    async fn direct_mode_writes_declared_output_field() {
        let mut agent = LlmAgent::new(AgentIdentity::from_spec(&spec(json!({}))));
        agent.configure_capability(&CapabilityId::Llm, ServiceHandle::Llm(Arc::new(EchoingLlm)));

        let state = StateBag::new();
        let mut inputs = StateBag::new();
        inputs.insert("name", json!("Ada"));
        let (state2, inputs2) = agent.pre_process(&state, inputs).await.unwrap();
        let out = agent.process(&inputs2).await.unwrap();
        let _ = state2;

        match out {
            ProcessOutput::StateUpdates(m) => {
                assert_eq!(m.get("reply").unwrap(), "reply to: say hi to Ada");
                assert!(!m.contains_key("conversation_history"));
            }
            _ => panic!("expected state updates"),
        }
    }

    #[tokio::test]
    async fn memory_accumulates_and_truncates() {
        let mut agent = LlmAgent::new(AgentIdentity::from_spec(&spec(
            json!({"memory_key": "history", "memory_limit": 2}),
        )));
        agent.configure_capability(&CapabilityId::Llm, ServiceHandle::Llm(Arc::new(EchoingLlm)));

        let mut state = StateBag::new();
        state.insert(
            "history",
            json!([{"role": "user", "content": "old"}, {"role": "assistant", "content": "old reply"}]),
        );
        let mut inputs = StateBag::new();
        inputs.insert("name", json!("Bo"));
        let (_, inputs2) = agent.pre_process(&state, inputs).await.unwrap();
        let out = agent.process(&inputs2).await.unwrap();

        match out {
            ProcessOutput::StateUpdates(m) => {
                let history = m.get("history").unwrap().as_array().unwrap();
                assert_eq!(history.len(), 2); // truncated to memory_limit
            }
            _ => panic!("expected state updates"),
        }
    }

    #[tokio::test]
    async fn missing_llm_is_configuration_error() {
        let agent = LlmAgent::new(AgentIdentity::from_spec(&spec(json!({}))));
        let result = agent.process(&StateBag::new()).await;
        assert!(matches!(result, Err(AgentMapError::ConfigurationError(_))));
    }
}
