//! `Summary`: concatenates its projected inputs through a context-supplied
//! template, optionally handing the assembled text to an injected LLM for a
//! final rewrite (spec.md §4.8 "Summary").

use crate::agent::builtins::template::render;
use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::{CapabilityConsumer, CapabilityId, ServiceHandle};
use crate::services::providers::LlmService;
use crate::state::StateBag;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

pub struct SummaryAgent {
    identity: AgentIdentity,
    llm: Option<Arc<dyn LlmService>>,
}

impl SummaryAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity, llm: None }
    }

    fn use_llm(&self) -> bool {
        self.identity
            .context_get("use_llm")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl CapabilityConsumer for SummaryAgent {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        if self.use_llm() {
            vec![CapabilityId::Llm]
        } else {
            Vec::new()
        }
    }

    fn configure_capability(&mut self, capability: &CapabilityId, handle: ServiceHandle) {
        if let (CapabilityId::Llm, ServiceHandle::Llm(llm)) = (capability, handle) {
            self.llm = Some(llm);
        }
    }
}

#[async_trait]
impl Agent for SummaryAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let template = self.identity.context_str("template");
        let rendered = render(template, inputs);

        if !self.use_llm() {
            return Ok(ProcessOutput::from_value(Value::String(rendered)));
        }

        let llm = self.llm.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requests use_llm but no LlmService was injected",
                self.identity.name
            ))
        })?;

        let provider = self.identity.context_str("provider");
        let model = self.identity.context_str("model");
        let messages = vec![json!({"role": "user", "content": rendered})];
        let text = llm
            .call_llm(provider, &messages, model, None, None, None)
            .await
            .map_err(|e| AgentMapError::ProcessError(e.to_string()))?;
        Ok(ProcessOutput::from_value(Value::String(text)))
    }
}
