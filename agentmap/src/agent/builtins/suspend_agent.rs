//! `SuspendAgent`: the cooperative suspension point (spec.md §4.5, §8
//! invariant 10). `process` always raises an interrupt — the lifecycle's
//! `run`/`run_resumed` split is what distinguishes "first call" from
//! "resumed call", so the agent itself carries no suspended/resumed state.

use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::graph::interrupt::GraphInterrupt;
use crate::services::capability::CapabilityConsumer;
use crate::state::{reserved, StateBag};
use async_trait::async_trait;
use serde_json::{json, Map, Value};

const THREAD_ID_SNAPSHOT_KEY: &str = "__thread_id_snapshot";
const DEFAULT_THREAD_ID: &str = "default";

pub struct SuspendAgent {
    identity: AgentIdentity,
}

impl SuspendAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self { identity }
    }
}

impl CapabilityConsumer for SuspendAgent {}

#[async_trait]
impl Agent for SuspendAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn pre_process(
        &self,
        state: &StateBag,
        mut inputs: StateBag,
    ) -> Result<(StateBag, StateBag), AgentMapError> {
        let thread_id = state
            .get(reserved::THREAD_ID)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_THREAD_ID)
            .to_string();
        inputs.insert(THREAD_ID_SNAPSHOT_KEY, Value::String(thread_id));
        Ok((state.clone(), inputs))
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let thread_id = inputs
            .get(THREAD_ID_SNAPSHOT_KEY)
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_THREAD_ID)
            .to_string();

        let inputs_map: Map<String, Value> = inputs
            .as_map()
            .iter()
            .filter(|(k, _)| k.as_str() != THREAD_ID_SNAPSHOT_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let context_map = self.identity.context.as_object().cloned().unwrap_or_default();

        Err(AgentMapError::InterruptSignal(GraphInterrupt::new(
            self.identity.name.clone(),
            thread_id,
            inputs_map,
            context_map,
        )))
    }

    /// Invariant 10 (spec.md §8): the second invocation's `process`-return
    /// equivalent is exactly `{resume_value, node_name}`.
    async fn resume(&self, resume_value: Value) -> Result<ProcessOutput, AgentMapError> {
        Ok(ProcessOutput::from_value(json!({
            "resume_value": resume_value,
            "node_name": self.identity.name,
        })))
    }
}
