//! `GraphAgent`: invokes a compiled sub-graph as a single node (spec.md
//! §4.4 "Sub-graph composition"): projects the parent state into the
//! child's initial state, drives the child graph to completion through an
//! injected [`GraphRunnerService`], nests its [`ExecutionSummary`] under
//! this node's own tracker, and maps the child's final state back.
//!
//! The compiled bundle itself is resolved per call through an injected
//! [`GraphBundleService`] rather than stashed on the agent at assembly
//! time: `GraphBundleService::get_bundle` already exists as exactly the
//! "resolve a compiled graph by name" capability this needs, so there is no
//! reason to invent a second, agent-specific wiring path for it.

use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::{CapabilityConsumer, CapabilityId, ServiceHandle};
use crate::services::providers::{GraphBundleService, GraphRunnerService};
use crate::state::{reserved, StateBag};
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

const PARENT_STATE_SNAPSHOT_KEY: &str = "__graph_agent_parent_state";

pub struct GraphAgent {
    identity: AgentIdentity,
    bundle_service: Option<Arc<dyn GraphBundleService>>,
    runner: Option<Arc<dyn GraphRunnerService>>,
}

impl GraphAgent {
    pub fn new(identity: AgentIdentity) -> Self {
        Self {
            identity,
            bundle_service: None,
            runner: None,
        }
    }

    fn workflow_name(&self) -> Result<&str, AgentMapError> {
        self.identity
            .context_str("workflow")
            .or_else(|| self.identity.context_str("graph"))
            .ok_or_else(|| {
                AgentMapError::ValidationError(format!(
                    "node '{}' (GraphAgent) has no workflow/graph name configured",
                    self.identity.name
                ))
            })
    }

    /// Builds the sub-graph's initial state (spec.md §4.4 input mapping):
    /// when `input_fields` is empty the entire parent state passes through;
    /// otherwise the already-projected `inputs` (function/field mapping,
    /// handled generically by [`crate::state::adapter::get_inputs`]) become
    /// the child's starting state directly.
    fn initial_state(&self, inputs: &StateBag) -> StateBag {
        if let Some(Value::Object(snapshot)) = inputs.get(PARENT_STATE_SNAPSHOT_KEY) {
            let mut map: Map<String, Value> = snapshot.clone();
            map.remove(reserved::EXECUTION_SUMMARY);
            map.remove(reserved::SUBGRAPH_BUNDLES);
            return StateBag::from_map(map.into_iter().collect());
        }
        let mut map: Map<String, Value> = inputs
            .as_map()
            .iter()
            .filter(|(k, _)| k.as_str() != PARENT_STATE_SNAPSHOT_KEY)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        map.remove(reserved::EXECUTION_SUMMARY);
        map.remove(reserved::SUBGRAPH_BUNDLES);
        StateBag::from_map(map.into_iter().collect())
    }

    /// Maps the child's final state back onto the parent (spec.md §4.4
    /// output mapping): `target=source` renames, a bare name copies the
    /// same key, and an empty `output_fields` list passes the whole child
    /// state through (minus the reserved keys a sub-graph never leaks).
    fn map_outputs(&self, final_state: &StateBag) -> Map<String, Value> {
        if self.identity.output_fields.is_empty() {
            let mut map: Map<String, Value> = final_state
                .as_map()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            map.remove(reserved::EXECUTION_SUMMARY);
            map.remove(reserved::SUBGRAPH_BUNDLES);
            return map;
        }

        let mut map = Map::new();
        for field in &self.identity.output_fields {
            let (target, source) = match field.split_once('=') {
                Some((t, s)) => (t.trim(), s.trim()),
                None => (field.as_str(), field.as_str()),
            };
            map.insert(
                target.to_string(),
                final_state.get(source).cloned().unwrap_or(Value::Null),
            );
        }
        map
    }
}

impl CapabilityConsumer for GraphAgent {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        vec![CapabilityId::GraphBundle, CapabilityId::GraphRunner]
    }

    fn configure_capability(&mut self, capability: &CapabilityId, handle: ServiceHandle) {
        match (capability, handle) {
            (CapabilityId::GraphBundle, ServiceHandle::GraphBundle(service)) => {
                self.bundle_service = Some(service);
            }
            (CapabilityId::GraphRunner, ServiceHandle::GraphRunner(service)) => {
                self.runner = Some(service);
            }
            _ => {}
        }
    }
}

#[async_trait]
impl Agent for GraphAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn pre_process(
        &self,
        state: &StateBag,
        mut inputs: StateBag,
    ) -> Result<(StateBag, StateBag), AgentMapError> {
        if self.identity.input_fields.is_empty() {
            let snapshot: Map<String, Value> = state
                .as_map()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect();
            inputs.insert(PARENT_STATE_SNAPSHOT_KEY, Value::Object(snapshot));
        }
        Ok((state.clone(), inputs))
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let bundle_service = self.bundle_service.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected GraphBundleService",
                self.identity.name
            ))
        })?;
        let runner = self.runner.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected GraphRunnerService",
                self.identity.name
            ))
        })?;

        let workflow_name = self.workflow_name()?;
        let bundle = bundle_service
            .get_bundle(workflow_name)
            .await
            .map_err(|e| AgentMapError::ConfigurationError(e.to_string()))?;

        let child_state = self.initial_state(inputs);

        // `parent_tracker` is left `None`: nesting the child's summary onto
        // this node's own tracker happens synchronously below instead of by
        // threading a live tracker reference across the runner's await
        // points (the tracker's lock is a plain `std::sync::Mutex`, so a
        // held guard would make this future non-`Send`).
        let (final_state, summary) = runner
            .run(&bundle, child_state, true, None)
            .await
            .map_err(|e| AgentMapError::ProcessError(e.to_string()))?;

        if let Some(tracker) = self.identity.execution_tracker() {
            tracker
                .lock()
                .expect("tracker lock poisoned")
                .record_subgraph_execution(&self.identity.name, summary.clone());
        }

        let mut updates = self.map_outputs(&final_state);
        updates.insert(reserved::LAST_ACTION_SUCCESS.to_string(), json!(summary.graph_success));

        Ok(ProcessOutput::StateUpdates(updates))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::compiled::CompiledGraph;
    use crate::graph::edges::EdgeMap;
    use crate::graph::node_spec::NodeSpec;
    use crate::services::providers::ProviderError;
    use crate::tracker::ExecutionSummary;
    use std::collections::HashMap;

    fn spec(input_fields: Vec<crate::graph::node_spec::InputField>, output_fields: Vec<String>) -> NodeSpec {
        NodeSpec {
            name: "sub".to_string(),
            agent_type: "GraphAgent".to_string(),
            prompt: String::new(),
            context: json!({"workflow": "child_flow"}),
            input_fields,
            output_fields,
            edges: EdgeMap::default(),
        }
    }

    struct StubBundleService;
    #[async_trait::async_trait]
    impl GraphBundleService for StubBundleService {
        async fn get_bundle(&self, workflow_name: &str) -> Result<Arc<CompiledGraph>, ProviderError> {
            assert_eq!(workflow_name, "child_flow");
            Ok(Arc::new(CompiledGraph {
                name: workflow_name.to_string(),
                node_map: HashMap::new(),
                entry_point: "start".to_string(),
                source_hash: 0,
            }))
        }
    }

    struct StubRunner {
        graph_success: bool,
    }
    #[async_trait::async_trait]
    impl GraphRunnerService for StubRunner {
        async fn run(
            &self,
            _bundle: &CompiledGraph,
            initial_state: StateBag,
            is_subgraph: bool,
            _parent_tracker: Option<&crate::tracker::ExecutionTracker>,
        ) -> Result<(StateBag, ExecutionSummary), ProviderError> {
            assert!(is_subgraph);
            let mut final_state = initial_state;
            final_state.insert("child_out", json!("done"));
            Ok((
                final_state,
                ExecutionSummary {
                    run_id: "r".to_string(),
                    path: vec![],
                    node_records: vec![],
                    sub_graph_summaries: HashMap::new(),
                    graph_success: self.graph_success,
                },
            ))
        }
    }

    #[tokio::test]
    async fn empty_input_fields_passes_whole_parent_state_through() {
        let mut agent = GraphAgent::new(AgentIdentity::from_spec(&spec(vec![], vec![])));
        agent.configure_capability(
            &CapabilityId::GraphBundle,
            ServiceHandle::GraphBundle(Arc::new(StubBundleService)),
        );
        agent.configure_capability(
            &CapabilityId::GraphRunner,
            ServiceHandle::GraphRunner(Arc::new(StubRunner { graph_success: true })),
        );

        let mut state = StateBag::new();
        state.insert("parent_field", json!("hi"));
        let (_, inputs) = agent.pre_process(&state, StateBag::new()).await.unwrap();
        let out = agent.process(&inputs).await.unwrap();

        match out {
            ProcessOutput::StateUpdates(m) => {
                assert_eq!(m.get("parent_field").unwrap(), "hi");
                assert_eq!(m.get("child_out").unwrap(), "done");
                assert_eq!(m.get(reserved::LAST_ACTION_SUCCESS).unwrap(), true);
            }
            _ => panic!("expected state updates"),
        }
    }

    #[tokio::test]
    async fn output_fields_rename_from_child_state() {
        let mut agent = GraphAgent::new(AgentIdentity::from_spec(&spec(
            vec![],
            vec!["result=child_out".to_string()],
        )));
        agent.configure_capability(
            &CapabilityId::GraphBundle,
            ServiceHandle::GraphBundle(Arc::new(StubBundleService)),
        );
        agent.configure_capability(
            &CapabilityId::GraphRunner,
            ServiceHandle::GraphRunner(Arc::new(StubRunner { graph_success: false })),
        );

        let (_, inputs) = agent.pre_process(&StateBag::new(), StateBag::new()).await.unwrap();
        let out = agent.process(&inputs).await.unwrap();

        match out {
            ProcessOutput::StateUpdates(m) => {
                assert_eq!(m.get("result").unwrap(), "done");
                assert!(!m.contains_key("child_out"));
                assert_eq!(m.get(reserved::LAST_ACTION_SUCCESS).unwrap(), false);
            }
            _ => panic!("expected state updates"),
        }
    }

    #[tokio::test]
    async fn missing_workflow_name_is_validation_error() {
        let mut spec = spec(vec![], vec![]);
        spec.context = json!({});
        let agent = GraphAgent::new(AgentIdentity::from_spec(&spec));
        let result = agent.process(&StateBag::new()).await;
        assert!(matches!(result, Err(AgentMapError::ValidationError(_))));
    }
}
