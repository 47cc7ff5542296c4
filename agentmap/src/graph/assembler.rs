//! The Graph Assembly Engine (spec.md §4.3): turns a parsed node set into a
//! [`CompiledGraph`] bundle. Node order in the input defines the entry
//! point (the first node, unless one carries `"start": true` in its
//! context) — the same "declaration order is significant" rule a CSV-row
//! graph definition implies.

use crate::agent::factory::AgentFactory;
use crate::agent::AgentHandle;
use crate::error::AgentMapError;
use crate::graph::compiled::{CompiledGraph, CompiledNode};
use crate::graph::node_spec::NodeSpec;
use crate::services::registry::ServiceRegistry;
use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum AssemblyError {
    #[error("{0}")]
    Invalid(String),
    #[error("edge from '{node}' targets unknown node '{target}'")]
    UnknownEdgeTarget { node: String, target: String },
    #[error("no nodes to assemble")]
    EmptyGraph,
    #[error("duplicate node name '{0}'")]
    DuplicateNode(String),
    #[error("workflow '{0}' is referenced from a cycle of nested sub-graphs")]
    CyclicSubgraph(String),
    #[error("workflow '{0}' could not be resolved")]
    UnknownWorkflow(String),
}

impl From<AgentMapError> for AssemblyError {
    fn from(e: AgentMapError) -> Self {
        AssemblyError::Invalid(e.to_string())
    }
}

/// Resolves a named workflow's node set, so nested `GraphAgent` references
/// can be walked for cycle detection before any sub-graph actually runs
/// (spec.md §9 "Cycles in nested sub-graphs").
pub trait WorkflowSource {
    fn node_specs(&self, workflow_name: &str) -> Result<Vec<NodeSpec>, AssemblyError>;
}

fn source_hash(name: &str, nodes: &[NodeSpec]) -> u64 {
    let mut hasher = DefaultHasher::new();
    name.hash(&mut hasher);
    for node in nodes {
        node.name.hash(&mut hasher);
        node.agent_type.hash(&mut hasher);
        node.prompt.hash(&mut hasher);
        node.context.to_string().hash(&mut hasher);
        node.output_fields.hash(&mut hasher);
        format!("{:?}", node.input_fields).hash(&mut hasher);
        format!("{:?}", node.edges).hash(&mut hasher);
    }
    hasher.finish()
}

/// Builds [`CompiledGraph`]s from parsed node sets, injecting services from
/// a shared [`ServiceRegistry`] via each agent's declared capabilities.
pub struct GraphAssembler<'a> {
    factory: &'a AgentFactory,
    registry: &'a ServiceRegistry,
}

impl<'a> GraphAssembler<'a> {
    pub fn new(factory: &'a AgentFactory, registry: &'a ServiceRegistry) -> Self {
        Self { factory, registry }
    }

    /// Assembles a single graph with no nested-workflow cycle checking
    /// (spec.md §4.3 steps 1-5). Use [`GraphAssembler::assemble_workflow`]
    /// when the node set may contain `GraphAgent` nodes whose sub-graphs
    /// need validating too.
    pub fn assemble(&self, name: &str, nodes: Vec<NodeSpec>) -> Result<CompiledGraph, AssemblyError> {
        if nodes.is_empty() {
            return Err(AssemblyError::EmptyGraph);
        }

        let entry_point = nodes
            .iter()
            .find(|n| n.context_get("start").and_then(serde_json::Value::as_bool) == Some(true))
            .unwrap_or(&nodes[0])
            .name
            .clone();

        let hash = source_hash(name, &nodes);

        let mut node_map: HashMap<String, CompiledNode> = HashMap::with_capacity(nodes.len());
        let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();

        for spec in &nodes {
            if node_map.contains_key(&spec.name) {
                return Err(AssemblyError::DuplicateNode(spec.name.clone()));
            }

            for target in [&spec.edges.success, &spec.edges.failure, &spec.edges.default]
                .into_iter()
                .flatten()
                .filter_map(|e| e.as_literal())
            {
                if !names.iter().any(|n| n == target) {
                    return Err(AssemblyError::UnknownEdgeTarget {
                        node: spec.name.clone(),
                        target: target.to_string(),
                    });
                }
            }

            let agent: AgentHandle = self.instantiate(spec)?;

            node_map.insert(
                spec.name.clone(),
                CompiledNode {
                    name: spec.name.clone(),
                    agent,
                    edges: spec.edges.clone(),
                },
            );
        }

        Ok(CompiledGraph {
            name: name.to_string(),
            node_map,
            entry_point,
            source_hash: hash,
        })
    }

    /// Assembles `workflow_name` out of `source`, recursively walking every
    /// `GraphAgent` node's referenced sub-workflow purely to detect cycles;
    /// the sub-graph bundles themselves are resolved lazily at run time
    /// through each `GraphAgent`'s injected `GraphBundleService`, not
    /// pre-compiled here.
    pub fn assemble_workflow(
        &self,
        source: &dyn WorkflowSource,
        workflow_name: &str,
    ) -> Result<CompiledGraph, AssemblyError> {
        let mut visiting = Vec::new();
        self.assemble_workflow_inner(source, workflow_name, &mut visiting)
    }

    fn assemble_workflow_inner(
        &self,
        source: &dyn WorkflowSource,
        workflow_name: &str,
        visiting: &mut Vec<String>,
    ) -> Result<CompiledGraph, AssemblyError> {
        if visiting.iter().any(|n| n == workflow_name) {
            return Err(AssemblyError::CyclicSubgraph(workflow_name.to_string()));
        }
        visiting.push(workflow_name.to_string());

        let nodes = source.node_specs(workflow_name)?;
        for node in &nodes {
            if node.agent_type == "GraphAgent" {
                if let Some(child_name) = node.context_str("workflow").or_else(|| node.context_str("graph")) {
                    self.assemble_workflow_inner(source, child_name, visiting)?;
                }
            }
        }

        visiting.pop();
        self.assemble(workflow_name, nodes)
    }

    /// Step 1: construct the agent instance, then configure every
    /// capability it declares from a matching registered provider. A
    /// capability with no registered provider is skipped, not a hard
    /// failure — an agent that genuinely requires it surfaces a
    /// `ConfigurationError` the first time it runs without it (spec.md
    /// §4.2 "Configuration algorithm").
    fn instantiate(&self, spec: &NodeSpec) -> Result<AgentHandle, AssemblyError> {
        let mut agent = self.factory.create(spec)?;

        for capability_id in agent.declared_capabilities() {
            if let Some(provider_factory) = self.registry.get_provider(&capability_id) {
                agent.configure_capability(&capability_id, provider_factory());
            } else {
                tracing::warn!(
                    node = %spec.name,
                    capability = ?capability_id,
                    "no provider registered for declared capability"
                );
            }
        }

        Ok(Arc::from(agent))
    }
}
