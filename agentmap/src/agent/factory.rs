//! Agent construction keyed on `agent_type` (spec.md §3 "Agent instance":
//! "Created by a factory keyed on `agent_type`").

use crate::agent::Agent;
use crate::error::AgentMapError;
use crate::graph::node_spec::NodeSpec;
use dashmap::DashMap;
use std::sync::Arc;

/// `fn(spec) -> Box<dyn Agent>`, one per `agent_type` string.
pub type AgentConstructor = Arc<dyn Fn(&NodeSpec) -> Result<Box<dyn Agent>, AgentMapError> + Send + Sync>;

/// Maps `agent_type` to a constructor. The assembler calls
/// [`AgentFactory::create`] once per CSV row at graph-build time (spec.md
/// §4.3 step 1).
#[derive(Default)]
pub struct AgentFactory {
    constructors: DashMap<String, AgentConstructor>,
}

impl AgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the constructor for `agent_type`.
    pub fn register(&self, agent_type: impl Into<String>, constructor: AgentConstructor) {
        self.constructors.insert(agent_type.into(), constructor);
    }

    pub fn create(&self, spec: &NodeSpec) -> Result<Box<dyn Agent>, AgentMapError> {
        let constructor = self.constructors.get(&spec.agent_type).ok_or_else(|| {
            AgentMapError::ValidationError(format!(
                "unknown agent_type '{}' for node '{}'",
                spec.agent_type, spec.name
            ))
        })?;
        constructor(spec)
    }

    pub fn is_registered(&self, agent_type: &str) -> bool {
        self.constructors.contains_key(agent_type)
    }

    /// An [`AgentFactory`] pre-loaded with every built-in agent type
    /// (spec.md §4.8).
    pub fn with_builtins() -> Self {
        let factory = Self::new();
        crate::agent::builtins::register_builtins(&factory);
        factory
    }
}
