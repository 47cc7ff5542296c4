//! The cooperative suspension signal raised by a [`SuspendAgent`](crate::agent::builtins::suspend_agent::SuspendAgent).
//!
//! Grounded on the graph-interrupt pattern used throughout the engine:
//! a node signals suspension by returning an error variant rather than by
//! a language-level exception, and the outer driver matches on it to
//! persist a checkpoint and return control to the caller (spec.md §4.5).

use serde_json::{Map, Value};
use std::fmt;

/// The structured interrupt payload: `{type: "suspend", node_name, thread_id,
/// inputs, context}` (spec.md §4.5).
#[derive(Debug, Clone, PartialEq)]
pub struct Interrupt {
    pub node_name: String,
    pub thread_id: String,
    pub inputs: Map<String, Value>,
    pub context: Map<String, Value>,
}

impl Interrupt {
    pub fn new(
        node_name: impl Into<String>,
        thread_id: impl Into<String>,
        inputs: Map<String, Value>,
        context: Map<String, Value>,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            thread_id: thread_id.into(),
            inputs,
            context,
        }
    }
}

impl fmt::Display for Interrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "suspend at node '{}' (thread {})",
            self.node_name, self.thread_id
        )
    }
}

/// Wraps [`Interrupt`] so it can be carried by [`crate::error::AgentMapError`]
/// without that enum depending on the full agent module tree.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphInterrupt(pub Interrupt);

impl GraphInterrupt {
    pub fn new(
        node_name: impl Into<String>,
        thread_id: impl Into<String>,
        inputs: Map<String, Value>,
        context: Map<String, Value>,
    ) -> Self {
        Self(Interrupt::new(node_name, thread_id, inputs, context))
    }

    pub fn interrupt(&self) -> &Interrupt {
        &self.0
    }
}

impl fmt::Display for GraphInterrupt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<Interrupt> for GraphInterrupt {
    fn from(i: Interrupt) -> Self {
        GraphInterrupt(i)
    }
}
