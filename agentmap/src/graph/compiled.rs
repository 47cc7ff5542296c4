//! The compiled graph bundle (spec.md §3 "Compiled graph bundle"): the
//! immutable artifact the Graph Assembly Engine produces and the runner
//! drives.

use crate::agent::AgentHandle;
use crate::graph::edges::EdgeMap;
use std::collections::HashMap;

/// One compiled node: the agent instance plus its resolved edge map.
/// Immutable after assembly (spec.md §3 "Node (compiled)").
pub struct CompiledNode {
    pub name: String,
    pub agent: AgentHandle,
    pub edges: EdgeMap,
}

/// `{name, node_map, entry_point, source_hash}` (spec.md §3). Immutable.
pub struct CompiledGraph {
    pub name: String,
    pub node_map: HashMap<String, CompiledNode>,
    pub entry_point: String,
    /// Hash of the source node set, used for cache keying (spec.md §4.3 step 5).
    pub source_hash: u64,
}

impl CompiledGraph {
    pub fn node(&self, name: &str) -> Option<&CompiledNode> {
        self.node_map.get(name)
    }

    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }
}
