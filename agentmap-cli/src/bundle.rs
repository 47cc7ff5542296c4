//! Persisted compiled-bundle shape (spec.md §6 "Persisted state":
//! `{compiled_graph, node_registry, source_hash}`, with an optional sibling
//! `.src` text file for inspection).
//!
//! The core's [`agentmap::CompiledGraph`] holds live `Arc<dyn Agent>`
//! trait objects that cannot be serialized, so what gets written to disk is
//! the node registry the assembler compiled from -- enough to recompile the
//! identical bundle later (and to compare `source_hash` for cache-hit
//! detection) without re-reading the source CSV.

use agentmap::graph::edges::{EdgeMap, EdgeValue};
use agentmap::{InputField, NodeSpec};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize)]
struct SerializedInputField {
    kind: String,
    name: Option<String>,
    target: Option<String>,
    source: Option<String>,
}

impl From<&InputField> for SerializedInputField {
    fn from(f: &InputField) -> Self {
        match f {
            InputField::Name(n) => Self {
                kind: "name".to_string(),
                name: Some(n.clone()),
                target: None,
                source: None,
            },
            InputField::Mapped { target, source } => Self {
                kind: "mapped".to_string(),
                name: None,
                target: Some(target.clone()),
                source: Some(source.clone()),
            },
            InputField::Func(name) => Self {
                kind: "func".to_string(),
                name: Some(name.clone()),
                target: None,
                source: None,
            },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SerializedEdgeValue {
    func: bool,
    target: String,
}

impl From<&EdgeValue> for SerializedEdgeValue {
    fn from(v: &EdgeValue) -> Self {
        match v {
            EdgeValue::Literal(s) => Self { func: false, target: s.clone() },
            EdgeValue::Func(s) => Self { func: true, target: s.clone() },
        }
    }
}

#[derive(Serialize, Deserialize)]
struct SerializedNode {
    name: String,
    agent_type: String,
    prompt: String,
    context: serde_json::Value,
    input_fields: Vec<SerializedInputField>,
    output_fields: Vec<String>,
    success: Option<SerializedEdgeValue>,
    failure: Option<SerializedEdgeValue>,
    default: Option<SerializedEdgeValue>,
}

impl From<&NodeSpec> for SerializedNode {
    fn from(n: &NodeSpec) -> Self {
        Self {
            name: n.name.clone(),
            agent_type: n.agent_type.clone(),
            prompt: n.prompt.clone(),
            context: n.context.clone(),
            input_fields: n.input_fields.iter().map(SerializedInputField::from).collect(),
            output_fields: n.output_fields.clone(),
            success: n.edges.success.as_ref().map(SerializedEdgeValue::from),
            failure: n.edges.failure.as_ref().map(SerializedEdgeValue::from),
            default: n.edges.default.as_ref().map(SerializedEdgeValue::from),
        }
    }
}

/// The on-disk bundle: `node_registry` plus `source_hash` (spec.md §6, §3
/// "Compiled graph bundle"). `compiled_graph` in the spec's shape is this
/// same node registry -- there is no separate live-agent artifact to persist.
#[derive(Serialize, Deserialize)]
pub struct PersistedBundle {
    pub graph_name: String,
    pub source_hash: u64,
    node_registry: Vec<SerializedNode>,
}

impl PersistedBundle {
    pub fn from_graph(graph: &agentmap::CompiledGraph, nodes: &[NodeSpec]) -> Self {
        Self {
            graph_name: graph.name.clone(),
            source_hash: graph.source_hash,
            node_registry: nodes.iter().map(SerializedNode::from).collect(),
        }
    }

    /// Writes the bundle as JSON to `path`, and a human-readable `.src`
    /// sidecar next to it (spec.md §6: "a sibling `.src` text file may
    /// record the generated source for inspection").
    pub fn write(&self, path: &Path) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self).expect("PersistedBundle always serializes");
        std::fs::write(path, json)?;
        std::fs::write(path.with_extension("src"), self.render_source())?;
        Ok(())
    }

    fn render_source(&self) -> String {
        let mut out = format!(
            "# compiled bundle for graph '{}' (source_hash={:x})\n",
            self.graph_name, self.source_hash
        );
        for node in &self.node_registry {
            out.push_str(&format!(
                "- {} [{}] inputs={:?} outputs={:?} success={:?} failure={:?} default={:?}\n",
                node.name,
                node.agent_type,
                node.input_fields.iter().map(|f| f.name.clone().or(f.target.clone()).unwrap_or_default()).collect::<Vec<_>>(),
                node.output_fields,
                node.success.as_ref().map(|e| &e.target),
                node.failure.as_ref().map(|e| &e.target),
                node.default.as_ref().map(|e| &e.target),
            ));
        }
        out
    }

    pub fn node_count(&self) -> usize {
        self.node_registry.len()
    }

    /// Reconstructs the [`NodeSpec`] list so a loaded bundle can be
    /// re-assembled without re-reading the source CSV.
    pub fn to_node_specs(&self) -> Vec<NodeSpec> {
        self.node_registry
            .iter()
            .map(|n| NodeSpec {
                name: n.name.clone(),
                agent_type: n.agent_type.clone(),
                prompt: n.prompt.clone(),
                context: n.context.clone(),
                input_fields: n
                    .input_fields
                    .iter()
                    .map(|f| match f.kind.as_str() {
                        "mapped" => InputField::Mapped {
                            target: f.target.clone().unwrap_or_default(),
                            source: f.source.clone().unwrap_or_default(),
                        },
                        "func" => InputField::Func(f.name.clone().unwrap_or_default()),
                        _ => InputField::Name(f.name.clone().unwrap_or_default()),
                    })
                    .collect(),
                output_fields: n.output_fields.clone(),
                edges: EdgeMap {
                    success: n.success.as_ref().map(to_edge_value),
                    failure: n.failure.as_ref().map(to_edge_value),
                    default: n.default.as_ref().map(to_edge_value),
                },
            })
            .collect()
    }

    pub fn read(path: &Path) -> std::io::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

fn to_edge_value(v: &SerializedEdgeValue) -> EdgeValue {
    if v.func {
        EdgeValue::Func(v.target.clone())
    } else {
        EdgeValue::Literal(v.target.clone())
    }
}
