//! The Graph Assembly & Sub-graph Composition Engine (spec.md §4.3, §4.4):
//! translation of a parsed node set into a compiled, immutable graph, plus
//! the synchronous runner that drives it.

pub mod assembler;
pub mod compiled;
pub mod edges;
pub mod interrupt;
pub mod node_spec;
pub mod runner;

pub use assembler::{AssemblyError, GraphAssembler, WorkflowSource};
pub use compiled::{CompiledGraph, CompiledNode};
pub use edges::{resolve_edge, EdgeMap, EdgeValue, RoutingFn};
pub use interrupt::{GraphInterrupt, Interrupt};
pub use node_spec::{parse_context, parse_input_fields, parse_output_fields, InputField, NodeSpec};
pub use runner::{GraphRunOutcome, GraphRunner};
