//! # AgentMap
//!
//! A runtime that executes CSV-defined directed graphs of agents: units of
//! work that consume a shared state bag, perform a task, and return updates
//! to that bag. The graph compiler turns a parsed node set into an
//! executable state machine whose nodes carry both declared I/O contracts
//! and business-service dependencies.
//!
//! ## Core components
//!
//! - **Agent Lifecycle Engine** ([`agent`]) — a fixed pre-process / process /
//!   post-process pipeline around every node, with error containment,
//!   execution tracking, and a structured state-updates return protocol
//!   supporting single- and multi-field outputs under configurable
//!   validation policies ([`agent::OutputValidation`]).
//! - **Service Injection Layer** ([`services`]) — capability discovery that,
//!   at graph-build time, wires concrete service providers into an agent
//!   without the agent knowing about construction.
//! - **Graph Assembly & Sub-graph Composition Engine** ([`graph`]) —
//!   translation of a parsed node set into a [`graph::CompiledGraph`] with
//!   conditional/function-driven edges, plus a `GraphAgent` node type that
//!   runs a nested graph.
//! - **Suspend/Resume Protocol** ([`graph::interrupt`], [`checkpoint`]) — a
//!   cooperative interrupt mechanism that lets a node pause the whole
//!   graph, persist a checkpoint, and be re-driven later from an external
//!   signal.
//!
//! Out of scope (external collaborators, consumed only through the
//! interfaces in [`services::providers`]): CSV parsing, prompt-template
//! resolution, concrete LLM/storage/vector/file providers, the CLI, logging
//! backend configuration, and any validation-cache subsystem.
//!
//! ## Main modules
//!
//! - [`state`]: [`state::StateBag`], the state adapter ([`state::adapter`]),
//!   and reserved keys ([`state::reserved`]).
//! - [`agent`]: [`agent::Agent`] trait, [`agent::lifecycle::run`], built-in
//!   agent types ([`agent::builtins`]), the agent factory
//!   ([`agent::factory::AgentFactory`]), and multi-output validation
//!   ([`agent::validation`]).
//! - [`services`]: capability markers ([`services::capability`]), the
//!   registry ([`services::registry::ServiceRegistry`]), and provider
//!   contracts ([`services::providers`]).
//! - [`graph`]: node specs ([`graph::node_spec`]), edge resolution
//!   ([`graph::edges`]), the assembler ([`graph::assembler::GraphAssembler`]),
//!   the compiled bundle ([`graph::compiled::CompiledGraph`]), and the
//!   synchronous driver ([`graph::runner::GraphRunner`]).
//! - [`tracker`]: [`tracker::ExecutionTracker`], [`tracker::SuccessPolicy`].
//! - [`checkpoint`]: [`checkpoint::CheckpointStore`] for the suspend/resume
//!   protocol.
//! - [`error`]: [`error::AgentMapError`], the eight error kinds of spec §7.

pub mod agent;
pub mod checkpoint;
pub mod error;
pub mod graph;
pub mod services;
pub mod state;
pub mod tracker;

pub use agent::{Agent, AgentHandle, AgentIdentity, OutputValidation, ProcessOutput};
pub use checkpoint::{Checkpoint, CheckpointError, CheckpointStore, InMemoryCheckpointStore};
pub use error::AgentMapError;
pub use graph::{
    parse_context, parse_input_fields, parse_output_fields, AssemblyError, CompiledGraph,
    CompiledNode, EdgeMap, EdgeValue, GraphAssembler, GraphInterrupt, GraphRunOutcome,
    GraphRunner, InputField, Interrupt, NodeSpec, RoutingFn, WorkflowSource,
};
pub use services::{
    CapabilityConsumer, CapabilityId, ProviderFactory, RegistrySummary, ServiceHandle,
    ServiceRegistry, StorageKind,
};
pub use state::StateBag;
pub use tracker::{ExecutionSummary, ExecutionTracker, NodeRecord, SuccessPolicy};
