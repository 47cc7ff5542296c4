//! Provider contracts consumed by the core (spec.md §6). These are
//! interfaces only — concrete LLM/storage/orchestrator/etc. implementations
//! are out of scope per spec.md §1; the core depends on nothing but the
//! trait.

use crate::graph::compiled::CompiledGraph;
use crate::state::StateBag;
use crate::tracker::{ExecutionSummary, ExecutionTracker};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("{0}")]
    Message(String),
}

/// `call_llm(provider, messages, model?, temperature?, max_tokens?,
/// routing_context?) -> string` (spec.md §6).
#[async_trait]
pub trait LlmService: Send + Sync {
    async fn call_llm(
        &self,
        provider: Option<&str>,
        messages: &[Value],
        model: Option<&str>,
        temperature: Option<f64>,
        max_tokens: Option<u32>,
        routing_context: Option<&Value>,
    ) -> Result<String, ProviderError>;
}

/// Uniform storage result record, per spec.md §4.8 "Storage
/// (reader/writer per kind)".
#[derive(Debug, Clone, Default)]
pub struct StorageResult {
    pub success: bool,
    pub data: Option<Value>,
    pub error: Option<String>,
    pub file_path: Option<String>,
    pub mode: Option<String>,
    pub counts: Option<Value>,
}

/// `read(collection, document_id?, query?, path?, format?, id_field?) ->
/// value`; `write(collection, data, mode, ...) -> result` (spec.md §6).
#[async_trait]
pub trait StorageService: Send + Sync {
    async fn read(
        &self,
        collection: &str,
        document_id: Option<&str>,
        query: Option<&Value>,
        path: Option<&str>,
        format: Option<&str>,
        id_field: Option<&str>,
    ) -> Result<Value, ProviderError>;

    async fn write(
        &self,
        collection: &str,
        data: &Value,
        mode: &str,
    ) -> Result<StorageResult, ProviderError>;
}

/// `select_best_node(input_text, available_nodes, strategy,
/// confidence_threshold, ...) -> node_name` (spec.md §6, §4.8
/// "Orchestrator").
#[async_trait]
pub trait OrchestratorService: Send + Sync {
    async fn select_best_node(
        &self,
        input_text: &str,
        available_nodes: &[String],
        strategy: OrchestratorStrategy,
        confidence_threshold: f64,
    ) -> Result<String, ProviderError>;
}

/// The three selection strategies `Orchestrator` supports (spec.md §4.8).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrchestratorStrategy {
    Algorithm,
    Llm,
    /// Runs algorithmic scoring first; falls through to LLM only when the
    /// top score is below `confidence_threshold`.
    Tiered,
}

/// `extract_func_ref(str) -> name?`; `import_function(name) -> callable`
/// (spec.md §6). `import_function` is split into the two callable shapes
/// the core actually needs: an input-projection/mapping function and an
/// edge-routing function (see [`crate::graph::edges::RoutingFn`]).
pub trait FunctionResolutionService: Send + Sync {
    /// Strips a `func:` prefix, returning the bare name, or `None` if `raw`
    /// is not a function reference.
    fn extract_func_ref<'a>(&self, raw: &'a str) -> Option<&'a str> {
        raw.strip_prefix("func:")
    }

    /// Resolves a routing-function name used in an edge's `func:NAME` form.
    /// Returns `None` if the name is not registered — which fails assembly,
    /// not run-time (spec.md §4.3).
    fn import_routing_function(&self, name: &str) -> Option<crate::graph::edges::RoutingFn>;

    /// Resolves an input/output mapping function: `NAME(state) -> StateBag`,
    /// used by an agent's `func:NAME` input-field entry and by `GraphAgent`
    /// function-mapping (spec.md §4.1, §4.4).
    fn import_mapping_function(&self, name: &str) -> Option<MappingFn>;
}

pub type MappingFn = Arc<dyn Fn(&StateBag) -> StateBag + Send + Sync>;

/// `get_bundle(workflow_name) -> bundle` (spec.md §6).
#[async_trait]
pub trait GraphBundleService: Send + Sync {
    async fn get_bundle(&self, workflow_name: &str) -> Result<Arc<CompiledGraph>, ProviderError>;
}

/// `run(bundle, initial_state, is_subgraph?, parent_tracker?,
/// parent_graph_name?) -> {success, final_state, error?}` (spec.md §6).
#[async_trait]
pub trait GraphRunnerService: Send + Sync {
    async fn run(
        &self,
        bundle: &CompiledGraph,
        initial_state: StateBag,
        is_subgraph: bool,
        parent_tracker: Option<&ExecutionTracker>,
    ) -> Result<(StateBag, ExecutionSummary), ProviderError>;
}

/// `publish(topic, payload)`; `subscribe(topic) -> stream` (spec.md §6,
/// optional capability).
#[async_trait]
pub trait MessagingService: Send + Sync {
    async fn publish(&self, topic: &str, payload: Value) -> Result<(), ProviderError>;
}

/// Tool-selection capability backing the `Tool` built-in agent when more
/// than one candidate tool is configured (spec.md §4.8 "Tool"). Delegates
/// to the orchestrator, treating tools as nodes.
#[async_trait]
pub trait ToolSelectionService: Send + Sync {
    async fn select_tool(
        &self,
        input_text: &str,
        candidate_tool_names: &[String],
    ) -> Result<String, ProviderError>;
}
