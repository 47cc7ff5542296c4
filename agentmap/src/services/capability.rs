//! Capability identifiers and the service-handle tagged union (spec.md §4.2,
//! Design Notes §9: "declare one marker per capability ... the registry
//! indexes providers by marker; agents declare markers by implementing the
//! matching configuration method. No runtime reflection is needed.").

use crate::services::providers::{
    FunctionResolutionService, GraphBundleService, GraphRunnerService, LlmService,
    MessagingService, OrchestratorService, StorageService, ToolSelectionService,
};
use std::sync::Arc;

/// The storage capability is split into sub-kinds; an agent declares the
/// specific kind it needs (spec.md §4.2 "Storage kinds").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Csv,
    Json,
    Vector,
    File,
    Blob,
    Kv,
    /// Accepts any backend polymorphic over the common read/write contract.
    Generic,
}

/// A capability marker. The registry indexes providers by this id; an agent
/// declares the markers it carries via [`CapabilityConsumer::declared_capabilities`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CapabilityId {
    Llm,
    Storage(StorageKind),
    Orchestrator,
    GraphRunner,
    GraphBundle,
    FunctionResolution,
    Messaging,
    ToolSelection,
    /// Host applications may register additional capabilities; the layer is
    /// open (spec.md §4.2).
    Custom(String),
}

/// A materialized service instance, tagged by capability kind. This is the
/// "tagged union over the supported ... representations" Design Notes §9
/// calls for in place of runtime protocol probing.
#[derive(Clone)]
pub enum ServiceHandle {
    Llm(Arc<dyn LlmService>),
    Storage(Arc<dyn StorageService>),
    Orchestrator(Arc<dyn OrchestratorService>),
    GraphRunner(Arc<dyn GraphRunnerService>),
    GraphBundle(Arc<dyn GraphBundleService>),
    FunctionResolution(Arc<dyn FunctionResolutionService>),
    Messaging(Arc<dyn MessagingService>),
    ToolSelection(Arc<dyn ToolSelectionService>),
    Custom(Arc<dyn std::any::Any + Send + Sync>),
}

/// Implemented by agents that accept injected business services. The
/// runtime never reads a service off the agent; it only pushes materialized
/// [`ServiceHandle`]s in via `configure_capability` (spec.md §4.2).
pub trait CapabilityConsumer: Send + Sync {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        Vec::new()
    }

    /// Stores `handle` on the agent. Called once per declared capability at
    /// graph-build time, after the registry has materialized a matching
    /// provider. A no-op default lets agents with no capabilities skip
    /// implementing this.
    fn configure_capability(&mut self, _capability: &CapabilityId, _handle: ServiceHandle) {}
}
