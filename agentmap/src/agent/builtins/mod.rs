//! Built-in agents (spec.md §4.8): behavioural summaries implemented as
//! ordinary [`crate::agent::Agent`] types. Their value is mostly in
//! exercising the lifecycle pipeline faithfully; see each submodule for the
//! specific contract it fulfils.

pub mod default_agent;
pub mod graph_agent;
pub mod llm_agent;
pub mod orchestrator_agent;
pub mod storage_agent;
pub mod suspend_agent;
pub mod summary_agent;
mod template;
pub mod tool_agent;

use crate::agent::factory::AgentFactory;
use crate::agent::AgentIdentity;
use crate::services::capability::StorageKind;
use std::sync::Arc;

/// Registers every built-in `agent_type` on `factory` (spec.md §4.8).
pub fn register_builtins(factory: &AgentFactory) {
    factory.register(
        "Default",
        Arc::new(|spec| Ok(Box::new(default_agent::DefaultAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "Echo",
        Arc::new(|spec| Ok(Box::new(default_agent::EchoAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "Failure",
        Arc::new(|spec| Ok(Box::new(default_agent::FailureAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "Input",
        Arc::new(|spec| Ok(Box::new(default_agent::InputAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "Summary",
        Arc::new(|spec| Ok(Box::new(summary_agent::SummaryAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "LLM",
        Arc::new(|spec| Ok(Box::new(llm_agent::LlmAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "Orchestrator",
        Arc::new(|spec| Ok(Box::new(orchestrator_agent::OrchestratorAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "Tool",
        Arc::new(|spec| Ok(Box::new(tool_agent::ToolAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "GraphAgent",
        Arc::new(|spec| Ok(Box::new(graph_agent::GraphAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );
    factory.register(
        "SuspendAgent",
        Arc::new(|spec| Ok(Box::new(suspend_agent::SuspendAgent::new(AgentIdentity::from_spec(spec))) as _)),
    );

    for (agent_type, kind) in [
        ("CSVReader", StorageKind::Csv),
        ("JSONReader", StorageKind::Json),
        ("VectorReader", StorageKind::Vector),
        ("FileReader", StorageKind::File),
        ("BlobReader", StorageKind::Blob),
        ("KVReader", StorageKind::Kv),
    ] {
        factory.register(
            agent_type,
            Arc::new(move |spec| {
                Ok(Box::new(storage_agent::StorageAgent::new(
                    AgentIdentity::from_spec(spec),
                    kind,
                    storage_agent::StorageMode::Read,
                )) as _)
            }),
        );
    }
    for (agent_type, kind) in [
        ("CSVWriter", StorageKind::Csv),
        ("JSONWriter", StorageKind::Json),
        ("VectorWriter", StorageKind::Vector),
        ("FileWriter", StorageKind::File),
        ("BlobWriter", StorageKind::Blob),
        ("KVWriter", StorageKind::Kv),
    ] {
        factory.register(
            agent_type,
            Arc::new(move |spec| {
                Ok(Box::new(storage_agent::StorageAgent::new(
                    AgentIdentity::from_spec(spec),
                    kind,
                    storage_agent::StorageMode::Write,
                )) as _)
            }),
        );
    }
}
