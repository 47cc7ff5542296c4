//! Storage reader/writer built-ins (spec.md §4.8 "Storage (reader/writer
//! per kind)"): thin adapters projecting inputs into a single
//! [`StorageService`] call and back into the uniform result shape
//! `{success, data|error, file_path?, mode?, counts?}`.

use crate::agent::{Agent, AgentIdentity, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::capability::{CapabilityConsumer, CapabilityId, ServiceHandle, StorageKind};
use crate::services::providers::StorageService;
use crate::state::StateBag;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    Read,
    Write,
}

pub struct StorageAgent {
    identity: AgentIdentity,
    kind: StorageKind,
    mode: StorageMode,
    storage: Option<Arc<dyn StorageService>>,
}

impl StorageAgent {
    pub fn new(identity: AgentIdentity, kind: StorageKind, mode: StorageMode) -> Self {
        Self {
            identity,
            kind,
            mode,
            storage: None,
        }
    }

    fn collection(&self, inputs: &StateBag) -> Result<String, AgentMapError> {
        inputs
            .get("collection")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| self.identity.context_str("collection").map(str::to_string))
            .ok_or_else(|| {
                AgentMapError::ValidationError(format!(
                    "node '{}' has no collection/path to operate on",
                    self.identity.name
                ))
            })
    }

    async fn read(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected StorageService",
                self.identity.name
            ))
        })?;
        let collection = self.collection(inputs)?;
        let document_id = inputs.get("document_id").and_then(Value::as_str);
        let query = inputs.get("query");
        let path = inputs.get("path").and_then(Value::as_str);
        let format = self.identity.context_str("format");
        let id_field = self.identity.context_str("id_field");

        let data = storage
            .read(&collection, document_id, query, path, format, id_field)
            .await
            .map_err(|e| AgentMapError::ProcessError(e.to_string()))?;

        let key = self
            .identity
            .output_fields
            .first()
            .cloned()
            .unwrap_or_else(|| "data".to_string());
        Ok(ProcessOutput::Value(Value::Object(
            [(key, data)].into_iter().collect(),
        )))
    }

    async fn write(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        let storage = self.storage.as_ref().ok_or_else(|| {
            AgentMapError::ConfigurationError(format!(
                "node '{}' requires an injected StorageService",
                self.identity.name
            ))
        })?;
        let collection = self.collection(inputs)?;
        let data = inputs.get("data").cloned().unwrap_or_else(|| {
            Value::Object(inputs.as_map().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        });
        let mode = self.identity.context_str("mode").unwrap_or("append");

        let result = storage
            .write(&collection, &data, mode)
            .await
            .map_err(|e| AgentMapError::ProcessError(e.to_string()))?;

        let mut updates = Map::new();
        updates.insert("success".to_string(), json!(result.success));
        if let Some(data) = result.data {
            updates.insert("data".to_string(), data);
        }
        if let Some(error) = result.error {
            updates.insert("error".to_string(), json!(error));
        }
        if let Some(file_path) = result.file_path {
            updates.insert("file_path".to_string(), json!(file_path));
        }
        if let Some(mode) = result.mode {
            updates.insert("mode".to_string(), json!(mode));
        }
        if let Some(counts) = result.counts {
            updates.insert("counts".to_string(), counts);
        }
        Ok(ProcessOutput::StateUpdates(updates))
    }
}

impl CapabilityConsumer for StorageAgent {
    fn declared_capabilities(&self) -> Vec<CapabilityId> {
        vec![CapabilityId::Storage(self.kind)]
    }

    fn configure_capability(&mut self, capability: &CapabilityId, handle: ServiceHandle) {
        if let (CapabilityId::Storage(kind), ServiceHandle::Storage(service)) = (capability, handle) {
            if *kind == self.kind {
                self.storage = Some(service);
            }
        }
    }
}

#[async_trait]
impl Agent for StorageAgent {
    fn identity(&self) -> &AgentIdentity {
        &self.identity
    }

    async fn process(&self, inputs: &StateBag) -> Result<ProcessOutput, AgentMapError> {
        match self.mode {
            StorageMode::Read => self.read(inputs).await,
            StorageMode::Write => self.write(inputs).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::edges::EdgeMap;
    use crate::graph::node_spec::NodeSpec;
    use crate::services::providers::{ProviderError, StorageResult};

    fn spec(context: Value) -> NodeSpec {
        NodeSpec {
            name: "storage".to_string(),
            agent_type: "CSVReader".to_string(),
            prompt: String::new(),
            context,
            input_fields: vec![],
            output_fields: vec!["rows".to_string()],
            edges: EdgeMap::default(),
        }
    }

    struct StubStorage;
    #[async_trait::async_trait]
    impl StorageService for StubStorage {
        async fn read(
            &self,
            collection: &str,
            _document_id: Option<&str>,
            _query: Option<&Value>,
            _path: Option<&str>,
            _format: Option<&str>,
            _id_field: Option<&str>,
        ) -> Result<Value, ProviderError> {
            Ok(json!({"collection": collection}))
        }

        async fn write(
            &self,
            _collection: &str,
            _data: &Value,
            mode: &str,
        ) -> Result<StorageResult, ProviderError> {
            Ok(StorageResult {
                success: true,
                data: None,
                error: None,
                file_path: Some("/tmp/out.csv".to_string()),
                mode: Some(mode.to_string()),
                counts: Some(json!({"written": 1})),
            })
        }
    }

    #[tokio::test]
    async fn read_projects_collection_into_declared_output_field() {
        let mut agent = StorageAgent::new(
            AgentIdentity::from_spec(&spec(json!({}))),
            StorageKind::Csv,
            StorageMode::Read,
        );
        agent.configure_capability(
            &CapabilityId::Storage(StorageKind::Csv),
            ServiceHandle::Storage(Arc::new(StubStorage)),
        );
        let mut inputs = StateBag::new();
        inputs.insert("collection", json!("users"));
        let out = agent.process(&inputs).await.unwrap();
        match out {
            ProcessOutput::Value(Value::Object(m)) => {
                assert_eq!(m.get("rows").unwrap()["collection"], "users")
            }
            _ => panic!("expected an object"),
        }
    }

    #[tokio::test]
    async fn write_returns_uniform_result_shape() {
        let mut agent = StorageAgent::new(
            AgentIdentity::from_spec(&spec(json!({"mode": "overwrite"}))),
            StorageKind::Csv,
            StorageMode::Write,
        );
        agent.configure_capability(
            &CapabilityId::Storage(StorageKind::Csv),
            ServiceHandle::Storage(Arc::new(StubStorage)),
        );
        let mut inputs = StateBag::new();
        inputs.insert("collection", json!("users"));
        inputs.insert("data", json!([{"id": 1}]));
        let out = agent.process(&inputs).await.unwrap();
        match out {
            ProcessOutput::StateUpdates(m) => {
                assert_eq!(m.get("success").unwrap(), true);
                assert_eq!(m.get("mode").unwrap(), "overwrite");
            }
            _ => panic!("expected state updates"),
        }
    }

    #[tokio::test]
    async fn missing_collection_is_validation_error() {
        let mut agent = StorageAgent::new(
            AgentIdentity::from_spec(&spec(json!({}))),
            StorageKind::Csv,
            StorageMode::Read,
        );
        agent.configure_capability(
            &CapabilityId::Storage(StorageKind::Csv),
            ServiceHandle::Storage(Arc::new(StubStorage)),
        );
        let result = agent.process(&StateBag::new()).await;
        assert!(matches!(result, Err(AgentMapError::ValidationError(_))));
    }
}
