//! Checkpoint persistence for the suspend/resume protocol (spec.md §4.5,
//! §6). Saves and loads by `thread_id`; generalised from the teacher's
//! `Checkpointer<S>` trait (keyed by thread/namespace/checkpoint id) down
//! to the one key a suspended run actually needs here, since AgentMap's
//! state is always a single [`StateBag`] rather than an arbitrary `S`.

use crate::graph::interrupt::Interrupt;
use crate::state::StateBag;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum CheckpointError {
    #[error("thread_id required")]
    ThreadIdRequired,
    #[error("storage: {0}")]
    Storage(String),
    #[error("not found: {0}")]
    NotFound(String),
}

/// A suspended run's persisted state: the interrupt that paused it, and the
/// state bag as of the moment it was raised (spec.md §4.5).
#[derive(Debug, Clone)]
pub struct Checkpoint {
    pub thread_id: String,
    pub interrupt: Interrupt,
    pub state: StateBag,
}

/// Persists and retrieves [`Checkpoint`]s by thread id. Implementations:
/// [`InMemoryCheckpointStore`] here; a durable backend (sqlite, redis, ...)
/// is a host-application concern (spec.md §6 out-of-scope provider list).
#[async_trait]
pub trait CheckpointStore: Send + Sync {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError>;
    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError>;
    async fn clear(&self, thread_id: &str) -> Result<(), CheckpointError>;
}

/// The default, process-local checkpoint backend. Good enough for a single
/// runner instance and for tests; a host wanting durable suspend/resume
/// across process restarts supplies its own [`CheckpointStore`].
#[derive(Default)]
pub struct InMemoryCheckpointStore {
    checkpoints: Mutex<HashMap<String, Checkpoint>>,
}

impl InMemoryCheckpointStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CheckpointStore for InMemoryCheckpointStore {
    async fn save(&self, checkpoint: Checkpoint) -> Result<(), CheckpointError> {
        if checkpoint.thread_id.is_empty() {
            return Err(CheckpointError::ThreadIdRequired);
        }
        self.checkpoints
            .lock()
            .expect("checkpoint store lock poisoned")
            .insert(checkpoint.thread_id.clone(), checkpoint);
        Ok(())
    }

    async fn load(&self, thread_id: &str) -> Result<Option<Checkpoint>, CheckpointError> {
        Ok(self
            .checkpoints
            .lock()
            .expect("checkpoint store lock poisoned")
            .get(thread_id)
            .cloned())
    }

    async fn clear(&self, thread_id: &str) -> Result<(), CheckpointError> {
        self.checkpoints
            .lock()
            .expect("checkpoint store lock poisoned")
            .remove(thread_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Map, Value};

    fn checkpoint(thread_id: &str) -> Checkpoint {
        Checkpoint {
            thread_id: thread_id.to_string(),
            interrupt: Interrupt::new(thread_id, thread_id, Map::<String, Value>::new(), Map::new()),
            state: StateBag::new(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = InMemoryCheckpointStore::new();
        store.save(checkpoint("t-1")).await.unwrap();
        let loaded = store.load("t-1").await.unwrap();
        assert!(loaded.is_some());
        assert_eq!(loaded.unwrap().thread_id, "t-1");
    }

    #[tokio::test]
    async fn load_missing_thread_is_none() {
        let store = InMemoryCheckpointStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_thread_id_is_rejected() {
        let store = InMemoryCheckpointStore::new();
        let result = store.save(checkpoint("")).await;
        assert!(matches!(result, Err(CheckpointError::ThreadIdRequired)));
    }

    #[tokio::test]
    async fn clear_removes_checkpoint() {
        let store = InMemoryCheckpointStore::new();
        store.save(checkpoint("t-1")).await.unwrap();
        store.clear("t-1").await.unwrap();
        assert!(store.load("t-1").await.unwrap().is_none());
    }
}
