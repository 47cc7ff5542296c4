//! The service registry: capability-id to provider mapping (spec.md §4.2
//! "Registry contract").
//!
//! Read-mostly after graph assembly; concurrent reads are safe, writes are
//! expected only at startup or test setup (spec.md §5 "Shared-resource
//! policy"). A `dashmap::DashMap` gives that for free without a global lock.

use crate::services::capability::{CapabilityId, ServiceHandle};
use dashmap::DashMap;
use std::sync::Arc;

/// Materializes a [`ServiceHandle`] on demand. May be an eager singleton
/// (a closure that clones an already-constructed `Arc`) or a lazy factory
/// that constructs fresh state per call; the registry does not care which
/// (spec.md §4.2 "Providers may be eager singletons or lazy factories").
pub type ProviderFactory = Arc<dyn Fn() -> ServiceHandle + Send + Sync>;

struct RegisteredProvider {
    factory: ProviderFactory,
    protocol_markers: Vec<String>,
    metadata: serde_json::Value,
}

/// `summary()`'s return shape (spec.md §4.2).
#[derive(Debug, Clone, serde::Serialize)]
pub struct RegistrySummary {
    pub total_services: usize,
    pub services: Vec<String>,
    pub protocols: Vec<String>,
    pub health_flags: std::collections::HashMap<String, bool>,
}

/// Owned by the container, not by any agent (spec.md §3 "Service registry").
#[derive(Default)]
pub struct ServiceRegistry {
    providers: DashMap<CapabilityId, RegisteredProvider>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        capability_id: CapabilityId,
        provider_factory: ProviderFactory,
        protocol_markers: Vec<String>,
        metadata: serde_json::Value,
    ) {
        self.providers.insert(
            capability_id,
            RegisteredProvider {
                factory: provider_factory,
                protocol_markers,
                metadata,
            },
        );
    }

    pub fn is_registered(&self, capability_id: &CapabilityId) -> bool {
        self.providers.contains_key(capability_id)
    }

    /// Returns the registered factory for `capability_id`, or `None` if no
    /// provider is registered (graceful degradation per spec.md §4.2
    /// "Configuration algorithm": a missing provider is logged and skipped).
    pub fn get_provider(&self, capability_id: &CapabilityId) -> Option<ProviderFactory> {
        self.providers.get(capability_id).map(|p| p.factory.clone())
    }

    /// Capability ids whose protocol set contains `marker`.
    pub fn discover_by_protocol(&self, marker: &str) -> Vec<CapabilityId> {
        self.providers
            .iter()
            .filter(|entry| entry.value().protocol_markers.iter().any(|m| m == marker))
            .map(|entry| entry.key().clone())
            .collect()
    }

    pub fn unregister(&self, capability_id: &CapabilityId) {
        self.providers.remove(capability_id);
    }

    pub fn clear(&self) {
        self.providers.clear();
    }

    pub fn summary(&self) -> RegistrySummary {
        let mut services = Vec::new();
        let mut protocols = std::collections::HashSet::new();
        let mut health_flags = std::collections::HashMap::new();
        for entry in self.providers.iter() {
            let label = format!("{:?}", entry.key());
            health_flags.insert(
                label.clone(),
                entry
                    .value()
                    .metadata
                    .get("healthy")
                    .and_then(serde_json::Value::as_bool)
                    .unwrap_or(true),
            );
            services.push(label);
            protocols.extend(entry.value().protocol_markers.iter().cloned());
        }
        RegistrySummary {
            total_services: services.len(),
            services,
            protocols: protocols.into_iter().collect(),
            health_flags,
        }
    }
}
