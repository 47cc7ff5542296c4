//! The Service Injection Layer (spec.md §4.2): capability discovery and the
//! service registry. Agents declare capability markers; the registry
//! resolves a provider for each at graph-build time and pushes the
//! materialized handle onto the agent. The runtime never reads a service off
//! an agent.

pub mod capability;
pub mod providers;
pub mod registry;

pub use capability::{CapabilityConsumer, CapabilityId, ServiceHandle, StorageKind};
pub use registry::{ProviderFactory, RegistrySummary, ServiceRegistry};
