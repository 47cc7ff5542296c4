//! Error kinds the runtime recognises (spec.md §7).
//!
//! `run()` never lets an exception escape; every kind except `Interrupted`
//! is converted into an error state-updates partial by the Agent Lifecycle
//! Engine (see [`crate::agent::run`]). Assembly-time errors
//! (`ValidationError`, `ConfigurationError` during wiring when an agent
//! *requires* a missing service) propagate to the caller. `Interrupted` is
//! re-raised by the engine for the outer driver to catch and persist.

use crate::graph::interrupt::GraphInterrupt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentMapError {
    /// Bad CSV, unknown agent type, malformed context JSON, missing
    /// function reference at assembly.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// A service required by an agent was not registered, or a registered
    /// provider's protocol is incompatible with what the agent needs.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Missing/extra declared fields under multi-output `error` policy.
    #[error("multi-output validation error: {0}")]
    MultiOutputValidationError(String),

    /// Non-mapping output for a multi-output agent under `error` policy.
    #[error("multi-output type error: {0}")]
    MultiOutputTypeError(String),

    /// Any uncaught error inside `process` or its hooks.
    #[error("process error: {0}")]
    ProcessError(String),

    /// The suspension protocol: not a failure. Re-raised by the engine so
    /// the outer driver can persist a checkpoint and return control.
    #[error("interrupt signal: {0}")]
    InterruptSignal(GraphInterrupt),

    /// The run was cancelled between nodes.
    #[error("cancellation error: run cancelled")]
    CancellationError,

    /// A per-node deadline was exceeded before the provider returned.
    #[error("timeout error: {0}")]
    TimeoutError(String),
}

impl From<GraphInterrupt> for AgentMapError {
    fn from(interrupt: GraphInterrupt) -> Self {
        AgentMapError::InterruptSignal(interrupt)
    }
}

impl AgentMapError {
    /// `true` for the one kind that is not a failure (spec.md §7's
    /// propagation policy: "`run` never lets an exception escape; it
    /// converts everything except `InterruptSignal`").
    pub fn is_interrupt(&self) -> bool {
        matches!(self, AgentMapError::InterruptSignal(_))
    }
}
