//! The synchronous graph driver (spec.md §4.3 "Execution", §4.5
//! "Suspend/resume"): walks a [`CompiledGraph`] from its entry point,
//! merging each node's partial update into the shared state and resolving
//! the next edge, until a terminal node is reached, a cancellation or
//! timeout fires, or a node suspends.
//!
//! Node-level concurrency is explicitly out of scope (spec.md §1
//! Non-goals): exactly one node runs at a time, in the thread that called
//! [`GraphRunner::run`].

use crate::agent::lifecycle;
use crate::checkpoint::{Checkpoint, CheckpointStore};
use crate::error::AgentMapError;
use crate::graph::compiled::CompiledGraph;
use crate::graph::edges::resolve_edge;
use crate::graph::interrupt::GraphInterrupt;
use crate::services::providers::{FunctionResolutionService, GraphRunnerService, ProviderError};
use crate::state::{reserved, StateBag};
use crate::tracker::{ExecutionSummary, ExecutionTracker, SuccessPolicy};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// The outcome of a completed (non-suspended) run.
pub struct GraphRunOutcome {
    pub state: StateBag,
    pub summary: ExecutionSummary,
}

enum DriveStart {
    Entry,
    Resume { node_name: String, resume_value: serde_json::Value },
}

/// Drives one [`CompiledGraph`] to completion or suspension.
pub struct GraphRunner {
    function_resolution: Option<Arc<dyn FunctionResolutionService>>,
    checkpoints: Arc<dyn CheckpointStore>,
    node_timeout: Option<Duration>,
    success_policy: SuccessPolicy,
}

impl GraphRunner {
    pub fn new(
        function_resolution: Option<Arc<dyn FunctionResolutionService>>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            function_resolution,
            checkpoints,
            node_timeout: None,
            success_policy: SuccessPolicy::default(),
        }
    }

    pub fn with_node_timeout(mut self, timeout: Duration) -> Self {
        self.node_timeout = Some(timeout);
        self
    }

    pub fn with_success_policy(mut self, policy: SuccessPolicy) -> Self {
        self.success_policy = policy;
        self
    }

    fn resolve_mapping_fn(&self, name: &str) -> Option<crate::services::providers::MappingFn> {
        self.function_resolution
            .as_ref()
            .and_then(|fr| fr.import_mapping_function(name))
    }

    fn resolve_routing_fn(&self, name: &str) -> Option<crate::graph::edges::RoutingFn> {
        self.function_resolution
            .as_ref()
            .and_then(|fr| fr.import_routing_function(name))
    }

    /// Runs `graph` from its entry point. `thread_id` identifies the run
    /// for checkpointing; a run with no `SuspendAgent` node never consults
    /// it. Re-raises suspension as `Err(InterruptSignal)` for the caller to
    /// catch, persist having already happened (spec.md §4.5, §7).
    pub async fn run(
        &self,
        graph: &CompiledGraph,
        mut initial_state: StateBag,
        thread_id: Option<String>,
        cancel: Option<&AtomicBool>,
    ) -> Result<GraphRunOutcome, AgentMapError> {
        let thread_id = thread_id.unwrap_or_else(|| "default".to_string());
        initial_state.insert(reserved::THREAD_ID, serde_json::Value::String(thread_id.clone()));

        let tracker = Arc::new(Mutex::new(ExecutionTracker::with_policy(
            uuid::Uuid::new_v4().to_string(),
            Some(thread_id.clone()),
            self.success_policy.clone(),
        )));

        let final_state = self
            .drive(
                graph,
                initial_state,
                tracker.clone(),
                &thread_id,
                DriveStart::Entry,
                cancel,
            )
            .await?;

        let summary = tracker.lock().expect("tracker lock poisoned").summary();
        Ok(GraphRunOutcome {
            state: final_state,
            summary,
        })
    }

    /// Resumes a previously suspended run of `graph` for `thread_id`,
    /// feeding `resume_value` into the interrupted node's `resume` hook
    /// before continuing the drive loop (spec.md §4.5).
    pub async fn resume(
        &self,
        graph: &CompiledGraph,
        thread_id: &str,
        resume_value: serde_json::Value,
        cancel: Option<&AtomicBool>,
    ) -> Result<GraphRunOutcome, AgentMapError> {
        let checkpoint = self
            .checkpoints
            .load(thread_id)
            .await
            .map_err(|e| AgentMapError::ConfigurationError(e.to_string()))?
            .ok_or_else(|| AgentMapError::ConfigurationError(format!("no checkpoint for thread '{thread_id}'")))?;

        let tracker = Arc::new(Mutex::new(ExecutionTracker::with_policy(
            uuid::Uuid::new_v4().to_string(),
            Some(thread_id.to_string()),
            self.success_policy.clone(),
        )));

        let final_state = self
            .drive(
                graph,
                checkpoint.state,
                tracker.clone(),
                thread_id,
                DriveStart::Resume {
                    node_name: checkpoint.interrupt.node_name,
                    resume_value,
                },
                cancel,
            )
            .await?;

        let summary = tracker.lock().expect("tracker lock poisoned").summary();
        Ok(GraphRunOutcome {
            state: final_state,
            summary,
        })
    }

    async fn drive(
        &self,
        graph: &CompiledGraph,
        mut state: StateBag,
        tracker: Arc<Mutex<ExecutionTracker>>,
        thread_id: &str,
        start: DriveStart,
        cancel: Option<&AtomicBool>,
    ) -> Result<StateBag, AgentMapError> {
        let mut current = match &start {
            DriveStart::Entry => graph.entry_point.clone(),
            DriveStart::Resume { node_name, .. } => node_name.clone(),
        };
        let mut pending_resume = match start {
            DriveStart::Entry => None,
            DriveStart::Resume { resume_value, .. } => Some(resume_value),
        };

        loop {
            if cancel.map(|c| c.load(Ordering::SeqCst)).unwrap_or(false) {
                return Err(AgentMapError::CancellationError);
            }

            let node = graph.node(&current).ok_or_else(|| {
                AgentMapError::ValidationError(format!("node '{current}' not found in compiled graph"))
            })?;

            node.agent.identity().set_execution_tracker(tracker.clone());

            let resolver = |name: &str| self.resolve_mapping_fn(name);
            let run_result = match pending_resume.take() {
                Some(resume_value) => {
                    self.run_with_timeout(lifecycle::run_resumed(
                        node.agent.as_ref(),
                        &state,
                        &resolver,
                        resume_value,
                    ))
                    .await
                }
                None => {
                    self.run_with_timeout(lifecycle::run(node.agent.as_ref(), &state, &resolver))
                        .await
                }
            };

            match run_result {
                Ok(partial) => state.merge(partial),
                Err(e) if e.is_interrupt() => {
                    if let AgentMapError::InterruptSignal(gi) = e {
                        self.persist_suspension(thread_id, &gi, &state).await?;
                        return Err(AgentMapError::InterruptSignal(gi));
                    }
                    unreachable!("is_interrupt() only true for InterruptSignal")
                }
                Err(e) => return Err(e),
            }

            let next = resolve_edge(&node.edges, &state, |name| self.resolve_routing_fn(name));
            match next {
                Some(next_name) => current = next_name,
                None => break,
            }
        }

        Ok(state)
    }

    async fn run_with_timeout(
        &self,
        fut: impl std::future::Future<Output = Result<StateBag, AgentMapError>>,
    ) -> Result<StateBag, AgentMapError> {
        match self.node_timeout {
            Some(duration) => tokio::time::timeout(duration, fut)
                .await
                .map_err(|_| AgentMapError::TimeoutError(format!("node exceeded {duration:?}")))?,
            None => fut.await,
        }
    }

    async fn persist_suspension(
        &self,
        thread_id: &str,
        interrupt: &GraphInterrupt,
        state: &StateBag,
    ) -> Result<(), AgentMapError> {
        self.checkpoints
            .save(Checkpoint {
                thread_id: thread_id.to_string(),
                interrupt: interrupt.interrupt().clone(),
                state: state.clone(),
            })
            .await
            .map_err(|e| AgentMapError::ConfigurationError(e.to_string()))
    }
}

/// Adapts [`GraphRunner`] to the [`GraphRunnerService`] capability contract
/// so a `GraphAgent` node can drive a nested sub-graph the same way the top
/// level host application drives the outermost one.
pub struct DefaultGraphRunner {
    runner: GraphRunner,
}

impl DefaultGraphRunner {
    pub fn new(
        function_resolution: Option<Arc<dyn FunctionResolutionService>>,
        checkpoints: Arc<dyn CheckpointStore>,
    ) -> Self {
        Self {
            runner: GraphRunner::new(function_resolution, checkpoints),
        }
    }
}

#[async_trait]
impl GraphRunnerService for DefaultGraphRunner {
    async fn run(
        &self,
        bundle: &CompiledGraph,
        initial_state: StateBag,
        is_subgraph: bool,
        _parent_tracker: Option<&ExecutionTracker>,
    ) -> Result<(StateBag, ExecutionSummary), ProviderError> {
        let thread_id = if is_subgraph {
            Some(uuid::Uuid::new_v4().to_string())
        } else {
            None
        };
        let outcome = self
            .runner
            .run(bundle, initial_state, thread_id, None)
            .await
            .map_err(|e| ProviderError::Message(e.to_string()))?;
        Ok((outcome.state, outcome.summary))
    }
}
