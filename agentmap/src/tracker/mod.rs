//! Execution tracker (spec.md §4.6): the per-run object that records node
//! outcomes, derives `graph_success` under a configurable success policy,
//! and nests sub-graph summaries.
//!
//! Owned exclusively by the single synchronous runner that drives a graph
//! run; there is no cross-thread access (spec.md §5 "Shared-resource
//! policy").

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// One node's start/result record.
#[derive(Debug, Clone, serde::Serialize)]
pub struct NodeRecord {
    pub node_name: String,
    pub started_at: u128,
    pub finished_at: Option<u128>,
    pub success: Option<bool>,
    pub inputs_snapshot: Value,
    pub output_snapshot_or_error: Option<Value>,
}

/// Structured summary of a completed (sub-)graph run, as placed under
/// `__execution_summary` (spec.md §3).
#[derive(Debug, Clone, serde::Serialize)]
pub struct ExecutionSummary {
    pub run_id: String,
    pub path: Vec<String>,
    pub node_records: Vec<NodeRecord>,
    pub sub_graph_summaries: HashMap<String, ExecutionSummary>,
    pub graph_success: bool,
}

/// How `graph_success` is derived from the recorded node outcomes
/// (spec.md §4.6).
#[derive(Clone)]
pub enum SuccessPolicy {
    /// `graph_success` is the cumulative AND of every node's success flag
    /// (the default).
    AllSuccess,
    /// `graph_success` is true once at least one node has succeeded.
    AtLeastOneSuccess,
    /// A user-supplied evaluator over the recorded node outcomes.
    Custom(Arc<dyn Fn(&[NodeRecord]) -> bool + Send + Sync>),
}

impl Default for SuccessPolicy {
    fn default() -> Self {
        SuccessPolicy::AllSuccess
    }
}

impl std::fmt::Debug for SuccessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SuccessPolicy::AllSuccess => write!(f, "AllSuccess"),
            SuccessPolicy::AtLeastOneSuccess => write!(f, "AtLeastOneSuccess"),
            SuccessPolicy::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
}

/// The per-run execution tracker.
#[derive(Debug)]
pub struct ExecutionTracker {
    pub run_id: String,
    pub thread_id: Option<String>,
    policy: SuccessPolicy,
    records: Vec<NodeRecord>,
    sub_graph_summaries: HashMap<String, ExecutionSummary>,
    graph_success: bool,
}

impl ExecutionTracker {
    pub fn new(run_id: impl Into<String>, thread_id: Option<String>) -> Self {
        Self::with_policy(run_id, thread_id, SuccessPolicy::default())
    }

    pub fn with_policy(
        run_id: impl Into<String>,
        thread_id: Option<String>,
        policy: SuccessPolicy,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            thread_id,
            policy,
            records: Vec::new(),
            sub_graph_summaries: HashMap::new(),
            graph_success: true,
        }
    }

    /// Appends a started node record. Idempotent per `(name, run_id)`: a
    /// second `record_node_start` for a node already started without a
    /// matching result is a no-op (spec.md §4.6).
    pub fn record_node_start(&mut self, name: &str, inputs_snapshot: Value) {
        if self
            .records
            .iter()
            .any(|r| r.node_name == name && r.finished_at.is_none())
        {
            return;
        }
        self.records.push(NodeRecord {
            node_name: name.to_string(),
            started_at: now_millis(),
            finished_at: None,
            success: None,
            inputs_snapshot,
            output_snapshot_or_error: None,
        });
    }

    /// Records the result of the most recent unfinished start for `name`.
    pub fn record_node_result(
        &mut self,
        name: &str,
        success: bool,
        result_or_error: Value,
    ) {
        if let Some(record) = self
            .records
            .iter_mut()
            .rev()
            .find(|r| r.node_name == name && r.finished_at.is_none())
        {
            record.finished_at = Some(now_millis());
            record.success = Some(success);
            record.output_snapshot_or_error = Some(result_or_error);
        }
        self.update_graph_success();
    }

    /// Re-evaluates `graph_success` against the configured policy. Called
    /// automatically after every `record_node_result`; exposed so callers
    /// that mutate records directly (rare) can force a recompute.
    pub fn update_graph_success(&mut self) {
        self.graph_success = match &self.policy {
            SuccessPolicy::AllSuccess => self.records.iter().all(|r| r.success.unwrap_or(true)),
            SuccessPolicy::AtLeastOneSuccess => {
                self.records.iter().any(|r| r.success == Some(true))
            }
            SuccessPolicy::Custom(f) => f(&self.records),
        };
    }

    pub fn graph_success(&self) -> bool {
        self.graph_success
    }

    /// Stores a completed sub-graph's summary under its parent `GraphAgent`
    /// node name, preserving nested depth (spec.md §4.4, §4.6).
    pub fn record_subgraph_execution(&mut self, parent_node: &str, summary: ExecutionSummary) {
        self.sub_graph_summaries
            .insert(parent_node.to_string(), summary);
    }

    pub fn path(&self) -> Vec<String> {
        self.records.iter().map(|r| r.node_name.clone()).collect()
    }

    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            run_id: self.run_id.clone(),
            path: self.path(),
            node_records: self.records.clone(),
            sub_graph_summaries: self.sub_graph_summaries.clone(),
            graph_success: self.graph_success,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn start_then_result_is_idempotent_and_appends_in_order() {
        let mut t = ExecutionTracker::new("run-1", None);
        t.record_node_start("A", json!({}));
        t.record_node_start("A", json!({})); // idempotent no-op
        t.record_node_result("A", true, json!({"ok": true}));
        t.record_node_start("B", json!({}));
        t.record_node_result("B", true, json!({}));

        assert_eq!(t.path(), vec!["A".to_string(), "B".to_string()]);
        assert_eq!(t.summary().node_records.len(), 2);
    }

    #[test]
    fn all_success_policy_is_cumulative_and() {
        let mut t = ExecutionTracker::new("run-1", None);
        t.record_node_start("A", json!({}));
        t.record_node_result("A", true, json!({}));
        assert!(t.graph_success());

        t.record_node_start("B", json!({}));
        t.record_node_result("B", false, json!({}));
        assert!(!t.graph_success());
    }

    #[test]
    fn at_least_one_success_policy() {
        let mut t =
            ExecutionTracker::with_policy("run-1", None, SuccessPolicy::AtLeastOneSuccess);
        t.record_node_start("A", json!({}));
        t.record_node_result("A", false, json!({}));
        assert!(!t.graph_success());

        t.record_node_start("B", json!({}));
        t.record_node_result("B", true, json!({}));
        assert!(t.graph_success());
    }

    #[test]
    fn subgraph_summaries_nest_under_parent_node() {
        let mut t = ExecutionTracker::new("run-1", None);
        let mut child = ExecutionTracker::new("run-2", None);
        child.record_node_start("P", json!({}));
        child.record_node_result("P", true, json!({}));
        t.record_subgraph_execution("G", child.summary());
        assert!(t.summary().sub_graph_summaries.contains_key("G"));
    }
}
