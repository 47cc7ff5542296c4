//! Reserved state-bag keys the runtime itself reads and writes (spec.md §3).

/// Last node's success flag; consulted by conditional edges.
pub const LAST_ACTION_SUCCESS: &str = "last_action_success";

/// Running AND of per-node success, subject to the configured success policy.
pub const GRAPH_SUCCESS: &str = "graph_success";

/// Ordered sequence of error strings, appended to on failure.
pub const ERRORS: &str = "errors";

/// Structured record of the most recent (sub-)graph run; consumed by the
/// parent tracker when the boundary is a `GraphAgent`. Always stripped from
/// the parent's returned state (invariant 9, spec.md §8).
pub const EXECUTION_SUMMARY: &str = "__execution_summary";

/// Mapping from parent-node-name to pre-resolved compiled sub-graph bundle,
/// placed by the assembler before a `GraphAgent` is invoked. Always stripped
/// from a child's initial state before it runs.
pub const SUBGRAPH_BUNDLES: &str = "subgraph_bundles";

/// The identifier a checkpoint is filed under; set by the runner at the
/// start of a run and consulted by `SuspendAgent` when it raises an
/// interrupt (spec.md §4.5).
pub const THREAD_ID: &str = "thread_id";

/// All reserved keys, for membership checks (e.g. when stripping internal
/// bookkeeping before handing state back to a caller).
pub const ALL: &[&str] = &[
    LAST_ACTION_SUCCESS,
    GRAPH_SUCCESS,
    ERRORS,
    EXECUTION_SUMMARY,
    SUBGRAPH_BUNDLES,
    THREAD_ID,
];

pub fn is_reserved(key: &str) -> bool {
    ALL.contains(&key)
}
