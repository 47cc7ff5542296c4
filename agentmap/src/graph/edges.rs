//! Edge representation and the edge-resolution rules (spec.md §4.3).
//!
//! A node's edge map has at most three labels: `success`, `failure`,
//! `default`. Any of the three may carry a `func:NAME` value instead of a
//! literal target; a function edge always supersedes label edges.

use crate::error::AgentMapError;
use crate::state::StateBag;
use std::sync::Arc;

/// A single edge's target: a literal node name, or a `func:NAME` routing
/// function reference.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeValue {
    Literal(String),
    Func(String),
}

impl EdgeValue {
    /// Parses a raw CSV edge cell. `func:NAME` becomes `Func(NAME)`; anything
    /// else (including empty checks are the caller's responsibility) becomes
    /// a literal target.
    pub fn parse(raw: &str) -> Self {
        match raw.strip_prefix("func:") {
            Some(name) => EdgeValue::Func(name.to_string()),
            None => EdgeValue::Literal(raw.to_string()),
        }
    }

    pub fn as_literal(&self) -> Option<&str> {
        match self {
            EdgeValue::Literal(s) => Some(s.as_str()),
            EdgeValue::Func(_) => None,
        }
    }
}

/// The three edge labels a node may declare a transition under.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeMap {
    pub success: Option<EdgeValue>,
    pub failure: Option<EdgeValue>,
    pub default: Option<EdgeValue>,
}

impl EdgeMap {
    /// Builds an `EdgeMap` from `(label, raw_value)` pairs, as would come
    /// straight off a CSV row's `Edge`/`Success_Next`/`Failure_Next`
    /// columns. Any label outside `{success, failure, default}` is a hard
    /// assembly error (spec.md §4.3).
    pub fn from_labeled(
        entries: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, AgentMapError> {
        let mut map = EdgeMap::default();
        for (label, raw) in entries {
            let value = EdgeValue::parse(&raw);
            match label.as_str() {
                "success" => map.success = Some(value),
                "failure" => map.failure = Some(value),
                "default" => map.default = Some(value),
                other => {
                    return Err(AgentMapError::ValidationError(format!(
                        "unknown edge label '{other}'"
                    )))
                }
            }
        }
        Ok(map)
    }

    /// The function-resolution routing name, if any edge is a `func:NAME`
    /// reference. Function edges win over every label edge.
    pub fn routing_function(&self) -> Option<&str> {
        [&self.success, &self.failure, &self.default]
            .into_iter()
            .flatten()
            .find_map(|v| match v {
                EdgeValue::Func(name) => Some(name.as_str()),
                EdgeValue::Literal(_) => None,
            })
    }

    pub fn is_terminal(&self) -> bool {
        self.success.is_none() && self.failure.is_none() && self.default.is_none()
    }
}

/// A resolved routing function: `(state, success_target, failure_target) ->
/// next node name, or None to terminate` (spec.md §6, §9 "Routing
/// functions").
pub type RoutingFn = Arc<dyn Fn(&StateBag, Option<&str>, Option<&str>) -> Option<String> + Send + Sync>;

/// Resolves the next node name for a node's edge map against the current
/// state, per the tie-break order in spec.md §4.3: function edges win over
/// label edges; `success`+`failure` pair wins over a single label;
/// `default` is a last resort; otherwise the node is terminal.
///
/// `resolve_routing_fn` looks up a `func:NAME` reference by name; assembly
/// must have already verified it exists (missing functions fail assembly,
/// not run-time — spec.md §4.3).
pub fn resolve_edge(
    edges: &EdgeMap,
    state: &StateBag,
    resolve_routing_fn: impl FnOnce(&str) -> Option<RoutingFn>,
) -> Option<String> {
    if let Some(func_name) = edges.routing_function() {
        let success_target = edges.success.as_ref().and_then(EdgeValue::as_literal);
        let failure_target = edges.failure.as_ref().and_then(EdgeValue::as_literal);
        let routing_fn = resolve_routing_fn(func_name)?;
        return routing_fn(state, success_target, failure_target);
    }

    let last_success = state.get_bool(crate::state::reserved::LAST_ACTION_SUCCESS);

    match (&edges.success, &edges.failure) {
        (Some(s), Some(f)) => {
            if last_success {
                s.as_literal().map(|s| s.to_string())
            } else {
                f.as_literal().map(|s| s.to_string())
            }
        }
        (Some(s), None) => {
            if last_success {
                s.as_literal().map(|s| s.to_string())
            } else {
                None
            }
        }
        (None, Some(f)) => {
            if !last_success {
                f.as_literal().map(|s| s.to_string())
            } else {
                None
            }
        }
        (None, None) => edges.default.as_ref().and_then(EdgeValue::as_literal).map(|s| s.to_string()),
    }
}
