//! The state adapter (spec.md §4.7): the shim that reads/writes the state bag
//! regardless of its concrete representation.
//!
//! The runtime only ever sees [`crate::state::StateBag`], so in practice this
//! module's two operations — `get_inputs` and `set_value` — are what every
//! other layer calls instead of touching the map directly. Reserved-key
//! handling (spec.md §3) is performed by callers, not here.

use crate::graph::node_spec::InputField;
use crate::services::providers::MappingFn;
use crate::state::StateBag;

/// Projects `state` down to the subset described by `input_fields`
/// (spec.md §4.1 step 1):
///
/// - A bare `Name(n)` copies `state[n]` to `inputs[n]` (omitted if absent).
/// - A `Mapped { target, source }` sets `inputs[target] = state[source]`
///   (omitted if `source` is absent from `state`).
/// - A `Func(name)` replaces the *entire* projection with the result of
///   invoking the resolved mapping function on the full state. Since at most
///   one `Func` entry is allowed per node (enforced at parse time), this case
///   short-circuits: any other declared fields are ignored, matching "the
///   entire projection is replaced".
///
/// `resolve_fn` looks up a `func:NAME` reference; a name the resolver can't
/// find yields `inputs = {}` rather than failing, since by the time a node
/// runs, function references were already validated at assembly (spec.md
/// §4.3 "missing functions fail assembly, not run-time").
pub fn get_inputs(
    state: &StateBag,
    input_fields: &[InputField],
    resolve_fn: impl Fn(&str) -> Option<MappingFn>,
) -> StateBag {
    if let Some(InputField::Func(name)) = input_fields
        .iter()
        .find(|f| matches!(f, InputField::Func(_)))
    {
        return match resolve_fn(name) {
            Some(f) => f(state),
            None => StateBag::new(),
        };
    }

    let mut inputs = StateBag::new();
    for field in input_fields {
        match field {
            InputField::Name(name) => {
                if let Some(v) = state.get(name) {
                    inputs.insert(name.clone(), v.clone());
                }
            }
            InputField::Mapped { target, source } => {
                if let Some(v) = state.get(source) {
                    inputs.insert(target.clone(), v.clone());
                }
            }
            InputField::Func(_) => unreachable!("handled above"),
        }
    }
    inputs
}

/// Returns a copy of `state` with `key` set to `value`. Implementations of a
/// typed or validated state representation would mutate-in-place or
/// copy-on-write here instead; the bag is already cheap to clone.
pub fn set_value(state: &StateBag, key: &str, value: serde_json::Value) -> StateBag {
    let mut next = state.clone();
    next.insert(key.to_string(), value);
    next
}
