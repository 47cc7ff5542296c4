//! The fixed `run` pipeline (spec.md §4.1): input projection, tracking,
//! pre/process/post hooks, output coercion, and error containment. This is
//! the one place the pipeline's step order is encoded; every concrete agent
//! goes through it unmodified.

use crate::agent::validation::validate_multi_output;
use crate::agent::{Agent, ProcessOutput};
use crate::error::AgentMapError;
use crate::services::providers::MappingFn;
use crate::state::{adapter, reserved, StateBag};
use serde_json::{json, Map, Value};

/// Resolves `func:NAME` input-field references. The engine passes this in
/// rather than storing it on the agent, since function resolution is a
/// framework-level capability, not something every agent need declare.
pub type MappingResolver<'a> = dyn Fn(&str) -> Option<MappingFn> + Send + Sync + 'a;

fn prior_errors(state: &StateBag) -> Vec<Value> {
    match state.get(reserved::ERRORS) {
        Some(Value::Array(v)) => v.clone(),
        _ => Vec::new(),
    }
}

fn error_partial(name: &str, state: &StateBag, message: String) -> StateBag {
    let mut errors = prior_errors(state);
    errors.push(Value::String(format!("error in {name}: {message}")));
    let mut partial = StateBag::new();
    partial.insert(reserved::LAST_ACTION_SUCCESS, json!(false));
    partial.insert(reserved::ERRORS, Value::Array(errors));
    partial
}

fn success_partial(
    name: &str,
    output_fields: &[String],
    output_validation: crate::agent::OutputValidation,
    output: ProcessOutput,
) -> Result<StateBag, AgentMapError> {
    // Step 6 bullet 1 applies before field-count branching: a `state_updates`
    // escape hatch is returned verbatim, and — since it is how a hook like
    // `GraphAgent::post_process` sets `last_action_success` to something
    // other than the node's own outcome (spec.md §4.4: "the last_action
    // flag for the parent node is the child's graph_success") — an explicit
    // `last_action_success` already present in M is not clobbered by step 7.
    let (map, explicit_success) = match output {
        ProcessOutput::StateUpdates(m) => {
            let explicit = m.get(reserved::LAST_ACTION_SUCCESS).cloned();
            (m, explicit)
        }
        other => {
            let map = match output_fields.len() {
                0 => Map::new(),
                1 => match other {
                    ProcessOutput::None => Map::new(),
                    ProcessOutput::Value(v) => {
                        let mut m = Map::new();
                        m.insert(output_fields[0].clone(), v);
                        m
                    }
                    ProcessOutput::StateUpdates(_) => unreachable!("handled above"),
                },
                _ => validate_multi_output(name, output_fields, output_validation, other)?,
            };
            (map, None)
        }
    };
    let mut partial = StateBag::new();
    for (k, v) in map {
        partial.insert(k, v);
    }
    if explicit_success.is_none() {
        partial.insert(reserved::LAST_ACTION_SUCCESS, json!(true));
    }
    Ok(partial)
}

fn snapshot(bag: &StateBag) -> Value {
    Value::Object(bag.as_map().iter().map(|(k, v)| (k.clone(), v.clone())).collect())
}

/// Runs the full lifecycle pipeline for a fresh (non-resumed) invocation.
///
/// Returns `Ok(partial)` for every outcome except a suspension, which
/// propagates as `Err(AgentMapError::InterruptSignal(..))` for the outer
/// driver to catch and persist (spec.md §7 propagation policy).
pub async fn run(
    agent: &dyn Agent,
    state: &StateBag,
    resolve_mapping_fn: &MappingResolver<'_>,
) -> Result<StateBag, AgentMapError> {
    let identity = agent.identity();
    let inputs = adapter::get_inputs(state, &identity.input_fields, resolve_mapping_fn);

    if let Some(tracker) = identity.execution_tracker() {
        tracker
            .lock()
            .expect("tracker lock poisoned")
            .record_node_start(&identity.name, snapshot(&inputs));
    }

    let outcome = run_inner(agent, state, inputs).await;
    finish(agent, state, outcome).await
}

/// Re-entry after a suspension resumes (spec.md §4.5): re-projects inputs and
/// re-runs `pre_process` (idempotent by contract), then substitutes
/// `resume_value` for what `process` would have returned and continues from
/// post-process onward.
pub async fn run_resumed(
    agent: &dyn Agent,
    state: &StateBag,
    resolve_mapping_fn: &MappingResolver<'_>,
    resume_value: Value,
) -> Result<StateBag, AgentMapError> {
    let identity = agent.identity();
    let inputs = adapter::get_inputs(state, &identity.input_fields, resolve_mapping_fn);

    if let Some(tracker) = identity.execution_tracker() {
        tracker
            .lock()
            .expect("tracker lock poisoned")
            .record_node_start(&identity.name, snapshot(&inputs));
    }

    let outcome: Result<(StateBag, StateBag, ProcessOutput), AgentMapError> = async {
        let (state2, inputs2) = agent.pre_process(state, inputs).await?;
        let output = agent.resume(resume_value).await?;
        Ok((state2, inputs2, output))
    }
    .await;

    finish(agent, state, outcome).await
}

async fn run_inner(
    agent: &dyn Agent,
    state: &StateBag,
    inputs: StateBag,
) -> Result<(StateBag, StateBag, ProcessOutput), AgentMapError> {
    let (state2, inputs2) = agent.pre_process(state, inputs).await?;
    let output = agent.process(&inputs2).await?;
    Ok((state2, inputs2, output))
}

async fn finish(
    agent: &dyn Agent,
    original_state: &StateBag,
    outcome: Result<(StateBag, StateBag, ProcessOutput), AgentMapError>,
) -> Result<StateBag, AgentMapError> {
    let identity = agent.identity();

    let result = match outcome {
        Ok((state2, inputs2, output)) => {
            match agent.post_process(&state2, &inputs2, output).await {
                Ok(output) => success_partial(
                    &identity.name,
                    &identity.output_fields,
                    identity.output_validation,
                    output,
                ),
                Err(e) => Err(e),
            }
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(partial) => {
            if let Some(tracker) = identity.execution_tracker() {
                tracker.lock().expect("tracker lock poisoned").record_node_result(
                    &identity.name,
                    true,
                    snapshot(&partial),
                );
            }
            Ok(partial)
        }
        Err(e) if e.is_interrupt() => Err(e),
        Err(e) => {
            let partial = error_partial(&identity.name, original_state, e.to_string());
            if let Some(tracker) = identity.execution_tracker() {
                tracker.lock().expect("tracker lock poisoned").record_node_result(
                    &identity.name,
                    false,
                    json!({"error": e.to_string()}),
                );
            }
            Ok(partial)
        }
    }
}
