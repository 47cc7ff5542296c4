//! Multi-output validation (spec.md §4.1 "Multi-output validation").
//!
//! Applies when an agent declares two or more output fields. The process
//! output is coerced against the declared field set under one of three
//! policies; `warn` (the default) is the composition contract for fan-out
//! workflows, so it preserves extras while flagging drops.

use crate::agent::{OutputValidation, ProcessOutput};
use crate::error::AgentMapError;
use serde_json::{Map, Value};

/// Runs multi-output validation for a process `output` against the declared
/// field set `fields` (`fields.len() >= 2`), per `mode`. Returns the
/// state-updates partial (declared fields plus any preserved extras).
pub fn validate_multi_output(
    node_name: &str,
    fields: &[String],
    mode: OutputValidation,
    output: ProcessOutput,
) -> Result<Map<String, Value>, AgentMapError> {
    let out_map = match output {
        ProcessOutput::StateUpdates(m) => return Ok(m),
        ProcessOutput::Value(Value::Object(m)) => m,
        ProcessOutput::Value(other) => {
            // Graceful degradation: non-mapping output for a multi-output agent.
            return match mode {
                OutputValidation::Error => Err(AgentMapError::MultiOutputTypeError(format!(
                    "node '{node_name}' declares {} output fields but process() returned a non-mapping value",
                    fields.len()
                ))),
                OutputValidation::Warn => {
                    tracing::warn!(
                        node = node_name,
                        "multi-output agent returned a non-mapping value; degrading to first declared field"
                    );
                    let mut m = Map::new();
                    if let Some(first) = fields.first() {
                        m.insert(first.clone(), other);
                    }
                    Ok(m)
                }
                OutputValidation::Ignore => {
                    let mut m = Map::new();
                    if let Some(first) = fields.first() {
                        m.insert(first.clone(), other);
                    }
                    Ok(m)
                }
            };
        }
        ProcessOutput::None => Map::new(),
    };

    let keys: std::collections::HashSet<&str> = out_map.keys().map(String::as_str).collect();
    let declared: std::collections::HashSet<&str> = fields.iter().map(String::as_str).collect();
    let missing: Vec<&str> = fields
        .iter()
        .map(String::as_str)
        .filter(|f| !keys.contains(f))
        .collect();
    let extra: Vec<&str> = out_map
        .keys()
        .map(String::as_str)
        .filter(|k| !declared.contains(k))
        .collect();

    match mode {
        OutputValidation::Ignore => {
            let mut result = Map::new();
            for f in fields {
                result.insert(f.clone(), out_map.get(f).cloned().unwrap_or(Value::Null));
            }
            Ok(result)
        }
        OutputValidation::Warn => {
            if !missing.is_empty() {
                tracing::warn!(node = node_name, missing = ?missing, "multi-output agent did not return all declared fields");
            }
            if !extra.is_empty() {
                tracing::warn!(node = node_name, extra = ?extra, "multi-output agent returned undeclared fields");
            }
            let mut result = out_map;
            for f in &missing {
                result.insert((*f).to_string(), Value::Null);
            }
            Ok(result)
        }
        OutputValidation::Error => {
            if !missing.is_empty() || !extra.is_empty() {
                Err(AgentMapError::MultiOutputValidationError(format!(
                    "node '{node_name}': missing declared fields {missing:?}, extra fields {extra:?}"
                )))
            } else {
                Ok(out_map)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields() -> Vec<String> {
        vec!["a".into(), "b".into(), "c".into()]
    }

    #[test]
    fn warn_mode_preserves_extras_and_nulls_missing() {
        let mut m = Map::new();
        m.insert("a".into(), json!(1));
        m.insert("b".into(), json!(2));
        m.insert("d".into(), json!(9));
        let result = validate_multi_output(
            "X",
            &fields(),
            OutputValidation::Warn,
            ProcessOutput::Value(Value::Object(m)),
        )
        .unwrap();
        assert_eq!(result.get("a"), Some(&json!(1)));
        assert_eq!(result.get("b"), Some(&json!(2)));
        assert_eq!(result.get("c"), Some(&Value::Null));
        assert_eq!(result.get("d"), Some(&json!(9)));
    }

    #[test]
    fn error_mode_rejects_missing_and_extra() {
        let mut m = Map::new();
        m.insert("a".into(), json!(1));
        m.insert("b".into(), json!(2));
        m.insert("d".into(), json!(9));
        let result = validate_multi_output(
            "X",
            &fields(),
            OutputValidation::Error,
            ProcessOutput::Value(Value::Object(m)),
        );
        match result {
            Err(AgentMapError::MultiOutputValidationError(msg)) => {
                assert!(msg.contains('c'));
                assert!(msg.contains('d'));
            }
            other => panic!("expected MultiOutputValidationError, got {other:?}"),
        }
    }

    #[test]
    fn ignore_mode_drops_extras_silently() {
        let mut m = Map::new();
        m.insert("a".into(), json!(1));
        m.insert("d".into(), json!(9));
        let result = validate_multi_output(
            "X",
            &fields(),
            OutputValidation::Ignore,
            ProcessOutput::Value(Value::Object(m)),
        )
        .unwrap();
        assert_eq!(result.len(), 3);
        assert!(!result.contains_key("d"));
        assert_eq!(result.get("c"), Some(&Value::Null));
    }

    #[test]
    fn non_mapping_output_degrades_to_first_field_in_warn_mode() {
        let result = validate_multi_output(
            "X",
            &fields(),
            OutputValidation::Warn,
            ProcessOutput::Value(json!("plain string")),
        )
        .unwrap();
        assert_eq!(result.get("a"), Some(&json!("plain string")));
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn non_mapping_output_errors_in_error_mode() {
        let result = validate_multi_output(
            "X",
            &fields(),
            OutputValidation::Error,
            ProcessOutput::Value(json!("plain string")),
        );
        assert!(matches!(result, Err(AgentMapError::MultiOutputTypeError(_))));
    }

    #[test]
    fn state_updates_wrapper_passes_through_verbatim() {
        let mut m = Map::new();
        m.insert("anything".into(), json!(true));
        let result = validate_multi_output(
            "X",
            &fields(),
            OutputValidation::Error,
            ProcessOutput::StateUpdates(m.clone()),
        )
        .unwrap();
        assert_eq!(result, m);
    }
}
