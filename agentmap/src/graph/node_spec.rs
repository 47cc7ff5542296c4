//! The compiled-time node record (spec.md §3 "Node (compiled)"): the
//! assembler's input, one per CSV row, immutable once parsed.

use crate::error::AgentMapError;
use crate::graph::edges::EdgeMap;
use serde_json::Value;

/// One entry of a node's `input_fields` list.
#[derive(Debug, Clone, PartialEq)]
pub enum InputField {
    /// A bare name: passthrough `state[name] -> inputs[name]`.
    Name(String),
    /// `target=source`: `inputs[target] = state[source]`.
    Mapped { target: String, source: String },
    /// `func:NAME`: the entire projection is replaced by invoking the named
    /// function on the full state.
    Func(String),
}

/// Parses a pipe-separated `Input_Fields` cell into its entries. At most one
/// entry may be a `func:NAME` reference; a second one is a hard assembly
/// error (the spec's "exactly one function reference" invariant, spec.md
/// §3 "Node (compiled)").
pub fn parse_input_fields(raw: &str) -> Result<Vec<InputField>, AgentMapError> {
    let mut fields = Vec::new();
    let mut seen_func = false;
    for entry in raw.split('|').map(str::trim).filter(|s| !s.is_empty()) {
        let field = if let Some(name) = entry.strip_prefix("func:") {
            if seen_func {
                return Err(AgentMapError::ValidationError(format!(
                    "input_fields carries more than one func: reference ('{entry}')"
                )));
            }
            seen_func = true;
            InputField::Func(name.to_string())
        } else if let Some((target, source)) = entry.split_once('=') {
            InputField::Mapped {
                target: target.trim().to_string(),
                source: source.trim().to_string(),
            }
        } else {
            InputField::Name(entry.to_string())
        };
        fields.push(field);
    }
    Ok(fields)
}

/// Parses a pipe-separated `Output_Field` cell. Two or more entries trigger
/// multi-output validation (spec.md §4.1).
pub fn parse_output_fields(raw: &str) -> Vec<String> {
    raw.split('|')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a `Context` cell: JSON when it begins with `{`, else a free-form
/// string wrapped as `{"__raw": "..."}` so callers always get an object to
/// look reserved keys up in (spec.md §6).
pub fn parse_context(raw: &str) -> Result<Value, AgentMapError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Value::Object(Default::default()));
    }
    if trimmed.starts_with('{') {
        serde_json::from_str(trimmed)
            .map_err(|e| AgentMapError::ValidationError(format!("malformed context JSON: {e}")))
    } else {
        let mut obj = serde_json::Map::new();
        obj.insert("__raw".to_string(), Value::String(trimmed.to_string()));
        Ok(Value::Object(obj))
    }
}

/// One row of the parsed node set handed to the Graph Assembly Engine
/// (spec.md §3, §4.3). Immutable after construction.
#[derive(Debug, Clone)]
pub struct NodeSpec {
    pub name: String,
    pub agent_type: String,
    pub prompt: String,
    pub context: Value,
    pub input_fields: Vec<InputField>,
    pub output_fields: Vec<String>,
    pub edges: EdgeMap,
}

impl NodeSpec {
    /// Reads a reserved context key, defaulting to `None` if absent.
    pub fn context_str(&self, key: &str) -> Option<&str> {
        self.context.get(key).and_then(Value::as_str)
    }

    pub fn context_get(&self, key: &str) -> Option<&Value> {
        self.context.get(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_input_fields_handles_all_three_forms() {
        let fields = parse_input_fields("msg|target=source|func:my_fn").unwrap();
        assert_eq!(
            fields,
            vec![
                InputField::Name("msg".to_string()),
                InputField::Mapped {
                    target: "target".to_string(),
                    source: "source".to_string()
                },
                InputField::Func("my_fn".to_string()),
            ]
        );
    }

    #[test]
    fn parse_input_fields_rejects_second_func_reference() {
        let result = parse_input_fields("func:a|func:b");
        assert!(matches!(result, Err(AgentMapError::ValidationError(_))));
    }

    #[test]
    fn parse_output_fields_splits_on_pipe() {
        assert_eq!(
            parse_output_fields("a|b|c"),
            vec!["a".to_string(), "b".to_string(), "c".to_string()]
        );
    }

    #[test]
    fn parse_context_json_vs_free_form() {
        let json_ctx = parse_context(r#"{"provider":"openai"}"#).unwrap();
        assert_eq!(json_ctx.get("provider").unwrap(), "openai");

        let free_form = parse_context("a free-form prompt hint").unwrap();
        assert_eq!(free_form.get("__raw").unwrap(), "a free-form prompt hint");

        let empty = parse_context("").unwrap();
        assert!(empty.as_object().unwrap().is_empty());
    }

    #[test]
    fn parse_context_rejects_malformed_json() {
        let result = parse_context("{not json");
        assert!(matches!(result, Err(AgentMapError::ValidationError(_))));
    }
}
