//! `{field}` substitution shared by the built-ins that assemble free text
//! out of projected inputs (`Summary`, `LLM`).

use crate::state::StateBag;
use serde_json::Value;

pub(crate) fn value_to_text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Renders `template`, substituting `{field}` with the stringified value of
/// `inputs[field]` (blank if absent). Falls back to a pipe-joined
/// concatenation of every input when no template is configured.
pub(crate) fn render(template: Option<&str>, inputs: &StateBag) -> String {
    match template {
        Some(tpl) => {
            let mut out = String::with_capacity(tpl.len());
            let mut chars = tpl.chars().peekable();
            while let Some(c) = chars.next() {
                if c == '{' {
                    let mut name = String::new();
                    let mut closed = false;
                    for c2 in chars.by_ref() {
                        if c2 == '}' {
                            closed = true;
                            break;
                        }
                        name.push(c2);
                    }
                    if closed {
                        let value = inputs.get(name.trim()).map(value_to_text).unwrap_or_default();
                        out.push_str(&value);
                    } else {
                        out.push('{');
                        out.push_str(&name);
                    }
                } else {
                    out.push(c);
                }
            }
            out
        }
        None => inputs
            .as_map()
            .values()
            .map(value_to_text)
            .collect::<Vec<_>>()
            .join(" | "),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn substitutes_known_fields_and_blanks_unknown() {
        let mut inputs = StateBag::new();
        inputs.insert("name", json!("Ada"));
        assert_eq!(render(Some("hi {name}, {missing}"), &inputs), "hi Ada, ");
    }

    #[test]
    fn no_template_joins_all_inputs() {
        let mut inputs = StateBag::new();
        inputs.insert("a", json!("x"));
        assert_eq!(render(None, &inputs), "x");
    }
}
