//! `{{parameter}}` substitution for prompts.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use serde_json::{Map, Value};

use crate::error::{AgentError, Result};

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").expect("placeholder regex is valid")
    })
}

fn key_regex() -> &'static Regex {
    static KEY: OnceLock<Regex> = OnceLock::new();
    KEY.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9_]+$").expect("parameter key regex is valid")
    })
}

/// Substitute `{{name}}` placeholders with values from `parameters`.
///
/// Strings are inserted verbatim, other values as compact JSON. Placeholders without
/// a matching parameter are left untouched.
pub fn render(template: &str, parameters: &Map<String, Value>) -> Result<String> {
    if let Some(bad) = parameters.keys().find(|key| !key_regex().is_match(key)) {
        return Err(AgentError::Template(format!(
            "Prompt parameter key '{bad}' can only contain letters, digits, or underscores"
        )));
    }
    if parameters.is_empty() {
        return Ok(template.to_string());
    }

    let rendered = placeholder_regex().replace_all(template, |caps: &Captures<'_>| {
        match parameters.get(&caps[1]) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => caps[0].to_string(),
        }
    });
    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn substitutes_strings_and_values() {
        let out = render(
            "Hello {{name}}, you have {{ count }} items: {{items}}",
            &params(json!({"name": "Ada", "count": 3, "items": ["a", "b"]})),
        )
        .unwrap();
        assert_eq!(out, r#"Hello Ada, you have 3 items: ["a","b"]"#);
    }

    #[test]
    fn keeps_unknown_placeholders() {
        let out = render("Hi {{who}}", &params(json!({"other": 1}))).unwrap();
        assert_eq!(out, "Hi {{who}}");
    }

    #[test]
    fn rejects_invalid_parameter_keys() {
        let err = render("Hi", &params(json!({"bad-key": 1}))).unwrap_err();
        assert!(matches!(err, AgentError::Template(_)));
    }
}
