use std::collections::BTreeMap;

use sc_core::CollectionError;
use serde_json::Value as JsonValue;

const CALL_PROPERTIES: [&str; 2] = ["function", "parameters"];

/// One invocation of a shared function with its raw argument values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionCall {
    pub function_name: String,
    pub arguments: BTreeMap<String, String>,
}

impl FunctionCall {
    pub fn new(function_name: impl Into<String>) -> Self {
        Self {
            function_name: function_name.into(),
            arguments: BTreeMap::new(),
        }
    }

    pub fn with_argument(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.arguments.insert(name.into(), value.into());
        self
    }
}

/// Accepts a single call object or a non-empty array of them.
pub fn parse_function_calls(data: &JsonValue) -> Result<Vec<FunctionCall>, CollectionError> {
    match data {
        JsonValue::Array(items) => {
            if items.is_empty() {
                return Err(call_error("Call sequence is empty."));
            }
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    parse_function_call(item)
                        .map_err(|error| error.wrap(format!("Failed to parse call #{}.", index + 1)))
                })
                .collect()
        }
        JsonValue::Object(_) => Ok(vec![parse_function_call(data)?]),
        other => Err(call_error(format!(
            "Call must be an object or an array of objects, got {}.",
            json_kind(other)
        ))),
    }
}

fn parse_function_call(data: &JsonValue) -> Result<FunctionCall, CollectionError> {
    let Some(object) = data.as_object() else {
        return Err(call_error(format!(
            "Call must be an object, got {}.",
            json_kind(data)
        )));
    };

    let unexpected = object
        .keys()
        .filter(|key| !CALL_PROPERTIES.contains(&key.as_str()))
        .cloned()
        .collect::<Vec<_>>();
    if !unexpected.is_empty() {
        return Err(call_error(format!(
            "Call has unexpected properties: \"{}\". Allowed: \"{}\".",
            unexpected.join("\", \""),
            CALL_PROPERTIES.join("\", \"")
        )));
    }

    let function_name = match object.get("function") {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => name.clone(),
        Some(JsonValue::String(_)) | None => {
            return Err(call_error("Call is missing the \"function\" name."))
        }
        Some(other) => {
            return Err(call_error(format!(
                "Call \"function\" must be a string, got {}.",
                json_kind(other)
            )))
        }
    };

    let mut call = FunctionCall::new(function_name);
    match object.get("parameters") {
        None | Some(JsonValue::Null) => {}
        Some(JsonValue::Object(parameters)) => {
            for (name, value) in parameters {
                call.arguments
                    .insert(name.clone(), parse_argument_value(name, value)?);
            }
        }
        Some(other) => {
            return Err(call_error(format!(
                "Call \"parameters\" of \"{}\" must be an object, got {}.",
                call.function_name,
                json_kind(other)
            )))
        }
    }
    Ok(call)
}

fn parse_argument_value(name: &str, value: &JsonValue) -> Result<String, CollectionError> {
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(call_error(format!(
            "Argument name \"{}\" must be alphanumeric.",
            name
        )));
    }
    match value {
        JsonValue::String(text) if !text.is_empty() => Ok(text.clone()),
        JsonValue::String(_) | JsonValue::Null => Err(call_error(format!(
            "Missing argument value for the parameter \"{}\".",
            name
        ))),
        other => Err(call_error(format!(
            "Argument \"{}\" must be a string, got {}.",
            name,
            json_kind(other)
        ))),
    }
}

fn call_error(message: impl Into<String>) -> CollectionError {
    CollectionError::new("CALL_INVALID", message)
}

pub(crate) fn json_kind(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn single_call_object_is_accepted() {
        let calls = parse_function_calls(&json!({
            "function": "Greet",
            "parameters": { "who": "World" }
        }))
        .expect("call should parse");
        assert_eq!(
            calls,
            vec![FunctionCall::new("Greet").with_argument("who", "World")]
        );
    }

    #[test]
    fn call_sequence_keeps_declaration_order() {
        let calls = parse_function_calls(&json!([
            { "function": "B" },
            { "function": "A", "parameters": {} }
        ]))
        .expect("calls should parse");
        let names = calls
            .iter()
            .map(|call| call.function_name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["B", "A"]);
    }

    #[test]
    fn malformed_calls_are_rejected() {
        for data in [
            json!([]),
            json!("Greet"),
            json!({ "parameters": {} }),
            json!({ "function": "  " }),
            json!({ "function": 3 }),
            json!({ "function": "A", "unknown": true }),
            json!({ "function": "A", "parameters": [] }),
            json!({ "function": "A", "parameters": { "x": "" } }),
            json!({ "function": "A", "parameters": { "x": 1 } }),
            json!({ "function": "A", "parameters": { "bad name": "v" } }),
        ] {
            let error = parse_function_calls(&data).expect_err("invalid call");
            assert_eq!(error.code, "CALL_INVALID", "{}", data);
        }
    }

    #[test]
    fn errors_in_sequences_name_the_call_position() {
        let error = parse_function_calls(&json!([{ "function": "A" }, { "function": "" }]))
            .expect_err("second call invalid");
        assert_eq!(error.outermost_context(), Some("Failed to parse call #2."));
    }
}
