use sc_core::{CollectionError, ScriptCode};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::calls::json_kind;

const CONTEXT_PREVIEW_CHARS: usize = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ExecutableKind {
    Category,
    Script,
}

impl ExecutableKind {
    fn invalid_code(self) -> &'static str {
        match self {
            ExecutableKind::Category => "CATEGORY_INVALID",
            ExecutableKind::Script => "SCRIPT_INVALID",
        }
    }
}

/// Checks one raw executable node and attaches its context to failures.
pub(crate) struct ExecutableValidator<'a> {
    kind: ExecutableKind,
    self_data: &'a JsonValue,
    parent_category: Option<&'a JsonValue>,
}

impl<'a> ExecutableValidator<'a> {
    pub(crate) fn new(
        kind: ExecutableKind,
        self_data: &'a JsonValue,
        parent_category: Option<&'a JsonValue>,
    ) -> Self {
        Self {
            kind,
            self_data,
            parent_category,
        }
    }

    pub(crate) fn object(&self) -> Result<&'a JsonMap<String, JsonValue>, CollectionError> {
        self.self_data.as_object().ok_or_else(|| {
            CollectionError::new(
                "EXECUTABLE_INVALID",
                format!("Executable must be an object, got {}.", json_kind(self.self_data)),
            )
        })
    }

    pub(crate) fn ensure_allowed_keys(&self, allowed: &[&str]) -> Result<(), CollectionError> {
        let object = self.object()?;
        let unexpected = object
            .keys()
            .filter(|key| !allowed.contains(&key.as_str()))
            .map(String::as_str)
            .collect::<Vec<_>>();
        if unexpected.is_empty() {
            return Ok(());
        }
        Err(self.fail(format!(
            "Unexpected property(ies): \"{}\". Allowed: \"{}\".",
            unexpected.join("\", \""),
            allowed.join("\", \"")
        )))
    }

    pub(crate) fn ensure(&self, condition: bool, message: &str) -> Result<(), CollectionError> {
        if condition {
            Ok(())
        } else {
            Err(self.fail(message))
        }
    }

    pub(crate) fn fail(&self, message: impl Into<String>) -> CollectionError {
        CollectionError::new(self.kind.invalid_code(), message)
    }

    /// Marks the deepest node a failure happened on.
    pub(crate) fn contextual(&self, error: CollectionError) -> CollectionError {
        if error.executable.is_some() {
            return error;
        }
        error
            .wrap(self.describe())
            .with_executable(self.self_data, self.parent_category)
    }

    pub(crate) fn boundary(&self, error: CollectionError) -> CollectionError {
        let boundary = match self.kind {
            ExecutableKind::Category => "Failed to parse category.",
            ExecutableKind::Script => "Failed to parse script.",
        };
        self.contextual(error).wrap(boundary)
    }

    fn describe(&self) -> String {
        let mut description = format!("Executable: {}", preview_json(self.self_data));
        if let Some(parent) = self.parent_category {
            description.push_str(&format!("\nParent category: {}", preview_json(parent)));
        }
        description
    }
}

fn preview_json(value: &JsonValue) -> String {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    let total = pretty.chars().count();
    if total <= CONTEXT_PREVIEW_CHARS {
        return pretty;
    }
    let head = pretty.chars().take(CONTEXT_PREVIEW_CHARS).collect::<String>();
    format!("{}… [truncated, {} characters total]", head, total)
}

/// Default docs parser: a string or an array of strings.
pub fn parse_docs(node: &JsonMap<String, JsonValue>) -> Result<Vec<String>, CollectionError> {
    match node.get("docs") {
        None | Some(JsonValue::Null) => Ok(Vec::new()),
        Some(JsonValue::String(doc)) => Ok(vec![doc.clone()]),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| match item {
                JsonValue::String(doc) => Ok(doc.clone()),
                other => Err(CollectionError::new(
                    "INVALID_DOCS_TYPE",
                    format!(
                        "Docs field (documentation) must be an array of strings, found {}.",
                        json_kind(other)
                    ),
                )),
            })
            .collect(),
        Some(other) => Err(CollectionError::new(
            "INVALID_DOCS_TYPE",
            format!(
                "Docs field (documentation) must be a single string or an array of strings, found {}.",
                json_kind(other)
            ),
        )),
    }
}

/// Default name validator for categories and scripts.
pub fn validate_name(value: Option<&JsonValue>) -> Result<String, CollectionError> {
    match value {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => Ok(name.clone()),
        None | Some(JsonValue::Null) | Some(JsonValue::String(_)) => {
            Err(CollectionError::new("EXECUTABLE_INVALID", "Missing name."))
        }
        Some(other) => Err(CollectionError::new(
            "EXECUTABLE_INVALID",
            format!("Name ({}) is not a string but {}.", other, json_kind(other)),
        )),
    }
}

/// Default script code factory.
pub fn create_script_code(execute: &str, revert: Option<&str>) -> Result<ScriptCode, CollectionError> {
    if execute.trim().is_empty() {
        return Err(CollectionError::new("SCRIPT_CODE_EMPTY", "Missing code."));
    }
    let revert = revert.filter(|revert| !revert.trim().is_empty());
    if revert == Some(execute) {
        return Err(CollectionError::new(
            "SCRIPT_REVERT_SAME_AS_CODE",
            "Code itself and its reverting code cannot be the same.",
        ));
    }
    Ok(ScriptCode {
        execute: execute.to_string(),
        revert: revert.map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn docs_accept_string_or_string_array() {
        let node = json!({ "docs": "one" });
        assert_eq!(parse_docs(node.as_object().expect("object")).expect("docs"), vec!["one"]);

        let node = json!({ "docs": ["a", "b"] });
        assert_eq!(
            parse_docs(node.as_object().expect("object")).expect("docs"),
            vec!["a", "b"]
        );

        let node = json!({});
        assert!(parse_docs(node.as_object().expect("object")).expect("docs").is_empty());
    }

    #[test]
    fn docs_of_other_types_are_rejected() {
        for docs in [json!(5), json!({ "a": 1 }), json!(["ok", 3])] {
            let node = json!({ "docs": docs });
            let error = parse_docs(node.as_object().expect("object")).expect_err("bad docs");
            assert_eq!(error.code, "INVALID_DOCS_TYPE");
        }
    }

    #[test]
    fn names_must_be_non_blank_strings() {
        assert_eq!(validate_name(Some(&json!("Clear"))).expect("name"), "Clear");
        for value in [None, Some(json!(null)), Some(json!("  ")), Some(json!(3))] {
            let error = validate_name(value.as_ref()).expect_err("bad name");
            assert_eq!(error.code, "EXECUTABLE_INVALID");
        }
    }

    #[test]
    fn script_code_factory_normalises_revert() {
        let code = create_script_code("echo a", Some("  ")).expect("code");
        assert_eq!(code.revert, None);

        let code = create_script_code("echo a", Some("echo b")).expect("code");
        assert_eq!(code.revert.as_deref(), Some("echo b"));

        let error = create_script_code(" ", None).expect_err("empty");
        assert_eq!(error.code, "SCRIPT_CODE_EMPTY");

        let error = create_script_code("echo a", Some("echo a")).expect_err("same");
        assert_eq!(error.code, "SCRIPT_REVERT_SAME_AS_CODE");
    }

    #[test]
    fn contextual_errors_keep_the_deepest_node() {
        let parent = json!({ "category": "Parent", "children": [] });
        let child = json!({ "name": "child" });
        let inner = ExecutableValidator::new(ExecutableKind::Script, &child, Some(&parent));
        let outer = ExecutableValidator::new(ExecutableKind::Category, &parent, None);

        let error = outer.boundary(inner.boundary(inner.fail("Missing code.")));
        assert_eq!(error.code, "SCRIPT_INVALID");
        let context = error.executable.as_ref().expect("context attached");
        assert_eq!(context.self_data, child);
        assert_eq!(context.parent_category.as_ref(), Some(&parent));
        assert_eq!(error.outermost_context(), Some("Failed to parse category."));
        assert!(error.to_string().contains("Parent category:"));
    }

    #[test]
    fn long_context_is_truncated() {
        let node = json!({ "name": "x".repeat(1000) });
        let preview = preview_json(&node);
        assert!(preview.contains("[truncated"));
    }
}
