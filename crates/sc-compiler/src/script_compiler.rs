use sc_core::{CollectionError, ScriptCode, ScriptLanguage};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::call_compiler::compile_function_calls;
use crate::calls::parse_function_calls;
use crate::executable::create_script_code;
use crate::functions::{parse_shared_functions, SharedFunctionRegistry};
use crate::validation::{validate_code, CodeValidationRule};

// Calling one function twice legitimately repeats lines.
const COMPILED_CODE_RULES: [CodeValidationRule; 2] = [
    CodeValidationRule::NoEmptyLines,
    CodeValidationRule::NoTooLongLines,
];

/// Turns a script's `call` declaration into final code using the shared
/// functions of its collection.
#[derive(Debug, Clone)]
pub struct ScriptCompiler {
    registry: SharedFunctionRegistry,
    language: ScriptLanguage,
}

impl ScriptCompiler {
    pub fn new(functions: Option<&JsonValue>, language: ScriptLanguage) -> Result<Self, CollectionError> {
        Ok(Self::with_registry(
            parse_shared_functions(functions, language)?,
            language,
        ))
    }

    pub fn with_registry(registry: SharedFunctionRegistry, language: ScriptLanguage) -> Self {
        Self { registry, language }
    }

    pub fn language(&self) -> ScriptLanguage {
        self.language
    }

    pub fn registry(&self) -> &SharedFunctionRegistry {
        &self.registry
    }

    pub fn can_compile(&self, script: &JsonMap<String, JsonValue>) -> bool {
        !matches!(script.get("call"), None | Some(JsonValue::Null))
    }

    pub fn compile(&self, name: &str, call: &JsonValue) -> Result<ScriptCode, CollectionError> {
        self.compile_calls(call)
            .map_err(|error| error.wrap(format!("Failed to compile script: {}", name)))
            .map(|code| {
                debug!(script = name, lines = code.execute.lines().count(), "compiled script");
                code
            })
    }

    fn compile_calls(&self, call: &JsonValue) -> Result<ScriptCode, CollectionError> {
        let calls = parse_function_calls(call)?;
        let compiled = compile_function_calls(&calls, &self.registry)?;
        validate_code(&compiled.code, self.language, &COMPILED_CODE_RULES)?;
        if let Some(revert) = &compiled.revert_code {
            validate_code(revert, self.language, &COMPILED_CODE_RULES)?;
        }
        create_script_code(&compiled.code, compiled.revert_code.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compiler(language: ScriptLanguage) -> ScriptCompiler {
        ScriptCompiler::new(
            Some(&json!([
                {
                    "name": "Greet",
                    "parameters": [{ "name": "who" }],
                    "code": "echo hello {{ $who }}",
                    "revertCode": "echo bye {{ $who }}"
                },
                { "name": "Plain", "code": "echo plain" },
                { "name": "Long", "parameters": [{ "name": "text" }], "code": "{{ $text }}" }
            ])),
            language,
        )
        .expect("compiler should build")
    }

    #[test]
    fn can_compile_only_scripts_with_calls() {
        let compiler = compiler(ScriptLanguage::Shellscript);
        let with_call = json!({ "name": "a", "call": { "function": "Plain" } });
        let with_code = json!({ "name": "b", "code": "echo b" });
        assert!(compiler.can_compile(with_call.as_object().expect("object")));
        assert!(!compiler.can_compile(with_code.as_object().expect("object")));
    }

    #[test]
    fn compiles_call_into_script_code() {
        let code = compiler(ScriptLanguage::Shellscript)
            .compile(
                "Run",
                &json!({ "function": "Greet", "parameters": { "who": "World" } }),
            )
            .expect("compile");
        assert_eq!(code.execute, "echo hello World");
        assert_eq!(code.revert.as_deref(), Some("echo bye World"));
    }

    #[test]
    fn repeated_calls_may_produce_duplicate_lines() {
        let code = compiler(ScriptLanguage::Shellscript)
            .compile("Twice", &json!([{ "function": "Plain" }, { "function": "Plain" }]))
            .expect("duplicate lines are fine");
        assert_eq!(code.execute, "echo plain\necho plain");
    }

    #[test]
    fn failures_name_the_script() {
        let error = compiler(ScriptLanguage::Shellscript)
            .compile("Broken", &json!({ "function": "Missing" }))
            .expect_err("unknown function");
        assert_eq!(error.code, "UNKNOWN_FUNCTION");
        assert_eq!(error.outermost_context(), Some("Failed to compile script: Broken"));
    }

    #[test]
    fn compiled_lines_respect_language_length_limit() {
        let long_line = "x".repeat(9000);
        let call = json!({ "function": "Long", "parameters": { "text": long_line } });

        let error = compiler(ScriptLanguage::Batchfile)
            .compile("Long", &call)
            .expect_err("too long for batchfile");
        assert_eq!(error.code, "CODE_VALIDATION_FAILED");

        compiler(ScriptLanguage::Shellscript)
            .compile("Long", &call)
            .expect("fits shellscript limit");
    }
}
