use std::collections::BTreeMap;

use sc_core::CollectionError;
use tracing::trace;

use crate::calls::FunctionCall;
use crate::functions::{
    CompositeCall, FunctionBody, InlineCode, SharedFunction, SharedFunctionRegistry,
};

/// Code produced by one call or a merged call sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledCode {
    pub code: String,
    pub revert_code: Option<String>,
}

/// Compiles calls in order and merges their outputs line-wise.
pub fn compile_function_calls(
    calls: &[FunctionCall],
    registry: &SharedFunctionRegistry,
) -> Result<CompiledCode, CollectionError> {
    let mut compiled = Vec::new();
    for call in calls {
        compile_call(call, registry, &mut compiled)?;
    }
    Ok(merge(compiled))
}

fn compile_call(
    call: &FunctionCall,
    registry: &SharedFunctionRegistry,
    compiled: &mut Vec<CompiledCode>,
) -> Result<(), CollectionError> {
    let function = registry.require(&call.function_name)?;
    ensure_arguments_match(function, call)?;
    trace!(function = %function.name, arguments = call.arguments.len(), "compiling call");

    match &function.body {
        FunctionBody::InlineCode(inline) => {
            compiled.push(render_inline(inline, &call.arguments)?);
        }
        FunctionBody::Composite(nested_calls) => {
            for nested in nested_calls {
                let nested_call = compile_nested_arguments(nested, &call.arguments, registry)
                    .and_then(|nested_call| {
                        compile_call(&nested_call, registry, compiled)?;
                        Ok(nested_call)
                    });
                nested_call.map_err(|error| {
                    error.wrap(format!(
                        "Error with call to \"{}\" function from \"{}\" function.",
                        nested.call.function_name, function.name
                    ))
                })?;
            }
        }
    }
    Ok(())
}

fn ensure_arguments_match(
    function: &SharedFunction,
    call: &FunctionCall,
) -> Result<(), CollectionError> {
    let unexpected = call
        .arguments
        .keys()
        .filter(|name| function.parameters.get(name).is_none())
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !unexpected.is_empty() {
        let expected = function.parameters.names();
        return Err(CollectionError::new(
            "UNEXPECTED_ARGUMENT",
            format!(
                "Function \"{}\" has unexpected parameter(s) provided: \"{}\". Expected parameter(s): {}",
                function.name,
                unexpected.join("\", \""),
                if expected.is_empty() {
                    "none".to_string()
                } else {
                    format!("\"{}\"", expected.join("\", \""))
                }
            ),
        ));
    }

    let missing = function
        .parameters
        .required()
        .filter(|parameter| {
            call.arguments
                .get(&parameter.name)
                .map_or(true, |value| value.trim().is_empty())
        })
        .map(|parameter| parameter.name.as_str())
        .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(CollectionError::new(
            "MISSING_ARGUMENT",
            format!(
                "Function \"{}\" is missing required parameter(s): \"{}\".",
                function.name,
                missing.join("\", \"")
            ),
        ));
    }
    Ok(())
}

fn render_inline(
    inline: &InlineCode,
    arguments: &BTreeMap<String, String>,
) -> Result<CompiledCode, CollectionError> {
    let code = inline.code_template.render(arguments)?;
    let revert_code = inline
        .revert_template
        .as_ref()
        .map(|template| template.render(arguments))
        .transpose()?;
    Ok(CompiledCode { code, revert_code })
}

/// Renders the argument templates of a nested call against the caller's
/// arguments. Empty results drop optional arguments and fail required ones.
fn compile_nested_arguments(
    nested: &CompositeCall,
    caller_arguments: &BTreeMap<String, String>,
    registry: &SharedFunctionRegistry,
) -> Result<FunctionCall, CollectionError> {
    let target = registry.require(&nested.call.function_name)?;
    let mut compiled = FunctionCall::new(nested.call.function_name.clone());

    for (name, template) in &nested.argument_templates {
        let value = template.render(caller_arguments).map_err(|error| {
            error.wrap(format!("Failed to compile argument \"{}\".", name))
        })?;
        if !value.trim().is_empty() {
            compiled.arguments.insert(name.clone(), value);
            continue;
        }
        let optional = target
            .parameters
            .get(name)
            .map_or(false, |parameter| parameter.optional);
        if !optional {
            return Err(CollectionError::new(
                "MISSING_ARGUMENT",
                format!(
                    "Compilation resulted in empty value for required parameter: \"{}\".",
                    name
                ),
            ));
        }
    }
    Ok(compiled)
}

fn merge(compiled: Vec<CompiledCode>) -> CompiledCode {
    let code = compiled
        .iter()
        .map(|part| part.code.as_str())
        .filter(|code| !code.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let reverts = compiled
        .iter()
        .filter_map(|part| part.revert_code.as_deref())
        .filter(|revert| !revert.trim().is_empty())
        .collect::<Vec<_>>();
    CompiledCode {
        code,
        revert_code: (!reverts.is_empty()).then(|| reverts.join("\n")),
    }
}
