use std::collections::{BTreeMap, BTreeSet, HashMap};

use sc_core::{CollectionError, ScriptLanguage};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::calls::{json_kind, parse_function_calls, FunctionCall};
use crate::expressions::Template;
use crate::validation::{validate_code, CodeValidationRule};

const FUNCTION_CODE_RULES: [CodeValidationRule; 2] = [
    CodeValidationRule::NoEmptyLines,
    CodeValidationRule::NoDuplicatedLines,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionParameter {
    pub name: String,
    pub optional: bool,
}

/// Ordered parameters of one function; names are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionParameterCollection {
    parameters: Vec<FunctionParameter>,
}

impl FunctionParameterCollection {
    pub fn add(&mut self, parameter: FunctionParameter) -> Result<(), CollectionError> {
        if self.get(&parameter.name).is_some() {
            return Err(CollectionError::new(
                "FUNCTION_PARAMETER_DUPLICATE",
                format!("Duplicate parameter name: \"{}\".", parameter.name),
            ));
        }
        self.parameters.push(parameter);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&FunctionParameter> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FunctionParameter> {
        self.parameters.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    pub fn required(&self) -> impl Iterator<Item = &FunctionParameter> {
        self.parameters.iter().filter(|parameter| !parameter.optional)
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineCode {
    pub code: String,
    pub revert_code: Option<String>,
    pub(crate) code_template: Template,
    pub(crate) revert_template: Option<Template>,
}

/// A call made from inside a composite function. Argument values are
/// templates over the calling function's parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositeCall {
    pub call: FunctionCall,
    pub(crate) argument_templates: BTreeMap<String, Template>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FunctionBody {
    InlineCode(InlineCode),
    Composite(Vec<CompositeCall>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedFunction {
    pub name: String,
    pub parameters: FunctionParameterCollection,
    pub body: FunctionBody,
}

/// Read-only name → function map shared by every script of one collection.
#[derive(Debug, Clone, Default)]
pub struct SharedFunctionRegistry {
    functions: HashMap<String, SharedFunction>,
}

impl SharedFunctionRegistry {
    pub fn get(&self, name: &str) -> Option<&SharedFunction> {
        self.functions.get(name)
    }

    pub fn require(&self, name: &str) -> Result<&SharedFunction, CollectionError> {
        self.get(name).ok_or_else(|| {
            CollectionError::new(
                "UNKNOWN_FUNCTION",
                format!("Called function is not defined: \"{}\".", name),
            )
        })
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> BTreeSet<&str> {
        self.functions.keys().map(String::as_str).collect()
    }
}

/// Validates the whole declared set before accepting any function.
pub fn parse_shared_functions(
    data: Option<&JsonValue>,
    language: ScriptLanguage,
) -> Result<SharedFunctionRegistry, CollectionError> {
    let declarations = match data {
        None | Some(JsonValue::Null) => return Ok(SharedFunctionRegistry::default()),
        Some(JsonValue::Array(items)) => items
            .iter()
            .map(|item| {
                item.as_object().ok_or_else(|| {
                    CollectionError::new(
                        "FUNCTIONS_INVALID",
                        format!("Function must be an object, got {}: {}", json_kind(item), item),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(CollectionError::new(
                "FUNCTIONS_INVALID",
                format!("\"functions\" must be an array, got {}.", json_kind(other)),
            ))
        }
    };

    ensure_valid_functions(&declarations)?;

    let mut functions = HashMap::with_capacity(declarations.len());
    for declaration in &declarations {
        let function = parse_function(declaration, language).map_err(|error| {
            error.wrap(format!(
                "Failed to parse function \"{}\".",
                function_name(declaration)
            ))
        })?;
        functions.insert(function.name.clone(), function);
    }

    let registry = SharedFunctionRegistry { functions };
    ensure_no_circular_calls(&registry)?;

    debug!(functions = registry.len(), %language, "shared function registry built");
    Ok(registry)
}

fn function_name(declaration: &JsonMap<String, JsonValue>) -> &str {
    declaration
        .get("name")
        .and_then(JsonValue::as_str)
        .unwrap_or_default()
}

fn non_empty_str<'a>(declaration: &'a JsonMap<String, JsonValue>, key: &str) -> Option<&'a str> {
    declaration
        .get(key)
        .and_then(JsonValue::as_str)
        .filter(|value| !value.is_empty())
}

fn has_code(declaration: &JsonMap<String, JsonValue>) -> bool {
    non_empty_str(declaration, "code").is_some()
}

fn has_call(declaration: &JsonMap<String, JsonValue>) -> bool {
    !matches!(declaration.get("call"), None | Some(JsonValue::Null))
}

fn ensure_valid_functions(declarations: &[&JsonMap<String, JsonValue>]) -> Result<(), CollectionError> {
    ensure_no_unnamed_functions(declarations)?;
    ensure_no_duplicate_names(declarations)?;
    ensure_either_call_or_code(declarations)?;
    ensure_no_duplicate_code(declarations)?;
    ensure_expected_parameters_type(declarations)
}

fn print_list<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
    format!("\"{}\"", items.into_iter().collect::<Vec<_>>().join("\",\""))
}

fn print_names(declarations: &[&&JsonMap<String, JsonValue>]) -> String {
    print_list(declarations.iter().map(|declaration| function_name(declaration)))
}

fn ensure_no_unnamed_functions(
    declarations: &[&JsonMap<String, JsonValue>],
) -> Result<(), CollectionError> {
    let unnamed = declarations
        .iter()
        .filter(|declaration| function_name(declaration).trim().is_empty())
        .map(|declaration| JsonValue::Object((*declaration).clone()).to_string())
        .collect::<Vec<_>>();
    if unnamed.is_empty() {
        return Ok(());
    }
    Err(CollectionError::new(
        "FUNCTION_NAME_MISSING",
        format!("Some function(s) have no names:\n{}", unnamed.join("\n")),
    ))
}

fn ensure_no_duplicate_names(
    declarations: &[&JsonMap<String, JsonValue>],
) -> Result<(), CollectionError> {
    let mut by_lowercase: BTreeMap<String, Vec<&str>> = BTreeMap::new();
    for declaration in declarations {
        let name = function_name(declaration);
        by_lowercase.entry(name.to_lowercase()).or_default().push(name);
    }
    let duplicates = by_lowercase
        .values()
        .filter(|names| names.len() > 1)
        .flatten()
        .copied()
        .collect::<Vec<_>>();
    if duplicates.is_empty() {
        return Ok(());
    }
    Err(CollectionError::new(
        "FUNCTION_NAME_DUPLICATE",
        format!("duplicate function name: {}", print_list(duplicates)),
    ))
}

fn ensure_either_call_or_code(
    declarations: &[&JsonMap<String, JsonValue>],
) -> Result<(), CollectionError> {
    let ambiguous = declarations
        .iter()
        .filter(|declaration| {
            has_call(declaration)
                && (has_code(declaration) || non_empty_str(declaration, "revertCode").is_some())
        })
        .collect::<Vec<_>>();
    if !ambiguous.is_empty() {
        return Err(CollectionError::new(
            "FUNCTION_BODY_AMBIGUOUS",
            format!(
                "both \"code\" and \"call\" are defined in {}",
                print_names(&ambiguous)
            ),
        ));
    }

    let bodiless = declarations
        .iter()
        .filter(|declaration| !has_code(declaration) && !has_call(declaration))
        .collect::<Vec<_>>();
    if !bodiless.is_empty() {
        return Err(CollectionError::new(
            "FUNCTION_BODY_MISSING",
            format!(
                "neither \"code\" or \"call\" is defined in {}",
                print_names(&bodiless)
            ),
        ));
    }
    Ok(())
}

fn duplicates_of<'a>(values: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    for value in values {
        if !seen.insert(value) {
            duplicates.insert(value);
        }
    }
    duplicates.into_iter().collect()
}

fn ensure_no_duplicate_code(
    declarations: &[&JsonMap<String, JsonValue>],
) -> Result<(), CollectionError> {
    let duplicate_codes = duplicates_of(
        declarations
            .iter()
            .filter_map(|declaration| non_empty_str(declaration, "code")),
    );
    if !duplicate_codes.is_empty() {
        return Err(CollectionError::new(
            "FUNCTION_CODE_DUPLICATE",
            format!("duplicate \"code\" in functions: {}", print_list(duplicate_codes)),
        ));
    }

    let duplicate_reverts = duplicates_of(
        declarations
            .iter()
            .filter(|declaration| has_code(declaration))
            .filter_map(|declaration| non_empty_str(declaration, "revertCode"))
            .filter(|revert| !revert.trim().is_empty()),
    );
    if !duplicate_reverts.is_empty() {
        return Err(CollectionError::new(
            "FUNCTION_REVERT_CODE_DUPLICATE",
            format!(
                "duplicate \"revertCode\" in functions: {}",
                print_list(duplicate_reverts)
            ),
        ));
    }
    Ok(())
}

fn ensure_expected_parameters_type(
    declarations: &[&JsonMap<String, JsonValue>],
) -> Result<(), CollectionError> {
    let invalid = declarations
        .iter()
        .filter(|declaration| match declaration.get("parameters") {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::Array(items)) => !items.iter().all(JsonValue::is_object),
            Some(_) => true,
        })
        .collect::<Vec<_>>();
    if invalid.is_empty() {
        return Ok(());
    }
    Err(CollectionError::new(
        "FUNCTION_PARAMETERS_INVALID",
        format!(
            "parameters must be an array of objects in function(s) {}",
            print_names(&invalid)
        ),
    ))
}

fn parse_function(
    declaration: &JsonMap<String, JsonValue>,
    language: ScriptLanguage,
) -> Result<SharedFunction, CollectionError> {
    let name = function_name(declaration).to_string();
    let parameters = parse_parameters(&name, declaration)?;

    let body = match non_empty_str(declaration, "code") {
        Some(code) => {
            let revert_code = non_empty_str(declaration, "revertCode");
            FunctionBody::InlineCode(parse_inline_code(code, revert_code, &parameters, language)?)
        }
        None => {
            let calls = parse_function_calls(declaration.get("call").unwrap_or(&JsonValue::Null))?;
            FunctionBody::Composite(parse_composite_calls(calls, &parameters)?)
        }
    };

    Ok(SharedFunction {
        name,
        parameters,
        body,
    })
}

fn parse_parameters(
    function_name: &str,
    declaration: &JsonMap<String, JsonValue>,
) -> Result<FunctionParameterCollection, CollectionError> {
    let mut parameters = FunctionParameterCollection::default();
    let Some(JsonValue::Array(items)) = declaration.get("parameters") else {
        return Ok(parameters);
    };
    for item in items {
        let parameter_name = item.get("name").and_then(JsonValue::as_str).unwrap_or_default();
        parse_parameter(item)
            .and_then(|parameter| parameters.add(parameter))
            .map_err(|error| {
                error.wrap(format!(
                    "Failed to create parameter: {} for function \"{}\"",
                    parameter_name, function_name
                ))
            })?;
    }
    Ok(parameters)
}

fn parse_parameter(item: &JsonValue) -> Result<FunctionParameter, CollectionError> {
    let name = match item.get("name") {
        Some(JsonValue::String(name)) if !name.trim().is_empty() => name,
        _ => {
            return Err(CollectionError::new(
                "FUNCTION_PARAMETER_INVALID",
                format!("Parameter is missing a name: {}", item),
            ))
        }
    };
    if !name.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(CollectionError::new(
            "FUNCTION_PARAMETER_INVALID",
            format!("Parameter name must be alphanumeric but it was \"{}\".", name),
        ));
    }
    let optional = match item.get("optional") {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(flag)) => *flag,
        Some(other) => {
            return Err(CollectionError::new(
                "FUNCTION_PARAMETER_INVALID",
                format!(
                    "\"optional\" of parameter \"{}\" must be a boolean, got {}.",
                    name,
                    json_kind(other)
                ),
            ))
        }
    };
    Ok(FunctionParameter {
        name: name.clone(),
        optional,
    })
}

fn parse_inline_code(
    code: &str,
    revert_code: Option<&str>,
    parameters: &FunctionParameterCollection,
    language: ScriptLanguage,
) -> Result<InlineCode, CollectionError> {
    validate_code(code, language, &FUNCTION_CODE_RULES)
        .map_err(|error| error.wrap("Invalid \"code\"."))?;
    if let Some(revert) = revert_code {
        validate_code(revert, language, &FUNCTION_CODE_RULES)
            .map_err(|error| error.wrap("Invalid \"revertCode\"."))?;
    }

    let code_template = parse_template(code, parameters)?;
    let revert_template = revert_code
        .map(|revert| parse_template(revert, parameters))
        .transpose()?;

    Ok(InlineCode {
        code: code.to_string(),
        revert_code: revert_code.map(str::to_string),
        code_template,
        revert_template,
    })
}

fn parse_composite_calls(
    calls: Vec<FunctionCall>,
    parameters: &FunctionParameterCollection,
) -> Result<Vec<CompositeCall>, CollectionError> {
    calls
        .into_iter()
        .map(|call| {
            let argument_templates = call
                .arguments
                .iter()
                .map(|(name, value)| {
                    parse_template(value, parameters)
                        .map(|template| (name.clone(), template))
                        .map_err(|error| {
                            error.wrap(format!(
                                "Invalid argument \"{}\" in call to \"{}\".",
                                name, call.function_name
                            ))
                        })
                })
                .collect::<Result<BTreeMap<_, _>, _>>()?;
            Ok(CompositeCall {
                call,
                argument_templates,
            })
        })
        .collect()
}

fn parse_template(
    source: &str,
    parameters: &FunctionParameterCollection,
) -> Result<Template, CollectionError> {
    let template = Template::parse(source)?;
    let undeclared = template
        .parameter_names()
        .into_iter()
        .filter(|name| parameters.get(name).is_none())
        .collect::<Vec<_>>();
    if !undeclared.is_empty() {
        return Err(CollectionError::new(
            "FUNCTION_PARAMETER_UNDECLARED",
            format!(
                "Code uses undeclared parameter(s): {}. Declared: {}.",
                print_list(undeclared.iter().map(String::as_str)),
                if parameters.is_empty() {
                    "none".to_string()
                } else {
                    print_list(parameters.names())
                }
            ),
        ));
    }
    Ok(template)
}

fn ensure_no_circular_calls(registry: &SharedFunctionRegistry) -> Result<(), CollectionError> {
    let mut finished = BTreeSet::new();
    for name in registry.names() {
        let mut path = Vec::new();
        visit_calls(registry, name, &mut path, &mut finished)?;
    }
    Ok(())
}

fn visit_calls<'a>(
    registry: &'a SharedFunctionRegistry,
    name: &'a str,
    path: &mut Vec<&'a str>,
    finished: &mut BTreeSet<&'a str>,
) -> Result<(), CollectionError> {
    if finished.contains(name) {
        return Ok(());
    }
    if let Some(start) = path.iter().position(|visited| *visited == name) {
        let mut cycle = path[start..].to_vec();
        cycle.push(name);
        return Err(CollectionError::new(
            "CIRCULAR_FUNCTION_REFERENCE",
            format!("Functions call each other in a cycle: {}.", cycle.join(" -> ")),
        ));
    }
    // Unknown names are reported when a script calls into them.
    let Some(function) = registry.get(name) else {
        return Ok(());
    };
    if let FunctionBody::Composite(calls) = &function.body {
        path.push(name);
        for composite in calls {
            visit_calls(registry, &composite.call.function_name, path, finished)?;
        }
        path.pop();
    }
    finished.insert(name);
    Ok(())
}
