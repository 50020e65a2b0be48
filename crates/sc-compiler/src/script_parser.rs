use sc_core::{CollectionError, RecommendationLevel, Script, ScriptCode};
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::calls::json_kind;
use crate::category_parser::{CategoryParserUtilities, CollectionContext};
use crate::executable::{ExecutableKind, ExecutableValidator};
use crate::validation::{validate_code, CodeValidationRule};

const SCRIPT_PROPERTIES: [&str; 6] = ["name", "recommend", "code", "revertCode", "call", "docs"];

const INLINE_CODE_RULES: [CodeValidationRule; 4] = [
    CodeValidationRule::NoEmptyLines,
    CodeValidationRule::NoDuplicatedLines,
    CodeValidationRule::NoTooLongLines,
    CodeValidationRule::NoCommentOnlyLines,
];

pub(crate) fn parse_script(
    data: &JsonValue,
    parent_category: Option<&JsonValue>,
    context: &CollectionContext,
    utilities: &CategoryParserUtilities,
) -> Result<Script, CollectionError> {
    let validator = ExecutableValidator::new(ExecutableKind::Script, data, parent_category);
    parse_script_node(&validator, context, utilities).map_err(|error| validator.boundary(error))
}

fn parse_script_node(
    validator: &ExecutableValidator<'_>,
    context: &CollectionContext,
    utilities: &CategoryParserUtilities,
) -> Result<Script, CollectionError> {
    let node = validator.object()?;
    validator.ensure_allowed_keys(&SCRIPT_PROPERTIES)?;
    let name = (utilities.validate_name)(node.get("name"))?;

    let has_code = is_present(node, "code");
    let has_call = is_present(node, "call");
    validator.ensure(has_code || has_call, "Neither \"call\" or \"code\" is defined.")?;
    validator.ensure(!(has_code && has_call), "Both \"call\" and \"code\" are defined.")?;
    validator.ensure(
        !(has_call && is_present(node, "revertCode")),
        "Both \"call\" and \"revertCode\" are defined.",
    )?;

    let docs = (utilities.parse_docs)(node)?;
    let recommendation_level = parse_recommendation(validator, node)?;
    let code = match node.get("call") {
        Some(call) if context.compiler.can_compile(node) => context.compiler.compile(&name, call)?,
        _ => parse_inline_code(validator, node, context, utilities)?,
    };

    Ok(Script {
        name,
        docs,
        code,
        recommendation_level,
    })
}

fn is_present(node: &JsonMap<String, JsonValue>, key: &str) -> bool {
    !matches!(node.get(key), None | Some(JsonValue::Null))
}

fn string_property<'a>(
    validator: &ExecutableValidator<'_>,
    node: &'a JsonMap<String, JsonValue>,
    key: &str,
) -> Result<Option<&'a str>, CollectionError> {
    match node.get(key) {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(value)) => Ok(Some(value.as_str())),
        Some(other) => Err(validator.fail(format!(
            "\"{}\" must be a string, got {}.",
            key,
            json_kind(other)
        ))),
    }
}

fn parse_recommendation(
    validator: &ExecutableValidator<'_>,
    node: &JsonMap<String, JsonValue>,
) -> Result<Option<RecommendationLevel>, CollectionError> {
    let Some(level) = string_property(validator, node, "recommend")? else {
        return Ok(None);
    };
    RecommendationLevel::from_name(level).map(Some).ok_or_else(|| {
        CollectionError::new(
            "SCRIPT_RECOMMENDATION_INVALID",
            format!(
                "Unknown recommendation level: \"{}\". Allowed: \"standard\", \"strict\".",
                level
            ),
        )
    })
}

fn parse_inline_code(
    validator: &ExecutableValidator<'_>,
    node: &JsonMap<String, JsonValue>,
    context: &CollectionContext,
    utilities: &CategoryParserUtilities,
) -> Result<ScriptCode, CollectionError> {
    let execute = string_property(validator, node, "code")?.unwrap_or_default();
    let revert = string_property(validator, node, "revertCode")?;
    let code = (utilities.create_script_code)(execute, revert)?;

    validate_code(&code.execute, context.language, &INLINE_CODE_RULES)?;
    if let Some(revert) = &code.revert {
        validate_code(revert, context.language, &INLINE_CODE_RULES)
            .map_err(|error| error.wrap("Invalid \"revertCode\"."))?;
    }
    Ok(code)
}
