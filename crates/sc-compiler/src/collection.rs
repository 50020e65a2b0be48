use std::collections::BTreeMap;

use sc_core::{
    CategoryCollection, CollectionError, OperatingSystem, RecommendationLevel, ScriptLanguage,
    ScriptingDefinition,
};
use serde_json::Value as JsonValue;
use tracing::info;

use crate::calls::json_kind;
use crate::category_parser::{
    parse_category_with, CategoryParserUtilities, CollectionContext, IdAllocator,
};

const COLLECTION_PROPERTIES: [&str; 4] = ["os", "scripting", "functions", "children"];
const SCRIPTING_PROPERTIES: [&str; 3] = ["language", "startCode", "endCode"];

/// Picks the language to compile with: an explicit request wins, otherwise
/// the collection's own `scripting.language`.
pub fn resolve_language(
    raw: &JsonValue,
    requested: Option<ScriptLanguage>,
) -> Result<ScriptLanguage, CollectionError> {
    if let Some(language) = requested {
        return Ok(language);
    }
    match raw.get("scripting").and_then(|scripting| scripting.get("language")) {
        Some(JsonValue::String(name)) => ScriptLanguage::from_name(name)
            .map_err(|error| error.wrap("Failed to parse scripting definition.")),
        _ => Err(CollectionError::new(
            "COLLECTION_LANGUAGE_MISSING",
            "No language was given and the collection does not declare \"scripting.language\".",
        )),
    }
}

/// Parses a whole collection: shared functions first, then every top-level
/// category with one id counter.
pub fn parse_collection(
    raw: &JsonValue,
    language: ScriptLanguage,
) -> Result<CategoryCollection, CollectionError> {
    parse_collection_with(raw, language, &CategoryParserUtilities::default())
}

pub fn parse_collection_with(
    raw: &JsonValue,
    language: ScriptLanguage,
    utilities: &CategoryParserUtilities,
) -> Result<CategoryCollection, CollectionError> {
    let Some(object) = raw.as_object() else {
        return Err(collection_error(format!(
            "Collection must be an object, got {}.",
            json_kind(raw)
        )));
    };

    let unexpected = object
        .keys()
        .filter(|key| !COLLECTION_PROPERTIES.contains(&key.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !unexpected.is_empty() {
        return Err(collection_error(format!(
            "Collection has unexpected property(ies): \"{}\". Allowed: \"{}\".",
            unexpected.join("\", \""),
            COLLECTION_PROPERTIES.join("\", \"")
        )));
    }

    let os = match object.get("os") {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::String(name)) => Some(OperatingSystem::from_name(name)?),
        Some(other) => {
            return Err(collection_error(format!(
                "\"os\" must be a string, got {}.",
                json_kind(other)
            )))
        }
    };

    let scripting = match object.get("scripting") {
        None | Some(JsonValue::Null) => None,
        Some(raw_scripting) => Some(
            parse_scripting_definition(raw_scripting)
                .map_err(|error| error.wrap("Failed to parse scripting definition."))?,
        ),
    };
    if let Some(declared) = scripting.as_ref().map(|definition| definition.language) {
        if declared != language {
            return Err(CollectionError::new(
                "COLLECTION_LANGUAGE_MISMATCH",
                format!(
                    "Collection is written in {} but was compiled as {}.",
                    declared, language
                ),
            ));
        }
    }

    let children = match object.get("children") {
        Some(JsonValue::Array(children)) if !children.is_empty() => children,
        Some(JsonValue::Array(_)) | None | Some(JsonValue::Null) => {
            return Err(collection_error("Collection has no children."))
        }
        Some(other) => {
            return Err(collection_error(format!(
                "\"children\" must be an array, got {}.",
                json_kind(other)
            )))
        }
    };

    let context = CollectionContext::new(object.get("functions"), language)
        .map_err(|error| error.wrap("Failed to parse shared functions."))?;

    let mut ids = IdAllocator::new();
    let mut actions = Vec::with_capacity(children.len());
    for (index, child) in children.iter().enumerate() {
        if !child.get("category").is_some_and(|name| !name.is_null()) {
            return Err(collection_error(format!(
                "Top-level executable #{} must be a category.",
                index + 1
            ))
            .with_executable(child, None));
        }
        actions.push(parse_category_with(child, &context, utilities, &mut ids)?);
    }

    let collection = CategoryCollection {
        language,
        os,
        scripting,
        actions,
    };
    ensure_unique_script_names(&collection)?;
    ensure_all_recommendation_levels(&collection)?;

    info!(
        %language,
        os = ?collection.os,
        categories = collection.total_categories(),
        scripts = collection.total_scripts(),
        functions = context.compiler.registry().len(),
        "loaded collection"
    );
    Ok(collection)
}

fn ensure_unique_script_names(collection: &CategoryCollection) -> Result<(), CollectionError> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for script in collection.all_scripts() {
        *counts.entry(script.name.as_str()).or_default() += 1;
    }
    let duplicates = counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(name, _)| name)
        .collect::<Vec<_>>();
    if duplicates.is_empty() {
        return Ok(());
    }
    Err(CollectionError::new(
        "COLLECTION_SCRIPT_NAME_DUPLICATE",
        format!(
            "Script names must be unique, duplicated: \"{}\".",
            duplicates.join("\", \"")
        ),
    ))
}

/// Every level, plus "no level", must be used by at least one script.
fn ensure_all_recommendation_levels(collection: &CategoryCollection) -> Result<(), CollectionError> {
    let scripts = collection.all_scripts();
    let mut missing = RecommendationLevel::ALL
        .into_iter()
        .filter(|level| {
            !scripts
                .iter()
                .any(|script| script.recommendation_level == Some(*level))
        })
        .map(RecommendationLevel::display_name)
        .collect::<Vec<_>>();
    if !scripts.iter().any(|script| script.recommendation_level.is_none()) {
        missing.push("None");
    }
    if missing.is_empty() {
        return Ok(());
    }
    Err(CollectionError::new(
        "COLLECTION_RECOMMENDATION_LEVELS_MISSING",
        format!("Missing recommendation levels: {}.", missing.join(", ")),
    ))
}

fn parse_scripting_definition(raw: &JsonValue) -> Result<ScriptingDefinition, CollectionError> {
    let Some(object) = raw.as_object() else {
        return Err(scripting_error(format!(
            "Scripting definition must be an object, got {}.",
            json_kind(raw)
        )));
    };
    let unexpected = object
        .keys()
        .filter(|key| !SCRIPTING_PROPERTIES.contains(&key.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !unexpected.is_empty() {
        return Err(scripting_error(format!(
            "Scripting definition has unexpected property(ies): \"{}\".",
            unexpected.join("\", \"")
        )));
    }
    let language = match object.get("language") {
        Some(JsonValue::String(name)) => ScriptLanguage::from_name(name)?,
        None | Some(JsonValue::Null) => {
            return Err(scripting_error("Scripting definition is missing \"language\"."))
        }
        Some(other) => {
            return Err(scripting_error(format!(
                "\"language\" must be a string, got {}.",
                json_kind(other)
            )))
        }
    };
    Ok(ScriptingDefinition {
        language,
        start_code: required_code(object.get("startCode"), "startCode")?,
        end_code: required_code(object.get("endCode"), "endCode")?,
    })
}

fn required_code(raw: Option<&JsonValue>, key: &str) -> Result<String, CollectionError> {
    match raw {
        Some(JsonValue::String(code)) if !code.trim().is_empty() => Ok(code.clone()),
        Some(JsonValue::String(_)) | None | Some(JsonValue::Null) => Err(scripting_error(
            format!("\"{}\" must not be empty.", key),
        )),
        Some(other) => Err(scripting_error(format!(
            "\"{}\" must be a string, got {}.",
            key,
            json_kind(other)
        ))),
    }
}

fn scripting_error(message: impl Into<String>) -> CollectionError {
    CollectionError::new("SCRIPTING_DEFINITION_INVALID", message)
}

fn collection_error(message: impl Into<String>) -> CollectionError {
    CollectionError::new("COLLECTION_INVALID", message)
}
