use sc_core::{Category, CollectionError, ScriptCode, ScriptLanguage};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::debug;

use crate::executable::{
    create_script_code, parse_docs, validate_name, ExecutableKind, ExecutableValidator,
};
use crate::script_compiler::ScriptCompiler;
use crate::script_parser::parse_script;

const CATEGORY_PROPERTIES: [&str; 3] = ["docs", "children", "category"];

/// Hands out category ids for a single parse pass.
#[derive(Debug, Default)]
pub struct IdAllocator {
    next: usize,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(next: usize) -> Self {
        Self { next }
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// Replaceable collaborators used while parsing executables.
#[derive(Clone, Copy)]
pub struct CategoryParserUtilities {
    pub parse_docs: fn(&JsonMap<String, JsonValue>) -> Result<Vec<String>, CollectionError>,
    pub validate_name: fn(Option<&JsonValue>) -> Result<String, CollectionError>,
    pub create_script_code: fn(&str, Option<&str>) -> Result<ScriptCode, CollectionError>,
}

impl Default for CategoryParserUtilities {
    fn default() -> Self {
        Self {
            parse_docs,
            validate_name,
            create_script_code,
        }
    }
}

/// Everything shared by the executables of one collection.
#[derive(Debug, Clone)]
pub struct CollectionContext {
    pub language: ScriptLanguage,
    pub compiler: ScriptCompiler,
}

impl CollectionContext {
    pub fn new(functions: Option<&JsonValue>, language: ScriptLanguage) -> Result<Self, CollectionError> {
        Ok(Self {
            language,
            compiler: ScriptCompiler::new(functions, language)?,
        })
    }
}

fn classify(node: &JsonMap<String, JsonValue>) -> Option<ExecutableKind> {
    if node.contains_key("category") {
        Some(ExecutableKind::Category)
    } else if node.contains_key("code") || node.contains_key("call") {
        Some(ExecutableKind::Script)
    } else {
        None
    }
}

/// Parses one category with default collaborators and a fresh id counter.
pub fn parse_category(data: &JsonValue, context: &CollectionContext) -> Result<Category, CollectionError> {
    parse_category_with(
        data,
        context,
        &CategoryParserUtilities::default(),
        &mut IdAllocator::new(),
    )
}

pub fn parse_category_with(
    data: &JsonValue,
    context: &CollectionContext,
    utilities: &CategoryParserUtilities,
    ids: &mut IdAllocator,
) -> Result<Category, CollectionError> {
    parse_category_node(data, None, context, utilities, ids)
}

fn parse_category_node(
    data: &JsonValue,
    parent_category: Option<&JsonValue>,
    context: &CollectionContext,
    utilities: &CategoryParserUtilities,
    ids: &mut IdAllocator,
) -> Result<Category, CollectionError> {
    let validator = ExecutableValidator::new(ExecutableKind::Category, data, parent_category);
    parse_category_body(&validator, data, context, utilities, ids)
        .map_err(|error| validator.boundary(error))
}

fn parse_category_body(
    validator: &ExecutableValidator<'_>,
    data: &JsonValue,
    context: &CollectionContext,
    utilities: &CategoryParserUtilities,
    ids: &mut IdAllocator,
) -> Result<Category, CollectionError> {
    let node = validator.object()?;
    validator.ensure_allowed_keys(&CATEGORY_PROPERTIES)?;
    let name = (utilities.validate_name)(node.get("category"))?;
    let children = match node.get("children") {
        None | Some(JsonValue::Null) => &[][..],
        Some(JsonValue::Array(children)) => children.as_slice(),
        Some(_) => return Err(validator.fail("\"children\" must be an array.")),
    };
    if children.is_empty() {
        return Err(CollectionError::new(
            "CATEGORY_CHILDREN_EMPTY",
            format!("Category \"{}\" has no children.", name),
        ));
    }

    let mut subcategories = Vec::new();
    let mut scripts = Vec::new();
    for child in children {
        let child_validator = ExecutableValidator::new(ExecutableKind::Script, child, Some(data));
        let child_node = child_validator
            .object()
            .map_err(|error| child_validator.contextual(error))?;
        match classify(child_node) {
            Some(ExecutableKind::Category) => {
                subcategories.push(parse_category_node(child, Some(data), context, utilities, ids)?)
            }
            Some(ExecutableKind::Script) => {
                scripts.push(parse_script(child, Some(data), context, utilities)?)
            }
            None => {
                return Err(child_validator.contextual(CollectionError::new(
                    "EXECUTABLE_UNCLASSIFIED",
                    "Executable is neither a category nor a script.",
                )));
            }
        }
    }

    let docs = (utilities.parse_docs)(node)?;
    let id = ids.next_id();
    debug!(
        category = %name,
        id,
        subcategories = subcategories.len(),
        scripts = scripts.len(),
        "parsed category"
    );
    Ok(Category {
        id,
        name,
        docs,
        subcategories,
        scripts,
    })
}
