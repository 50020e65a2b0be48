use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use sc_compiler::{parse_collection, resolve_language};
use sc_core::{CategoryCollection, CollectionError, ScriptLanguage};
use serde_json::Value as JsonValue;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl SourceFormat {
    /// `.yaml` and `.yml` are YAML, anything else is read as JSON.
    pub fn from_path(path: &Path) -> Self {
        match path
            .extension()
            .and_then(|extension| extension.to_str())
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("yaml") | Some("yml") => SourceFormat::Yaml,
            _ => SourceFormat::Json,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SourceFormat::Yaml => "yaml",
            SourceFormat::Json => "json",
        }
    }
}

pub fn parse_source(source: &str, format: SourceFormat) -> Result<JsonValue, CollectionError> {
    let parsed = match format {
        SourceFormat::Yaml => serde_yaml::from_str::<JsonValue>(source).map_err(|error| error.to_string()),
        SourceFormat::Json => serde_json::from_str::<JsonValue>(source).map_err(|error| error.to_string()),
    };
    parsed.map_err(|message| {
        CollectionError::new(
            "SOURCE_PARSE_ERROR",
            format!("Failed to parse {} source: {}", format.name(), message),
        )
    })
}

/// Without an explicit `language` the collection's `scripting.language`
/// decides.
pub fn compile_collection_from_str(
    source: &str,
    format: SourceFormat,
    language: impl Into<Option<ScriptLanguage>>,
) -> Result<CategoryCollection, CollectionError> {
    let raw = parse_source(source, format)?;
    let language = resolve_language(&raw, language.into())?;
    parse_collection(&raw, language)
}

pub fn compile_collection_from_path(
    path: &Path,
    language: impl Into<Option<ScriptLanguage>>,
) -> Result<CategoryCollection, CollectionError> {
    let source = fs::read_to_string(path).map_err(|error| {
        CollectionError::new(
            "SOURCE_READ_ERROR",
            format!("Failed to read \"{}\": {}", path.display(), error),
        )
    })?;
    let format = SourceFormat::from_path(path);
    debug!(path = %path.display(), format = format.name(), "compiling collection file");
    compile_collection_from_str(&source, format, language)
        .map_err(|error| error.wrap(format!("Failed to compile collection \"{}\".", path.display())))
}

/// Compiles every source of a `relative path → text` map; the first failure
/// aborts and names its path.
pub fn compile_collections_from_map(
    sources: &BTreeMap<String, String>,
    language: impl Into<Option<ScriptLanguage>>,
) -> Result<BTreeMap<String, CategoryCollection>, CollectionError> {
    let language = language.into();
    let mut collections = BTreeMap::new();
    for (path, source) in sources {
        let format = SourceFormat::from_path(Path::new(path));
        let collection = compile_collection_from_str(source, format, language)
            .map_err(|error| error.wrap(format!("Failed to compile collection \"{}\".", path)))?;
        collections.insert(path.clone(), collection);
    }
    Ok(collections)
}
