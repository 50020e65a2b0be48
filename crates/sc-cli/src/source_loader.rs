use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use sc_core::CollectionError;
use walkdir::WalkDir;

use crate::{map_cli_source_path, map_cli_source_read, map_cli_source_scan};

const COLLECTION_EXTENSIONS: [&str; 3] = ["yaml", "yml", "json"];

fn absolute_path(raw: &str) -> Result<PathBuf, CollectionError> {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return Ok(path);
    }
    Ok(std::env::current_dir()
        .map_err(map_cli_source_path)?
        .join(path))
}

pub(crate) fn resolve_collection_file(file: &str) -> Result<PathBuf, CollectionError> {
    let absolute = absolute_path(file)?;
    if !absolute.exists() {
        return Err(CollectionError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("collection file does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_file() {
        return Err(CollectionError::new(
            "CLI_SOURCE_NOT_FILE",
            format!("collection path is not a file: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

pub(crate) fn resolve_collections_dir(collections_dir: &str) -> Result<PathBuf, CollectionError> {
    let absolute = absolute_path(collections_dir)?;
    if !absolute.exists() {
        return Err(CollectionError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("collections-dir does not exist: {}", absolute.display()),
        ));
    }
    if !absolute.is_dir() {
        return Err(CollectionError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("collections-dir is not a directory: {}", absolute.display()),
        ));
    }
    Ok(absolute)
}

fn is_collection_file(path: &Path) -> bool {
    path.extension()
        .and_then(|extension| extension.to_str())
        .map(|extension| COLLECTION_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Reads every collection source under `collections_dir`, keyed by its
/// `/`-separated relative path.
pub(crate) fn read_collections_from_dir(
    collections_dir: &Path,
) -> Result<BTreeMap<String, String>, CollectionError> {
    let mut sources = BTreeMap::new();

    for entry in WalkDir::new(collections_dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() || !is_collection_file(entry.path()) {
            continue;
        }

        let path = entry.path();
        let relative = path
            .strip_prefix(collections_dir)
            .map_err(map_cli_source_scan)?
            .to_string_lossy()
            .replace('\\', "/");

        let content = fs::read_to_string(path).map_err(map_cli_source_read)?;
        sources.insert(relative, content);
    }

    if sources.is_empty() {
        return Err(CollectionError::new(
            "CLI_SOURCE_EMPTY",
            format!(
                "No .yaml/.yml/.json files under {}",
                collections_dir.display()
            ),
        ));
    }

    Ok(sources)
}
