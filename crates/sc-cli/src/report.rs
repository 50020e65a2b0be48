use std::collections::BTreeMap;

use sc_core::{CategoryCollection, CollectionError, Script};

use crate::{map_cli_output, CollectionSummary, OutputFormat};

fn json_line(prefix: &str, value: &impl serde::Serialize) -> Result<String, CollectionError> {
    Ok(format!(
        "{}:{}",
        prefix,
        serde_json::to_string(value).map_err(map_cli_output)?
    ))
}

fn header(collection: &CategoryCollection) -> Vec<String> {
    vec![
        "RESULT:OK".to_string(),
        format!("LANGUAGE:{}", collection.language),
        format!("CATEGORIES:{}", collection.total_categories()),
        format!("SCRIPTS:{}", collection.total_scripts()),
    ]
}

pub(crate) fn render_collection(
    collection: &CategoryCollection,
    format: OutputFormat,
) -> Result<Vec<String>, CollectionError> {
    let mut lines = header(collection);
    match format {
        OutputFormat::Json => lines.push(json_line("COLLECTION_JSON", collection)?),
        OutputFormat::Summary => {
            let summary = CollectionSummary::of(collection);
            for category in &summary.categories {
                lines.push(json_line("CATEGORY_JSON", category)?);
            }
            for script in &summary.scripts {
                lines.push(json_line("SCRIPT_JSON", script)?);
            }
        }
    }
    Ok(lines)
}

pub(crate) fn render_collections(collections: &BTreeMap<String, CategoryCollection>) -> Vec<String> {
    let mut lines = vec![
        "RESULT:OK".to_string(),
        format!("COLLECTIONS:{}", collections.len()),
    ];
    lines.extend(collections.iter().map(|(path, collection)| {
        format!(
            "COLLECTION:{}|{}|{}|{}",
            path,
            collection.language,
            collection.total_categories(),
            collection.total_scripts()
        )
    }));
    lines
}

pub(crate) fn render_script(script: &Script, revert: bool) -> Result<Vec<String>, CollectionError> {
    let code = if revert {
        script.code.revert.as_deref().ok_or_else(|| {
            CollectionError::new(
                "CLI_SCRIPT_NOT_REVERTIBLE",
                format!("Script \"{}\" has no revert code.", script.name),
            )
        })?
    } else {
        script.code.execute.as_str()
    };
    Ok(vec![
        "RESULT:OK".to_string(),
        json_line("SCRIPT_NAME_JSON", &script.name)?,
        format!("MODE:{}", if revert { "REVERT" } else { "EXECUTE" }),
        json_line("CODE_JSON", &code)?,
    ])
}

pub(crate) fn emit_lines(lines: Vec<String>) -> i32 {
    for line in lines {
        println!("{}", line);
    }
    0
}
