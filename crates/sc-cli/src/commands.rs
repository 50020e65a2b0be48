use sc_api::{compile_collection_from_path, compile_collections_from_map};
use sc_core::{CollectionError, ScriptLanguage};
use tracing::info;

use crate::{
    emit_lines, read_collections_from_dir, render_collection, render_collections, render_script,
    resolve_collection_file, resolve_collections_dir, CompileArgs, CompileDirArgs, ScriptArgs,
};

/// `None` defers to each collection's `scripting.language`.
fn requested_language(name: Option<&str>) -> Result<Option<ScriptLanguage>, CollectionError> {
    name.map(ScriptLanguage::from_name).transpose()
}

pub(super) fn run_compile(args: CompileArgs) -> Result<i32, CollectionError> {
    let language = requested_language(args.language.as_deref())?;
    let path = resolve_collection_file(&args.file)?;
    let collection = compile_collection_from_path(&path, language)?;
    Ok(emit_lines(render_collection(&collection, args.format)?))
}

pub(super) fn run_compile_dir(args: CompileDirArgs) -> Result<i32, CollectionError> {
    let language = requested_language(args.language.as_deref())?;
    let root = resolve_collections_dir(&args.collections_dir)?;
    let sources = read_collections_from_dir(&root)?;
    info!(root = %root.display(), sources = sources.len(), "compiling collections directory");
    let collections = compile_collections_from_map(&sources, language)?;
    Ok(emit_lines(render_collections(&collections)))
}

pub(super) fn run_script(args: ScriptArgs) -> Result<i32, CollectionError> {
    let language = requested_language(args.language.as_deref())?;
    let path = resolve_collection_file(&args.file)?;
    let collection = compile_collection_from_path(&path, language)?;
    let script = collection.find_script(&args.name).ok_or_else(|| {
        CollectionError::new(
            "CLI_SCRIPT_NOT_FOUND",
            format!("Script \"{}\" is not defined in {}.", args.name, path.display()),
        )
    })?;
    Ok(emit_lines(render_script(script, args.revert)?))
}
