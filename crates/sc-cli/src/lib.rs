use std::ffi::OsString;

use clap::Parser;
use sc_core::CollectionError;

mod cli_args;
mod commands;
mod error_map;
mod models;
mod report;
mod source_loader;
#[cfg(test)]
mod test_support;

pub(crate) use cli_args::{Cli, CompileArgs, CompileDirArgs, Mode, OutputFormat, ScriptArgs};
pub(crate) use error_map::{
    emit_error, map_cli_output, map_cli_source_path, map_cli_source_read, map_cli_source_scan,
};
pub(crate) use models::CollectionSummary;
pub(crate) use report::{emit_lines, render_collection, render_collections, render_script};
pub(crate) use source_loader::{
    read_collections_from_dir, resolve_collection_file, resolve_collections_dir,
};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, CollectionError> {
    match cli.command {
        Mode::Compile(args) => commands::run_compile(args),
        Mode::CompileDir(args) => commands::run_compile_dir(args),
        Mode::Script(args) => commands::run_script(args),
    }
}

#[cfg(test)]
mod tests;
