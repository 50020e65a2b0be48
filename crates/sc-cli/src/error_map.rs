use sc_core::CollectionError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> CollectionError {
    CollectionError::new(code, error.to_string())
}

/// Writes the error protocol to stdout and returns the process exit code.
pub(crate) fn emit_error(error: CollectionError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.to_string()).expect("string json")
    );
    1
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> CollectionError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> CollectionError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> CollectionError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_output(error: serde_json::Error) -> CollectionError {
    map_error("CLI_OUTPUT", error)
}
