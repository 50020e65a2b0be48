use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

fn collections_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("collections")
}

fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_sc-cli"))
        .args(args)
        .output()
        .expect("cli should execute")
}

fn assert_ok(output: &Output, context: &str) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    if !output.status.success() {
        panic!(
            "{} failed\nstdout:\n{}\nstderr:\n{}",
            context,
            stdout,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    assert!(stdout.contains("RESULT:OK"), "stdout missing RESULT:OK for {}", context);
    stdout
}

#[test]
fn compile_dir_accepts_every_demo_collection() {
    let mut directories = fs::read_dir(collections_root())
        .expect("collections root must exist")
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    directories.sort();
    assert!(!directories.is_empty(), "expected demo collections");

    for directory in directories {
        let language = directory
            .file_name()
            .and_then(|name| name.to_str())
            .expect("language directory name")
            .to_string();
        let dir = directory.to_string_lossy().to_string();
        let output = run_cli(&["compile-dir", "--collections-dir", &dir, "--language", &language]);
        let stdout = assert_ok(&output, &dir);
        assert!(stdout.contains("COLLECTIONS:"), "missing COLLECTIONS for {}", dir);
        assert!(stdout.contains(&format!("|{}|", language)));
    }
}

#[test]
fn compile_prints_collection_json() {
    let file = collections_root().join("shellscript").join("linux.yaml");
    let file = file.to_string_lossy().to_string();
    let output = run_cli(&["compile", "--file", &file, "--language", "shellscript"]);
    let stdout = assert_ok(&output, &file);

    assert!(stdout.contains("LANGUAGE:shellscript"));
    let json_line = stdout
        .lines()
        .find_map(|line| line.strip_prefix("COLLECTION_JSON:"))
        .expect("collection json line");
    let collection: serde_json::Value =
        serde_json::from_str(json_line).expect("collection json should parse");
    assert_eq!(collection["language"], "shellscript");
    assert!(collection["actions"].as_array().is_some_and(|actions| !actions.is_empty()));
}

#[test]
fn demo_collections_declare_their_own_language() {
    for (directory, file, os) in [
        ("batchfile", "windows.yaml", "windows"),
        ("shellscript", "linux.yaml", "linux"),
    ] {
        let file = collections_root().join(directory).join(file);
        let file = file.to_string_lossy().to_string();
        let output = run_cli(&["compile", "--file", &file]);
        let stdout = assert_ok(&output, &file);
        assert!(stdout.contains(&format!("LANGUAGE:{}", directory)));
        let json_line = stdout
            .lines()
            .find_map(|line| line.strip_prefix("COLLECTION_JSON:"))
            .expect("collection json line");
        let collection: serde_json::Value =
            serde_json::from_str(json_line).expect("collection json should parse");
        assert_eq!(collection["os"], os);
        assert_eq!(collection["scripting"]["language"], directory);
        assert!(collection["scripting"]["startCode"]
            .as_str()
            .is_some_and(|code| !code.is_empty()));
    }
}

#[test]
fn compile_summary_lists_categories_and_scripts() {
    let file = collections_root().join("batchfile").join("windows.yaml");
    let file = file.to_string_lossy().to_string();
    let output = run_cli(&[
        "compile", "--file", &file, "--language", "batchfile", "--format", "summary",
    ]);
    let stdout = assert_ok(&output, &file);
    assert!(stdout.lines().any(|line| line.starts_with("CATEGORY_JSON:")));
    assert!(stdout.lines().any(|line| line.starts_with("SCRIPT_JSON:")));
}

#[test]
fn script_prints_execute_and_revert_code() {
    let file = collections_root().join("batchfile").join("windows.yaml");
    let file = file.to_string_lossy().to_string();

    let output = run_cli(&[
        "script", "--file", &file, "--language", "batchfile", "--name", "Disable error reporting",
    ]);
    let stdout = assert_ok(&output, "execute");
    assert!(stdout.contains("MODE:EXECUTE"));
    assert!(stdout.contains("Disable-WindowsErrorReporting"));

    let output = run_cli(&[
        "script", "--file", &file, "--language", "batchfile", "--name", "Disable error reporting",
        "--revert",
    ]);
    let stdout = assert_ok(&output, "revert");
    assert!(stdout.contains("MODE:REVERT"));
    assert!(stdout.contains("Enable-WindowsErrorReporting"));
}

#[test]
fn wrong_language_reports_protocol_error() {
    let file = collections_root().join("batchfile").join("windows.yaml");
    let file = file.to_string_lossy().to_string();
    let output = run_cli(&["compile", "--file", &file, "--language", "powershell"]);
    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("RESULT:ERROR"));
    assert!(stdout.contains("ERROR_CODE:UNSUPPORTED_LANGUAGE"));
}
