use super::*;
use crate::test_support::*;
use sc_api::{compile_collection_from_str, SourceFormat};
use sc_core::{CategoryCollection, ScriptLanguage};

const COLLECTION: &str = r#"
functions:
  - name: Greet
    parameters:
      - name: who
    code: echo hello {{ $who }}
    revertCode: echo bye {{ $who }}
children:
  - category: Demo
    children:
      - name: Greet world
        call:
          function: Greet
          parameters:
            who: World
      - category: Nested
        children:
          - name: Plain
            recommend: strict
            code: echo plain
          - name: Tidy
            recommend: standard
            code: echo tidy
"#;

fn collection() -> CategoryCollection {
    compile_collection_from_str(COLLECTION, SourceFormat::Yaml, ScriptLanguage::Shellscript)
        .expect("collection should compile")
}

fn run(args: &[&str]) -> i32 {
    run_cli_from_args(std::iter::once("sc-cli").chain(args.iter().copied()))
}

#[test]
fn summary_flattens_tree_in_declaration_order() {
    let summary = CollectionSummary::of(&collection());
    let names = summary
        .categories
        .iter()
        .map(|category| (category.name.as_str(), category.depth))
        .collect::<Vec<_>>();
    assert_eq!(names, vec![("Demo", 0), ("Nested", 1)]);
    assert_eq!(summary.scripts.len(), 3);
    assert!(summary.scripts[0].revertible);
    assert!(!summary.scripts[1].revertible);
    assert_eq!(summary.scripts[1].category_id, summary.categories[1].id);
}

#[test]
fn render_collection_emits_header_and_payload() {
    let collection = collection();
    let lines = render_collection(&collection, OutputFormat::Json).expect("render");
    assert_eq!(lines[0], "RESULT:OK");
    assert_eq!(lines[1], "LANGUAGE:shellscript");
    assert_eq!(lines[2], "CATEGORIES:2");
    assert_eq!(lines[3], "SCRIPTS:3");
    assert!(lines[4].starts_with("COLLECTION_JSON:{"));

    let lines = render_collection(&collection, OutputFormat::Summary).expect("render");
    assert_eq!(
        lines.iter().filter(|line| line.starts_with("CATEGORY_JSON:")).count(),
        2
    );
    assert!(lines
        .iter()
        .any(|line| line.starts_with("SCRIPT_JSON:") && line.contains("\"recommend\":\"strict\"")));
}

#[test]
fn render_script_selects_code_and_rejects_missing_revert() {
    let collection = collection();
    let greet = collection.find_script("Greet world").expect("script");
    let lines = render_script(greet, true).expect("revert");
    assert_eq!(lines[2], "MODE:REVERT");
    assert_eq!(lines[3], "CODE_JSON:\"echo bye World\"");

    let plain = collection.find_script("Plain").expect("script");
    let error = render_script(plain, true).expect_err("not revertible");
    assert_eq!(error.code, "CLI_SCRIPT_NOT_REVERTIBLE");
}

#[test]
fn render_collections_lists_each_source() {
    let mut collections = std::collections::BTreeMap::new();
    collections.insert("demo.yaml".to_string(), collection());
    let lines = render_collections(&collections);
    assert_eq!(lines[1], "COLLECTIONS:1");
    assert_eq!(lines[2], "COLLECTION:demo.yaml|shellscript|2|3");
}

#[test]
fn cli_commands_return_exit_codes() {
    let root = temp_path("cli-commands");
    let file = root.join("demo.yaml");
    write_file(&file, COLLECTION);
    let file = file.to_string_lossy().to_string();
    let dir = root.to_string_lossy().to_string();

    assert_eq!(run(&["compile", "--file", &file, "--language", "shellscript"]), 0);
    assert_eq!(
        run(&["compile-dir", "--collections-dir", &dir, "--language", "shellscript"]),
        0
    );
    assert_eq!(
        run(&["script", "--file", &file, "--language", "shellscript", "--name", "Plain"]),
        0
    );
    assert_eq!(
        run(&["script", "--file", &file, "--language", "shellscript", "--name", "Missing"]),
        1
    );
    assert_eq!(run(&["compile", "--file", &file, "--language", "cobol"]), 1);
}

#[test]
fn invalid_collection_fails_with_protocol_exit_code() {
    let root = temp_path("cli-invalid");
    let file = root.join("broken.json");
    write_file(&file, r#"{ "children": [{ "category": "Empty", "children": [] }] }"#);
    let file = file.to_string_lossy().to_string();
    assert_eq!(run(&["compile", "--file", &file, "--language", "batchfile"]), 1);
}

#[test]
fn language_flag_is_optional_when_collection_declares_one() {
    let root = temp_path("cli-declared-language");
    let declared = root.join("declared.yaml");
    write_file(
        &declared,
        &format!(
            "scripting:\n  language: shellscript\n  startCode: \"#!/bin/sh\"\n  endCode: exit 0\n{}",
            COLLECTION.trim_start()
        ),
    );
    let undeclared = root.join("undeclared.yaml");
    write_file(&undeclared, COLLECTION);

    let declared = declared.to_string_lossy().to_string();
    let undeclared = undeclared.to_string_lossy().to_string();
    assert_eq!(run(&["compile", "--file", &declared]), 0);
    assert_eq!(run(&["compile", "--file", &undeclared]), 1);
}

#[test]
fn unknown_subcommand_is_a_usage_error() {
    assert_ne!(run(&["explode"]), 0);
}
