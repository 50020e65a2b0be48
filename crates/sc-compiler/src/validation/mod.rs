//! Line-level static checks run over function bodies and compiled scripts.

mod analyzers;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

use regex::Regex;
use sc_core::error::indent_text;
use sc_core::{CollectionError, ScriptLanguage};

use analyzers::{
    analyze_comment_only_code, analyze_duplicate_lines, analyze_empty_lines,
    analyze_too_long_lines,
};

const MAX_DISPLAYED_LINE_LENGTH: usize = 120;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CodeValidationRule {
    NoEmptyLines,
    NoDuplicatedLines,
    NoTooLongLines,
    NoCommentOnlyLines,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLine {
    pub line_number: usize,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCodeLine {
    pub line_number: usize,
    pub error: String,
}

type Analyzer = fn(&[CodeLine], ScriptLanguage) -> Vec<InvalidCodeLine>;

fn analyzer_for(rule: CodeValidationRule) -> Analyzer {
    match rule {
        CodeValidationRule::NoEmptyLines => analyze_empty_lines,
        CodeValidationRule::NoDuplicatedLines => analyze_duplicate_lines,
        CodeValidationRule::NoTooLongLines => analyze_too_long_lines,
        CodeValidationRule::NoCommentOnlyLines => analyze_comment_only_code,
    }
}

fn line_break_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"\r\n|\r|\n").expect("line break regex"))
}

/// `\r\n`, `\r` and `\n` all end a line.
pub fn split_lines(code: &str) -> Vec<&str> {
    line_break_regex().split(code).collect()
}

pub fn split_code_lines(code: &str) -> Vec<CodeLine> {
    split_lines(code)
        .into_iter()
        .enumerate()
        .map(|(index, text)| CodeLine {
            line_number: index + 1,
            text: text.to_string(),
        })
        .collect()
}

/// Runs every requested rule and fails with a single report listing all lines
/// when any of them flags something.
pub fn validate_code(
    code: &str,
    language: ScriptLanguage,
    rules: &[CodeValidationRule],
) -> Result<(), CollectionError> {
    ensure_valid_rules(rules)?;

    let lines = split_code_lines(code);
    let mut errors_by_line: BTreeMap<usize, Vec<String>> = BTreeMap::new();
    for rule in rules {
        for invalid in analyzer_for(*rule)(&lines, language) {
            errors_by_line
                .entry(invalid.line_number)
                .or_default()
                .push(invalid.error);
        }
    }

    if errors_by_line.is_empty() {
        return Ok(());
    }

    Err(CollectionError::new(
        "CODE_VALIDATION_FAILED",
        format_report(&lines, &errors_by_line),
    ))
}

fn ensure_valid_rules(rules: &[CodeValidationRule]) -> Result<(), CollectionError> {
    if rules.is_empty() {
        return Err(CollectionError::new(
            "VALIDATION_RULES_MISSING",
            "At least one validation rule is required.",
        ));
    }
    let mut seen = BTreeSet::new();
    let duplicates = rules
        .iter()
        .filter(|rule| !seen.insert(**rule))
        .map(|rule| format!("{:?}", rule))
        .collect::<BTreeSet<_>>();
    if !duplicates.is_empty() {
        return Err(CollectionError::new(
            "DUPLICATE_RULE",
            format!(
                "Duplicate validation rules: {}.",
                duplicates.into_iter().collect::<Vec<_>>().join(", ")
            ),
        ));
    }
    Ok(())
}

fn format_report(lines: &[CodeLine], errors_by_line: &BTreeMap<usize, Vec<String>>) -> String {
    let mut out = vec!["Errors with the code.".to_string()];
    for line in lines {
        let errors = errors_by_line.get(&line.line_number);
        let marker = if errors.is_some() { "❌" } else { "✅" };
        out.push(format!(
            "[{}] {} {}",
            line.line_number,
            marker,
            truncate_for_display(&line.text)
        ));
        for error in errors.into_iter().flatten() {
            out.push(indent_text(&format!("⟶ {}", error)));
        }
    }
    out.join("\n")
}

fn truncate_for_display(text: &str) -> String {
    let length = text.chars().count();
    if length <= MAX_DISPLAYED_LINE_LENGTH {
        return text.to_string();
    }
    let shown = text.chars().take(MAX_DISPLAYED_LINE_LENGTH).collect::<String>();
    format!("{}… [truncated, {} characters total]", shown, length)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_code_lines_numbers_from_one_and_strips_carriage_returns() {
        let lines = split_code_lines("a\r\nb\n\nc");
        assert_eq!(
            lines.iter().map(|l| l.line_number).collect::<Vec<_>>(),
            vec![1, 2, 3, 4]
        );
        assert_eq!(lines[1].text, "b");
        assert_eq!(lines[2].text, "");
    }

    #[test]
    fn split_code_lines_treats_every_line_break_style_as_separator() {
        let texts = split_code_lines("line1\r\nline2\rline3\nline4")
            .into_iter()
            .map(|line| line.text)
            .collect::<Vec<_>>();
        assert_eq!(texts, vec!["line1", "line2", "line3", "line4"]);
    }

    #[test]
    fn lines_separated_by_carriage_returns_are_checked() {
        let error = validate_code(
            "echo hello\recho hello",
            ScriptLanguage::Shellscript,
            &[CodeValidationRule::NoDuplicatedLines],
        )
        .expect_err("duplicate across carriage return");
        assert!(error.message.contains("Line is duplicated at line numbers 1,2."));

        let error = validate_code(
            "echo a\r\recho b",
            ScriptLanguage::Shellscript,
            &[CodeValidationRule::NoEmptyLines],
        )
        .expect_err("empty line between carriage returns");
        assert!(error.message.contains("[2] ❌ "));
    }

    #[test]
    fn valid_code_passes_all_rules() {
        validate_code(
            "echo a\necho b",
            ScriptLanguage::Shellscript,
            &[
                CodeValidationRule::NoEmptyLines,
                CodeValidationRule::NoDuplicatedLines,
                CodeValidationRule::NoTooLongLines,
                CodeValidationRule::NoCommentOnlyLines,
            ],
        )
        .expect("valid code");
    }

    #[test]
    fn report_lists_every_offending_line_with_markers() {
        let error = validate_code(
            "echo hello\n\necho hello\necho ok",
            ScriptLanguage::Shellscript,
            &[
                CodeValidationRule::NoEmptyLines,
                CodeValidationRule::NoDuplicatedLines,
            ],
        )
        .expect_err("invalid code");

        assert_eq!(error.code, "CODE_VALIDATION_FAILED");
        let expected = [
            "Errors with the code.",
            "[1] ❌ echo hello",
            "    ⟶ Line is duplicated at line numbers 1,3.",
            "[2] ❌ ",
            "    ⟶ Empty line",
            "[3] ❌ echo hello",
            "    ⟶ Line is duplicated at line numbers 1,3.",
            "[4] ✅ echo ok",
        ]
        .join("\n");
        assert_eq!(error.message, expected);
    }

    #[test]
    fn long_lines_are_truncated_in_report() {
        let long = "x".repeat(9000);
        let error = validate_code(
            &long,
            ScriptLanguage::Batchfile,
            &[CodeValidationRule::NoTooLongLines],
        )
        .expect_err("too long");
        assert!(error.message.contains("[truncated, 9000 characters total]"));
        assert!(!error.message.contains(&"x".repeat(200)));
    }

    #[test]
    fn duplicate_rules_are_rejected() {
        let error = validate_code(
            "echo a",
            ScriptLanguage::Batchfile,
            &[
                CodeValidationRule::NoEmptyLines,
                CodeValidationRule::NoEmptyLines,
            ],
        )
        .expect_err("duplicate rule");
        assert_eq!(error.code, "DUPLICATE_RULE");
        assert!(error.message.contains("NoEmptyLines"));
    }

    #[test]
    fn empty_rule_set_is_rejected() {
        let error =
            validate_code("echo a", ScriptLanguage::Batchfile, &[]).expect_err("no rules");
        assert_eq!(error.code, "VALIDATION_RULES_MISSING");
    }
}
