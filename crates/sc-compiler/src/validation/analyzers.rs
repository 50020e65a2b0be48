use std::collections::BTreeMap;

use sc_core::ScriptLanguage;

use crate::syntax::syntax_of;

use super::{CodeLine, InvalidCodeLine};

const BATCH_FILE_MAX_LINE_LENGTH: usize = 8191;
const SHELL_SCRIPT_MAX_LINE_LENGTH: usize = 1_048_576;

pub(crate) fn analyze_empty_lines(lines: &[CodeLine], _: ScriptLanguage) -> Vec<InvalidCodeLine> {
    lines
        .iter()
        .filter(|line| line.text.trim().is_empty())
        .map(|line| InvalidCodeLine {
            line_number: line.line_number,
            error: if line.text.is_empty() {
                "Empty line".to_string()
            } else {
                format!(
                    "Empty line: \"{}\"",
                    line.text.replace(' ', "{whitespace}").replace('\t', "{tab}")
                )
            },
        })
        .collect()
}

pub(crate) fn analyze_duplicate_lines(
    lines: &[CodeLine],
    language: ScriptLanguage,
) -> Vec<InvalidCodeLine> {
    let syntax = syntax_of(language);
    let mut occurrences: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for line in lines {
        if syntax.is_comment_line(&line.text) || syntax.is_common_code_only(&line.text) {
            continue;
        }
        occurrences
            .entry(line.text.as_str())
            .or_default()
            .push(line.line_number);
    }

    lines
        .iter()
        .filter_map(|line| {
            let numbers = occurrences.get(line.text.as_str())?;
            if numbers.len() < 2 {
                return None;
            }
            Some(InvalidCodeLine {
                line_number: line.line_number,
                error: format!(
                    "Line is duplicated at line numbers {}.",
                    numbers
                        .iter()
                        .map(usize::to_string)
                        .collect::<Vec<_>>()
                        .join(",")
                ),
            })
        })
        .collect()
}

pub(crate) fn max_line_length(language: ScriptLanguage) -> usize {
    match language {
        // cmd.exe rejects command lines beyond this length.
        ScriptLanguage::Batchfile => BATCH_FILE_MAX_LINE_LENGTH,
        ScriptLanguage::Shellscript => SHELL_SCRIPT_MAX_LINE_LENGTH,
    }
}

pub(crate) fn analyze_too_long_lines(
    lines: &[CodeLine],
    language: ScriptLanguage,
) -> Vec<InvalidCodeLine> {
    let max_length = max_line_length(language);
    lines
        .iter()
        .filter_map(|line| {
            let length = line.text.chars().count();
            if length <= max_length {
                return None;
            }
            Some(InvalidCodeLine {
                line_number: line.line_number,
                error: format!(
                    "Line is too long ({}). It exceed maximum allowed length {} by {} characters. \
                     This may cause bugs due to unintended trimming by operating system, shells \
                     or terminal emulators.",
                    length,
                    max_length,
                    length - max_length
                ),
            })
        })
        .collect()
}

pub(crate) fn analyze_comment_only_code(
    lines: &[CodeLine],
    language: ScriptLanguage,
) -> Vec<InvalidCodeLine> {
    let syntax = syntax_of(language);
    if lines.is_empty() || !lines.iter().all(|line| syntax.is_comment_line(&line.text)) {
        return Vec::new();
    }
    lines
        .iter()
        .map(|line| InvalidCodeLine {
            line_number: line.line_number,
            error: "Code consists only of comments.".to_string(),
        })
        .collect()
}
