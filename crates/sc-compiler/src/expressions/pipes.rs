use std::sync::OnceLock;

use regex::{Captures, Regex};
use sc_core::CollectionError;

use crate::validation::split_lines;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipe {
    EscapeDoubleQuotes,
    InlinePowerShell,
}

impl Pipe {
    pub const ALL: [Pipe; 2] = [Pipe::EscapeDoubleQuotes, Pipe::InlinePowerShell];

    pub fn name(self) -> &'static str {
        match self {
            Pipe::EscapeDoubleQuotes => "escapeDoubleQuotes",
            Pipe::InlinePowerShell => "inlinePowerShell",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, CollectionError> {
        Self::ALL
            .into_iter()
            .find(|pipe| pipe.name() == name)
            .ok_or_else(|| {
                CollectionError::new(
                    "TEMPLATE_PIPE_UNKNOWN",
                    format!(
                        "Unknown pipe: \"{}\". Available pipes: {}.",
                        name,
                        Self::ALL.map(Pipe::name).join(", ")
                    ),
                )
            })
    }

    pub fn apply(self, value: &str) -> String {
        match self {
            Pipe::EscapeDoubleQuotes => escape_double_quotes(value),
            Pipe::InlinePowerShell => inline_powershell(value),
        }
    }
}

pub fn apply_pipeline(value: &str, pipes: &[Pipe]) -> String {
    pipes
        .iter()
        .fold(value.to_string(), |current, pipe| pipe.apply(&current))
}

/// Quotes survive being nested inside a batch `"..."` argument.
fn escape_double_quotes(value: &str) -> String {
    value.replace('"', "\"^\"\"")
}

fn inline_powershell(code: &str) -> String {
    if !code.contains('\n') && !code.contains('\r') {
        return code.to_string();
    }
    let code = inline_comments(code);
    let code = merge_lines_with_backtick(&code);
    let code = merge_here_strings(&code);
    merge_new_lines(&code)
}

fn inline_comments(code: &str) -> String {
    comment_regex()
        .replace_all(code, |caps: &Captures<'_>| match caps.get(1) {
            None => caps[0].to_string(),
            Some(comment) => {
                let value = comment.as_str().trim();
                if value.is_empty() {
                    "<##>".to_string()
                } else {
                    format!("<# {} #>", value)
                }
            }
        })
        .into_owned()
}

fn merge_lines_with_backtick(code: &str) -> String {
    backtick_regex().replace_all(code, " ").into_owned()
}

fn merge_here_strings(code: &str) -> String {
    let single_quoted = single_here_string_regex().replace_all(code, |caps: &Captures<'_>| {
        let escaped = caps[1].replace('\'', "''");
        let lines = split_lines(&escaped);
        format!("'{}'", lines.join("'+\"`r`n\"+'"))
    });
    double_here_string_regex()
        .replace_all(&single_quoted, |caps: &Captures<'_>| {
            let escaped = caps[1].replace('"', "`\"");
            let lines = split_lines(&escaped);
            format!("\"{}\"", lines.join("`r`n"))
        })
        .into_owned()
}

fn merge_new_lines(code: &str) -> String {
    split_lines(code)
        .into_iter()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("; ")
}

fn comment_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<#.*?#>|#(.*)").expect("comment regex"))
}

fn backtick_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r" +`\s*(?:\r\n|\r|\n)\s*").expect("backtick regex"))
}

fn single_here_string_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"@'\s*(?:\r\n|\r|\n)((?s:.)+?)(?:\r\n|\r|\n)'@").expect("here-string regex")
    })
}

fn double_here_string_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r#"@"\s*(?:\r\n|\r|\n)((?s:.)+?)(?:\r\n|\r|\n)"@"#).expect("here-string regex")
    })
}
