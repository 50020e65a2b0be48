use sc_core::{CollectionError, ScriptLanguage};

/// Lexical facts the line analyzers need about a scripting language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageSyntax {
    pub comment_delimiters: &'static [&'static str],
    /// Tokens that may legitimately repeat on their own lines, e.g. a lone `)`.
    pub common_code_parts: &'static [&'static str],
}

static BATCH_FILE_SYNTAX: LanguageSyntax = LanguageSyntax {
    comment_delimiters: &["REM", "::"],
    common_code_parts: &["(", ")", "else", "||"],
};

static SHELL_SCRIPT_SYNTAX: LanguageSyntax = LanguageSyntax {
    comment_delimiters: &["#"],
    common_code_parts: &["(", ")", "else", "fi", "then", "}", "{", "done", "do", "esac", ";;"],
};

pub fn syntax_of(language: ScriptLanguage) -> &'static LanguageSyntax {
    match language {
        ScriptLanguage::Batchfile => &BATCH_FILE_SYNTAX,
        ScriptLanguage::Shellscript => &SHELL_SCRIPT_SYNTAX,
    }
}

/// Looks a syntax up by language name.
pub fn get_syntax(language: &str) -> Result<&'static LanguageSyntax, CollectionError> {
    ScriptLanguage::from_name(language).map(syntax_of)
}

impl LanguageSyntax {
    /// A full-line comment starts with a delimiter, compared case-insensitively
    /// and without trimming leading whitespace.
    pub fn is_comment_line(&self, line: &str) -> bool {
        let lowered = line.to_lowercase();
        self.comment_delimiters
            .iter()
            .any(|delimiter| lowered.starts_with(&delimiter.to_lowercase()))
    }

    pub fn is_common_code_only(&self, line: &str) -> bool {
        !line.trim().is_empty()
            && line
                .split_whitespace()
                .all(|part| self.common_code_parts.contains(&part))
    }
}
