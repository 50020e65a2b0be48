use serde_json::Value as JsonValue;
use thiserror::Error;

/// Raw nodes an executable-level failure happened on.
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutableErrorContext {
    pub self_data: JsonValue,
    pub parent_category: Option<JsonValue>,
}

/// Failure raised anywhere while compiling a collection.
///
/// `code` and `message` describe the root cause. Every boundary that rethrows
/// appends to `trace`, innermost first, so the rendered message reads from the
/// outermost context down to the root cause.
#[derive(Debug, Error, Clone)]
#[error("{}", render_error(.code, .message, .trace))]
pub struct CollectionError {
    pub code: String,
    pub message: String,
    pub trace: Vec<String>,
    pub executable: Option<Box<ExecutableErrorContext>>,
}

impl CollectionError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            trace: Vec::new(),
            executable: None,
        }
    }

    pub fn wrap(mut self, context: impl Into<String>) -> Self {
        self.trace.push(context.into());
        self
    }

    /// Attaches the raw executable nodes unless a deeper boundary already did.
    pub fn with_executable(
        mut self,
        self_data: &JsonValue,
        parent_category: Option<&JsonValue>,
    ) -> Self {
        if self.executable.is_none() {
            self.executable = Some(Box::new(ExecutableErrorContext {
                self_data: self_data.clone(),
                parent_category: parent_category.cloned(),
            }));
        }
        self
    }

    pub fn outermost_context(&self) -> Option<&str> {
        self.trace.last().map(String::as_str)
    }
}

fn render_error(code: &str, message: &str, trace: &[String]) -> String {
    let root = format!("{}: {}", code, message);
    let Some(outermost) = trace.last() else {
        return root;
    };

    let mut ascending = Vec::with_capacity(trace.len() + 1);
    ascending.push(root);
    ascending.extend(trace.iter().cloned());

    let steps = ascending
        .iter()
        .enumerate()
        .map(|(index, step)| format!("{}. {}", index + 1, indent_continuation(step)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "{}\nError Trace (starting from root cause):\n{}",
        outermost,
        indent_text(&steps)
    )
}

pub fn indent_text(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                String::new()
            } else {
                format!("    {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn indent_continuation(text: &str) -> String {
    let mut lines = text.lines();
    let first = lines.next().unwrap_or_default().to_string();
    let rest = lines.collect::<Vec<_>>().join("\n");
    if rest.is_empty() {
        first
    } else {
        format!("{}\n{}", first, indent_text(&rest))
    }
}
