//! Templates used in function code and call arguments.
//!
//! ```text
//! {{ $name }}                      argument of parameter `name`
//! {{ $name | escapeDoubleQuotes }} argument passed through pipes
//! {{ with $name }}..{{ . }}..{{ end }}  rendered only for a non-empty argument
//! \{{                              literal `{{`
//! ```

mod pipes;

use std::collections::{BTreeMap, BTreeSet};

use sc_core::CollectionError;

pub use pipes::{apply_pipeline, Pipe};

const EXPRESSION_START: &str = "{{";
const EXPRESSION_END: &str = "}}";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Parameter { name: String, pipes: Vec<Pipe> },
    With { name: String, body: Vec<Segment> },
    ContextValue { pipes: Vec<Pipe> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Directive {
    Parameter { name: String, pipes: Vec<Pipe> },
    With { name: String },
    End,
    ContextValue { pipes: Vec<Pipe> },
}

/// A parsed template, ready to be rendered against call arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    segments: Vec<Segment>,
}

struct WithFrame {
    name: String,
    body: Vec<Segment>,
}

impl Template {
    pub fn parse(source: &str) -> Result<Self, CollectionError> {
        let mut root = Vec::new();
        let mut frames: Vec<WithFrame> = Vec::new();
        let mut text = String::new();
        let mut rest = source;

        while let Some(start) = rest.find(EXPRESSION_START) {
            if rest[..start].ends_with('\\') {
                text.push_str(&rest[..start - 1]);
                text.push_str(EXPRESSION_START);
                rest = &rest[start + EXPRESSION_START.len()..];
                continue;
            }
            text.push_str(&rest[..start]);

            let after_start = &rest[start + EXPRESSION_START.len()..];
            let Some(end) = after_start.find(EXPRESSION_END) else {
                return Err(syntax_error(
                    format!(
                        "Unterminated expression starting at \"{}\".",
                        preview(&rest[start..])
                    ),
                    source,
                ));
            };
            let inner = &after_start[..end];
            rest = &after_start[end + EXPRESSION_END.len()..];

            let directive = parse_directive(inner).map_err(|error| {
                error.wrap(format!("Invalid expression \"{{{{{}}}}}\".", inner))
            })?;
            let inside_with = !frames.is_empty();
            let target = match frames.last_mut() {
                Some(frame) => &mut frame.body,
                None => &mut root,
            };

            match directive {
                Directive::Parameter { name, pipes } => {
                    flush_text(&mut text, target);
                    target.push(Segment::Parameter { name, pipes });
                }
                Directive::ContextValue { pipes } => {
                    if !inside_with {
                        return Err(syntax_error(
                            "Context variable before `with` statement.",
                            source,
                        ));
                    }
                    flush_text(&mut text, target);
                    target.push(Segment::ContextValue { pipes });
                }
                Directive::With { name } => {
                    flush_text(&mut text, target);
                    frames.push(WithFrame {
                        name,
                        body: Vec::new(),
                    });
                    rest = rest.trim_start();
                }
                Directive::End => {
                    let trimmed_len = text.trim_end().len();
                    text.truncate(trimmed_len);
                    flush_text(&mut text, target);
                    let Some(frame) = frames.pop() else {
                        return Err(syntax_error(
                            "Redundant `end` statement, missing `with`?",
                            source,
                        ));
                    };
                    let parent = match frames.last_mut() {
                        Some(parent) => &mut parent.body,
                        None => &mut root,
                    };
                    parent.push(Segment::With {
                        name: frame.name,
                        body: frame.body,
                    });
                }
            }
        }

        if !frames.is_empty() {
            return Err(syntax_error(
                "Missing `end` statement, forgot `{{ end }}`?",
                source,
            ));
        }
        text.push_str(rest);
        flush_text(&mut text, &mut root);
        Ok(Self { segments: root })
    }

    /// Names of every parameter the template reads, including `with` targets.
    pub fn parameter_names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        collect_parameter_names(&self.segments, &mut names);
        names
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn render(&self, args: &BTreeMap<String, String>) -> Result<String, CollectionError> {
        let mut out = String::new();
        render_segments(&self.segments, args, None, &mut out)?;
        Ok(out)
    }
}

fn parse_directive(inner: &str) -> Result<Directive, CollectionError> {
    let trimmed = inner.trim();
    if trimmed == "end" {
        return Ok(Directive::End);
    }

    if let Some(target) = trimmed.strip_prefix("with") {
        if target.starts_with(char::is_whitespace) {
            let target = target.trim();
            let Some(name) = target.strip_prefix('$') else {
                return Err(directive_error("`with` expects a parameter like `$name`."));
            };
            return Ok(Directive::With {
                name: parse_parameter_name(name)?,
            });
        }
    }

    let mut parts = trimmed.split('|').map(str::trim);
    let head = parts.next().unwrap_or_default();
    let pipes = parts.map(Pipe::from_name).collect::<Result<Vec<_>, _>>()?;

    if head == "." {
        return Ok(Directive::ContextValue { pipes });
    }
    if let Some(name) = head.strip_prefix('$') {
        return Ok(Directive::Parameter {
            name: parse_parameter_name(name)?,
            pipes,
        });
    }
    Err(directive_error(
        "Expected `$parameter`, `.`, `with $parameter` or `end`.",
    ))
}

fn parse_parameter_name(name: &str) -> Result<String, CollectionError> {
    if name.is_empty() || !name.chars().all(|ch| ch.is_ascii_alphanumeric()) {
        return Err(directive_error(format!(
            "Parameter name \"{}\" must be alphanumeric.",
            name
        )));
    }
    Ok(name.to_string())
}

fn flush_text(text: &mut String, target: &mut Vec<Segment>) {
    if text.is_empty() {
        return;
    }
    target.push(Segment::Text(std::mem::take(text)));
}

fn collect_parameter_names(segments: &[Segment], names: &mut BTreeSet<String>) {
    for segment in segments {
        match segment {
            Segment::Text(_) | Segment::ContextValue { .. } => {}
            Segment::Parameter { name, .. } => {
                names.insert(name.clone());
            }
            Segment::With { name, body } => {
                names.insert(name.clone());
                collect_parameter_names(body, names);
            }
        }
    }
}

fn render_segments(
    segments: &[Segment],
    args: &BTreeMap<String, String>,
    context_value: Option<&str>,
    out: &mut String,
) -> Result<(), CollectionError> {
    for segment in segments {
        match segment {
            Segment::Text(text) => out.push_str(text),
            Segment::Parameter { name, pipes } => {
                let value = args.get(name).filter(|value| !value.is_empty()).ok_or_else(|| {
                    CollectionError::new(
                        "MISSING_ARGUMENT",
                        format!("Missing argument value for parameter \"{}\".", name),
                    )
                })?;
                out.push_str(&apply_pipeline(value, pipes));
            }
            Segment::With { name, body } => {
                if let Some(value) = args.get(name).filter(|value| !value.is_empty()) {
                    render_segments(body, args, Some(value), out)?;
                }
            }
            Segment::ContextValue { pipes } => {
                // The parser only builds context values inside `with` bodies.
                out.push_str(&apply_pipeline(context_value.unwrap_or_default(), pipes));
            }
        }
    }
    Ok(())
}

fn syntax_error(message: impl Into<String>, source: &str) -> CollectionError {
    CollectionError::new(
        "TEMPLATE_SYNTAX_INVALID",
        format!("{}\nCode:\n---\n{}\n---", message.into(), source),
    )
}

fn directive_error(message: impl Into<String>) -> CollectionError {
    CollectionError::new("TEMPLATE_SYNTAX_INVALID", message)
}

fn preview(text: &str) -> String {
    text.chars().take(40).collect()
}
