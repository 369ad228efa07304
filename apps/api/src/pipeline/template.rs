//! Template Renderer — fills `{variable}` placeholders from the pipeline context.
//!
//! Syntax:
//! - `{name}` where `name` is `[A-Za-z_][A-Za-z0-9_]*` is a placeholder
//! - `{{` and `}}` are literal braces (for JSON examples inside prompts)
//! - any other brace is copied as-is
//!
//! Rendering never substitutes an empty string for a missing variable.

use serde_json::Value;

use crate::pipeline::context::PipelineContext;
use crate::pipeline::error::TemplateError;

/// One lexical piece of a template.
#[derive(Debug, PartialEq)]
enum Segment<'a> {
    Literal(&'a str),
    Brace(char),
    Placeholder(&'a str),
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Length of the identifier placeholder starting at `bytes[0] == b'{'`, including
/// both braces, or `None` if this brace does not open a placeholder.
fn placeholder_len(bytes: &[u8]) -> Option<usize> {
    if bytes.len() < 3 || !is_ident_start(bytes[1]) {
        return None;
    }
    let mut i = 2;
    while i < bytes.len() && is_ident_continue(bytes[i]) {
        i += 1;
    }
    (i < bytes.len() && bytes[i] == b'}').then_some(i + 1)
}

fn segments(template: &str) -> Vec<Segment<'_>> {
    let bytes = template.as_bytes();
    let mut out = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let rest = &bytes[i..];
        let (segment, consumed) = match rest[0] {
            b'{' if rest.get(1) == Some(&b'{') => (Segment::Brace('{'), 2),
            b'}' if rest.get(1) == Some(&b'}') => (Segment::Brace('}'), 2),
            b'{' => match placeholder_len(rest) {
                Some(len) => (Segment::Placeholder(&template[i + 1..i + len - 1]), len),
                None => {
                    i += 1;
                    continue;
                }
            },
            _ => {
                i += 1;
                continue;
            }
        };
        if literal_start < i {
            out.push(Segment::Literal(&template[literal_start..i]));
        }
        out.push(segment);
        i += consumed;
        literal_start = i;
    }

    if literal_start < bytes.len() {
        out.push(Segment::Literal(&template[literal_start..]));
    }
    out
}

/// Distinct placeholder names, in order of first appearance.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for segment in segments(template) {
        if let Segment::Placeholder(name) = segment {
            if !names.iter().any(|n| n == name) {
                names.push(name.to_string());
            }
        }
    }
    names
}

/// Text substituted for a context value.
pub fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
        }
        other => other.to_string(),
    }
}

/// Renders `template` against `context`.
///
/// Fails with the FIRST placeholder (left to right) that has no context value.
pub fn render(template: &str, context: &PipelineContext) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    for segment in segments(template) {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Brace(c) => out.push(c),
            Segment::Placeholder(name) => {
                let value = context
                    .get(name)
                    .ok_or_else(|| TemplateError::MissingVariable(name.to_string()))?;
                out.push_str(&stringify(value));
            }
        }
    }
    Ok(out)
}
