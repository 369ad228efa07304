//! Schema Validator — structural checks of an extracted value against a contract.
//!
//! Validation is a pure predicate: values are never mutated or coerced. Fields the
//! contract does not mention are ignored.

use serde_json::Value;

/// Expected kind of a field in a strict shape contract.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String { non_empty: bool },
    Number { min: Option<f64>, max: Option<f64> },
    // Not used by the built-in resume shapes
    #[allow(dead_code)]
    Bool,
    /// Array whose elements must all be strings.
    StringArray { non_empty: bool },
    #[allow(dead_code)]
    Array { non_empty: bool },
    #[allow(dead_code)]
    Object,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldRule {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldRule {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// The contract a stage output must satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaContract {
    /// Dot-separated paths that must resolve through nested objects.
    RequiredPaths(Vec<String>),
    /// Every declared field must exist with the declared kind.
    Shape(Vec<FieldRule>),
}

impl SchemaContract {
    pub fn required_paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        SchemaContract::RequiredPaths(paths.into_iter().map(Into::into).collect())
    }

    /// `summary: non-empty string`, `skills: non-empty array of strings`.
    pub fn resume_content() -> Self {
        SchemaContract::Shape(vec![
            FieldRule::new("summary", FieldKind::String { non_empty: true }),
            FieldRule::new("skills", FieldKind::StringArray { non_empty: true }),
        ])
    }

    /// `score` in [0, 100] plus three string arrays (which may be empty).
    pub fn resume_analysis() -> Self {
        SchemaContract::Shape(vec![
            FieldRule::new(
                "score",
                FieldKind::Number {
                    min: Some(0.0),
                    max: Some(100.0),
                },
            ),
            FieldRule::new("matchedKeywords", FieldKind::StringArray { non_empty: false }),
            FieldRule::new("missedKeywords", FieldKind::StringArray { non_empty: false }),
            FieldRule::new("suggestions", FieldKind::StringArray { non_empty: false }),
        ])
    }
}

/// Resolves a dot-separated path through nested objects.
///
/// A present `null` counts as resolved; only absent keys (or walking through a
/// non-object) fail.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn check_field(name: &str, kind: &FieldKind, value: &Value) -> Option<String> {
    match (kind, value) {
        (FieldKind::String { non_empty }, Value::String(s)) => (*non_empty && s.trim().is_empty())
            .then(|| format!("'{name}' must be a non-empty string")),
        (FieldKind::Number { min, max }, Value::Number(n)) => {
            let n = n.as_f64()?;
            let below = min.is_some_and(|m| n < m);
            let above = max.is_some_and(|m| n > m);
            (below || above).then(|| {
                format!(
                    "'{name}' = {n} is outside [{}, {}]",
                    min.map_or("-inf".to_string(), |m| m.to_string()),
                    max.map_or("inf".to_string(), |m| m.to_string()),
                )
            })
        }
        (FieldKind::Bool, Value::Bool(_)) => None,
        (FieldKind::StringArray { non_empty }, Value::Array(items)) => {
            if let Some(pos) = items.iter().position(|item| !item.is_string()) {
                Some(format!(
                    "'{name}[{pos}]' must be a string, found {}",
                    describe(&items[pos])
                ))
            } else {
                (*non_empty && items.is_empty())
                    .then(|| format!("'{name}' must be a non-empty array"))
            }
        }
        (FieldKind::Array { non_empty }, Value::Array(items)) => (*non_empty && items.is_empty())
            .then(|| format!("'{name}' must be a non-empty array")),
        (FieldKind::Object, Value::Object(_)) => None,
        (kind, other) => Some(format!(
            "'{name}' must be {}, found {}",
            expected(kind),
            describe(other)
        )),
    }
}

fn expected(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::String { .. } => "a string",
        FieldKind::Number { .. } => "a number",
        FieldKind::Bool => "a boolean",
        FieldKind::StringArray { .. } => "an array of strings",
        FieldKind::Array { .. } => "an array",
        FieldKind::Object => "an object",
    }
}

/// Every unmet rule, in contract order. Empty means the value is valid.
pub fn violations(value: &Value, contract: &SchemaContract) -> Vec<String> {
    match contract {
        SchemaContract::RequiredPaths(paths) => paths
            .iter()
            .filter(|path| resolve_path(value, path).is_none())
            .map(|path| format!("missing required field '{path}'"))
            .collect(),
        SchemaContract::Shape(rules) => {
            if !value.is_object() {
                return vec![format!("expected an object, found {}", describe(value))];
            }
            rules
                .iter()
                .filter_map(|rule| match value.get(&rule.name) {
                    None => Some(format!("missing required field '{}'", rule.name)),
                    Some(field) => check_field(&rule.name, &rule.kind, field),
                })
                .collect()
        }
    }
}

// Stages report `violations`; the boolean form serves fallback checks.
#[allow(dead_code)]
pub fn validate(value: &Value, contract: &SchemaContract) -> bool {
    violations(value, contract).is_empty()
}
