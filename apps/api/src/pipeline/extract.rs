//! Structured Extractor — recovers one complete JSON value from raw generator text.
//!
//! The generator sometimes wraps JSON in prose, in markdown code fences, or embeds
//! an object inside commentary. Three tiers are tried in order, first success wins:
//!
//! 1. strip decoration (fences, one "Here is …:" / "The …:" preamble, whitespace)
//!    and parse the remainder as a whole
//! 2. parse from the first `{` to the last `}` of the original text as an object
//! 3. parse from the first `[` to the last `]` of the original text as an array
//!
//! Whole-text parsing goes first so an unrelated brace pair in surrounding prose
//! is never preferred over a clean response.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

pub const NO_JSON_FOUND: &str = "no parseable JSON found";

/// A single leading preamble line such as "Here is the analysis:" or "The result:".
static PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:here\s+is|here\s+are|here's|the)\b[^:{}\[\]\n]*:\s*")
        .expect("preamble pattern is valid")
});

/// Outcome of extraction. Never partially parsed.
// Stages call `extract_with_tier` to record the tier; this form is for callers
// that only need the value.
#[allow(dead_code)]
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    Parsed(Value),
    Failed(String),
}

/// Which fallback tier produced the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionTier {
    WholeText,
    EmbeddedObject,
    EmbeddedArray,
}

/// Removes ```json … ``` or ``` … ``` fences. Any language tag after the
/// opening fence is dropped.
fn strip_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    let rest = rest.trim();
    rest.strip_suffix("```").map(str::trim).unwrap_or(rest)
}

fn strip_preamble(text: &str) -> &str {
    match PREAMBLE.find(text) {
        Some(m) => &text[m.end()..],
        None => text,
    }
}

/// Tier-1 candidate: the text with known decoration removed.
fn strip_decoration(raw: &str) -> &str {
    strip_fences(strip_preamble(raw.trim()))
}

/// Substring from the first `open` to the last `close`, inclusive.
fn delimited(raw: &str, open: char, close: char) -> Option<&str> {
    let start = raw.find(open)?;
    let end = raw.rfind(close)?;
    (end > start).then(|| &raw[start..=end])
}

fn parse_delimited(raw: &str, open: char, close: char) -> Option<Value> {
    let candidate = delimited(raw, open, close)?;
    let value: Value = serde_json::from_str(candidate).ok()?;
    let shape_ok = match open {
        '{' => value.is_object(),
        _ => value.is_array(),
    };
    shape_ok.then_some(value)
}

/// Runs the three tiers and reports which one succeeded.
pub fn extract_with_tier(raw: &str) -> Option<(ExtractionTier, Value)> {
    if let Ok(value) = serde_json::from_str::<Value>(strip_decoration(raw)) {
        return Some((ExtractionTier::WholeText, value));
    }
    if let Some(value) = parse_delimited(raw, '{', '}') {
        return Some((ExtractionTier::EmbeddedObject, value));
    }
    parse_delimited(raw, '[', ']').map(|value| (ExtractionTier::EmbeddedArray, value))
}

/// Extracts the JSON value embedded in `raw`.
#[allow(dead_code)]
pub fn extract(raw: &str) -> ExtractionResult {
    match extract_with_tier(raw) {
        Some((_, value)) => ExtractionResult::Parsed(value),
        None => ExtractionResult::Failed(NO_JSON_FOUND.to_string()),
    }
}
