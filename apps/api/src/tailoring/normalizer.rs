//! Response Normalizer — coerces raw model output into the shapes callers expect.
//!
//! Small models routinely ignore "return ONLY JSON". String lists degrade to a
//! line-oriented fallback; the structured resume does not, because arbitrary
//! text cannot be mapped onto six named sections.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::llm_client::{head, SNIPPET_LIMIT};

/// Tagged result of a tolerant parse.
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized<T> {
    /// The model emitted valid JSON of the expected shape.
    Parsed(T),
    /// The model did not; lines were salvaged from the raw text.
    Fallback(Vec<String>),
}

impl Normalized<Vec<String>> {
    pub fn into_inner(self) -> Vec<String> {
        match self {
            Normalized::Parsed(items) | Normalized::Fallback(items) => items,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Normalized::Parsed(_) => "json",
            Normalized::Fallback(_) => "line-fallback",
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("model output is not a JSON object: {reason}")]
    UnparsableStructure { reason: String, body_head: String },
}

/// Six-section view of a resume. Every field is always present.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredResume {
    pub profile: String,
    pub summary: String,
    pub education: String,
    pub skills: String,
    pub work_experience: String,
    pub projects: String,
}

/// Markers stripped from the front of fallback lines.
const BULLET_MARKERS: &[char] = &['-', '•'];

/// Parses a JSON array of strings, falling back to one item per non-empty line.
/// Never fails.
pub fn as_string_list(raw: &str) -> Normalized<Vec<String>> {
    let body = strip_json_fences(raw);
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(body) {
        let strings: Option<Vec<String>> = items
            .into_iter()
            .map(|item| match item {
                Value::String(s) => Some(s),
                _ => None,
            })
            .collect();
        if let Some(strings) = strings {
            return Normalized::Parsed(strings);
        }
    }
    Normalized::Fallback(split_lines(body))
}

fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(|line| line.trim().trim_start_matches(BULLET_MARKERS).trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parses a JSON object into a `StructuredResume`, flattening non-string
/// section values and defaulting absent ones to "".
pub fn as_structured_resume(raw: &str) -> Result<StructuredResume, NormalizeError> {
    let unparsable = |reason: String| NormalizeError::UnparsableStructure {
        reason,
        body_head: head(raw, SNIPPET_LIMIT),
    };

    let object = match serde_json::from_str::<Value>(strip_json_fences(raw)) {
        Ok(Value::Object(object)) => object,
        Ok(other) => return Err(unparsable(format!("expected an object, got {}", kind(&other)))),
        Err(e) => return Err(unparsable(e.to_string())),
    };

    Ok(StructuredResume {
        profile: section(&object, "profile"),
        summary: section(&object, "summary"),
        education: section(&object, "education"),
        skills: section(&object, "skills"),
        work_experience: section(&object, "work_experience"),
        projects: section(&object, "projects"),
    })
}

fn section(object: &Map<String, Value>, key: &str) -> String {
    object.get(key).map(flatten).unwrap_or_default()
}

/// Renders any JSON value as plain text.
fn flatten(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(_) | Value::Number(_) => value.to_string(),
        Value::Array(items) => items
            .iter()
            .map(flatten)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Object(fields) => fields
            .iter()
            .map(|(k, v)| format!("{k}: {}", flatten(v)))
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// First non-empty line, without surrounding whitespace or quotes.
pub fn as_single_line(raw: &str) -> String {
    raw.lines()
        .map(|line| line.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`').trim())
        .find(|line| !line.is_empty())
        .unwrap_or("")
        .to_string()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => {
            let stripped = stripped.trim_start();
            stripped
                .strip_suffix("```")
                .map(str::trim)
                .unwrap_or(stripped)
        }
        None => text,
    }
}
