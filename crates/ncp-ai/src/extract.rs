//! Pull a JSON object out of free-form model output.
//!
//! Models wrap JSON in prose or Markdown fences. Extraction strips a UTF-8
//! BOM, prefers the first fenced block that holds an object, then takes the
//! span from the first `{` to the last `}`.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;

use crate::error::AiError;

static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```").expect("fence pattern is valid")
});

/// The JSON object text inside `raw`, if any.
pub fn extract_json_object(raw: &str) -> Option<&str> {
    let text = raw.trim_start_matches('\u{feff}').trim();

    let text = match FENCED_OBJECT.captures(text).and_then(|c| c.get(1)) {
        Some(m) => m.as_str(),
        None => text,
    };

    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (start < end).then(|| &text[start..=end])
}

/// Extract and deserialize a JSON object from model output.
pub fn parse_json_response<T: DeserializeOwned>(raw: &str) -> Result<T, AiError> {
    let json = extract_json_object(raw)
        .ok_or_else(|| AiError::ResponseParse(format!("no JSON object in response: {}", preview(raw))))?;

    serde_json::from_str(json).map_err(|e| {
        AiError::SchemaViolation(format!("{e}. Response: {}", preview(raw)))
    })
}

fn preview(raw: &str) -> String {
    const MAX: usize = 200;
    if raw.chars().count() > MAX {
        format!("{}...", raw.chars().take(MAX).collect::<String>())
    } else {
        raw.to_string()
    }
}
