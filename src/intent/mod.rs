//! Intent detection for smart store-or-search inputs.
//!
//! A JSON object is something to persist; anything else is a query.

#[cfg(test)]
mod tests;

use serde_json::{Map, Value};

/// Keys recognised when deriving a readable content string, in output order.
pub const CONTENT_KEYS: [(&str, &str); 6] = [
    ("title", "Title"),
    ("description", "Description"),
    ("code", "Code"),
    ("content", "Content"),
    ("language", "Language"),
    ("tags", "Tags"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Blank or whitespace-only input
    Empty,
    /// Input parsed as a JSON object
    Store(Map<String, Value>),
    /// Free text, trimmed
    Search(String),
}

impl Intent {
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::Store(_) => "store",
            Self::Search(_) => "search",
        }
    }
}

/// Classify raw input. A single parse attempt decides; JSON that is not an
/// object (arrays, numbers, strings) is treated as a search query.
#[inline]
pub fn detect_intent(input: &str) -> Intent {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Intent::Empty;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::Object(map)) => Intent::Store(map),
        _ => Intent::Search(trimmed.to_string()),
    }
}

/// Build the human-readable content string stored alongside structured data.
///
/// Never returns an empty string: with no recognised key the whole mapping is
/// serialized instead.
#[inline]
pub fn extract_content(data: &Map<String, Value>) -> String {
    let parts: Vec<String> = CONTENT_KEYS
        .iter()
        .filter_map(|(key, label)| {
            data.get(*key)
                .map(|value| format!("{}: {}", label, render_value(key, value)))
        })
        .collect();

    if parts.is_empty() {
        return Value::Object(data.clone()).to_string();
    }

    parts.join(" | ")
}

fn render_value(key: &str, value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(items) if key == "tags" => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}
