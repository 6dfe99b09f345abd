//! Envelope types exchanged with the orchestration host.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Plain text output
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub text: String,
}

impl Message {
    #[inline]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }

    #[inline]
    pub fn empty() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl From<String> for Message {
    #[inline]
    fn from(text: String) -> Self {
        Self { text }
    }
}

impl From<&str> for Message {
    #[inline]
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl std::fmt::Display for Message {
    #[inline]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Structured output
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub data: Map<String, Value>,
}

impl Data {
    #[inline]
    pub fn new(data: Map<String, Value>) -> Self {
        Self { data }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Text carried by the payload: its `text` field when present, otherwise
    /// the compact JSON of the whole mapping
    #[inline]
    pub fn text(&self) -> String {
        match self.data.get("text") {
            Some(Value::String(text)) => text.clone(),
            _ => Value::Object(self.data.clone()).to_string(),
        }
    }
}

impl From<Map<String, Value>> for Data {
    #[inline]
    fn from(data: Map<String, Value>) -> Self {
        Self { data }
    }
}
