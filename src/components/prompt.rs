use serde_json::Value;
use tracing::debug;

use super::{Data, Message};

/// Output of [`build_prompt`]: the prompt plus a short status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltPrompt {
    pub prompt: Message,
    pub status: String,
}

/// Payload of an API response: the `result` field of a request wrapper, or
/// the whole mapping when there is no wrapper
#[inline]
pub fn extract_result(api_response: &Data) -> Option<Value> {
    match api_response.data.get("result") {
        Some(result) => Some(result.clone()),
        None => Some(Value::Object(api_response.data.clone())),
    }
    .filter(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render the fixed instruction prompt that asks a model to explain API data
/// in plain sentences, using the supplied domain knowledge.
#[inline]
pub fn build_prompt(api_response: Option<&Data>, domain_knowledge: Option<&Message>) -> BuiltPrompt {
    let api_data = api_response
        .and_then(extract_result)
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_default();
    let knowledge = domain_knowledge
        .map(|m| m.text.clone())
        .unwrap_or_default();

    let prompt = format!(
        "Convert this API response data into natural, human-readable sentences.

API Data:
{api_data}

Domain Knowledge:
{knowledge}

Instructions:
- Extract the most important and meaningful information
- Ignore technical fields (IDs, timestamps, coordinates, status codes)
- Focus on data that would be useful to a human
- Write 2-4 clear, natural sentences

Write only the natural language explanation:"
    );

    let mut parts = Vec::new();
    if !api_data.is_empty() {
        parts.push(format!("API: {} chars", api_data.chars().count()));
    }
    if !knowledge.is_empty() {
        parts.push(format!("Knowledge: {} chars", knowledge.chars().count()));
    }
    let status = if parts.is_empty() {
        format!("Prompt: {} chars", prompt.chars().count())
    } else {
        parts.join(" | ")
    };

    debug!("Built prompt ({})", status);
    BuiltPrompt {
        prompt: Message::new(prompt),
        status,
    }
}
