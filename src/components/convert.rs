use serde_json::{Map, Value};

use super::{Data, Message};

/// Turn message text into a data payload. A JSON object becomes the payload
/// itself; any other non-empty text is wrapped as `{"text": ...}`.
#[inline]
pub fn message_to_data(message: Option<&Message>) -> Data {
    let Some(text) = message.map(|m| m.text.as_str()).filter(|t| !t.is_empty()) else {
        return Data::default();
    };

    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text) {
        return Data::new(map);
    }

    let mut map = Map::new();
    map.insert("text".to_string(), Value::String(text.to_string()));
    Data::new(map)
}
