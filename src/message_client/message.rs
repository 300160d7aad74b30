use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

/// A message as sent by the message client.
///
/// On the wire the kind is stored in the `type` field:
/// `{"type": "number", "data": 42}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Message {
    /// The payload, if it is a string.
    #[must_use]
    pub fn string_data(&self) -> Option<&str> {
        self.data.as_ref().and_then(Value::as_str)
    }

    /// The payload, if it is a number.
    #[must_use]
    pub fn number_data(&self) -> Option<&Number> {
        match &self.data {
            Some(Value::Number(n)) => Some(n),
            _ => None,
        }
    }
}

/// Returns `true` if `raw` parses as JSON.
#[must_use]
pub fn is_valid_json(raw: &str) -> bool {
    serde_json::from_str::<Value>(raw).is_ok()
}

/// Returns `true` if `value` is an object with a string `type` field.
#[must_use]
pub fn is_message(value: &Value) -> bool {
    value.get("type").map_or(false, Value::is_string)
}

/// Converts a JSON value already checked with [`is_message`] into a [`Message`].
///
/// # Errors
///
/// Returns an error if `value` does not have the shape of a [`Message`].
pub fn parse_message(value: Value) -> Result<Message, serde_json::Error> {
    serde_json::from_value(value)
}
