//! Patch and wire request
//!
//! On the wire a patch travels as
//! `{"settings": {"set": {<key>: <value>, ...}, "del": [<key>, ...]}}`.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value as JsonValue};

use kvs_value::{parse_number, Value};

/// Wire form of "no value"
pub const NO_NUMBER_WIRE: &str = "nan";

/// Minimal description of pending edits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Patch {
    /// Keys to write, in traversal order
    #[serde(default)]
    pub set: IndexMap<String, JsonValue>,
    /// Keys to delete
    #[serde(default)]
    pub del: Vec<String>,
}

impl Patch {
    /// Create empty patch
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the patch writes and deletes nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.del.is_empty()
    }

    /// Queue a write
    pub fn insert(&mut self, key: impl Into<String>, value: JsonValue) {
        self.set.insert(key.into(), value);
    }

    /// Queue a deletion unless the key is already written or deleted
    ///
    /// Returns whether the key was added.
    pub fn delete(&mut self, key: impl Into<String>) -> bool {
        let key = key.into();
        if self.set.contains_key(&key) || self.del.contains(&key) {
            return false;
        }
        self.del.push(key);
        true
    }

    /// Wrap for sending
    #[inline]
    #[must_use]
    pub fn into_request(self) -> WireRequest {
        WireRequest { settings: self }
    }
}

/// Request envelope sent to the device
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireRequest {
    /// The patch
    pub settings: Patch,
}

impl WireRequest {
    /// Serialize to a JSON string
    ///
    /// # Errors
    ///
    /// Fails only if a value cannot be represented in JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Wire form of a field value, `None` when it contributes nothing
///
/// Booleans become 0/1 and "no value" becomes `"nan"`. With
/// `numeric_strings`, text that parses as a number is sent as a number.
#[must_use]
pub fn wire_value(value: &Value, numeric_strings: bool) -> Option<JsonValue> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(JsonValue::from(u8::from(*b))),
        Value::Number(n) => Some(number_to_json(*n)),
        Value::NoNumber => Some(JsonValue::from(NO_NUMBER_WIRE)),
        Value::Text(s) if numeric_strings => Some(
            parse_number(s).map_or_else(|| JsonValue::String(s.clone()), number_to_json),
        ),
        Value::Text(s) => Some(JsonValue::String(s.clone())),
        Value::Bits(bits) => Some(JsonValue::from(*bits)),
    }
}

#[allow(clippy::cast_possible_truncation)]
fn number_to_json(n: f64) -> JsonValue {
    if n.fract() == 0.0 && n.abs() < 9.0e15 {
        JsonValue::from(n as i64)
    } else {
        Number::from_f64(n).map_or_else(|| JsonValue::from(NO_NUMBER_WIRE), JsonValue::Number)
    }
}
