//! Field values
//!
//! Provides [`Value`], the coerced form every field is read as, together with
//! the small conversion helpers shared by all field kinds.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Strings accepted as `true` by boolean coercion (compared case-insensitively)
pub const TRUTHY_STRINGS: [&str; 5] = ["1", "y", "yes", "true", "on"];

/// Coerced value of a field
///
/// Comparison is strict: `Number(1.0)` never equals `Text("1")`.
/// [`Value::NoNumber`] compares equal to itself, so an empty number field
/// matches an empty baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "value")]
pub enum Value {
    /// No contribution to any patch
    Null,

    /// Boolean (checkbox) value
    Bool(bool),

    /// Finite number
    Number(f64),

    /// Number field left empty, or holding unparseable input
    NoNumber,

    /// Raw string
    Text(String),

    /// Multi-select bit set, bit `i` set iff option `i` is selected
    Bits(u32),
}

impl Value {
    /// Build a text value
    #[inline]
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Build a number value, mapping non-finite input to [`Value::NoNumber`]
    #[inline]
    #[must_use]
    pub fn number(value: f64) -> Self {
        if value.is_finite() {
            Self::Number(value)
        } else {
            Self::NoNumber
        }
    }

    /// Check for [`Value::Null`]
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Stringified form used when a value is written into a text-like field
    ///
    /// `Null` becomes the empty string, integral numbers drop the fraction.
    #[must_use]
    pub fn to_text(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => format_number(*n),
            Self::NoNumber => "NaN".to_string(),
            Self::Text(s) => s.clone(),
            Self::Bits(bits) => bits.to_string(),
        }
    }

    /// Truthiness used by boolean coercion
    #[must_use]
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Null | Self::NoNumber => false,
            Self::Bool(b) => *b,
            Self::Number(n) => *n != 0.0,
            Self::Text(s) => string_to_bool(s),
            Self::Bits(bits) => *bits != 0,
        }
    }

    /// Convert a scalar JSON value pushed by the device
    ///
    /// Objects and arrays have no scalar meaning and yield `None`.
    #[must_use]
    pub fn from_json(value: &JsonValue) -> Option<Self> {
        match value {
            JsonValue::Null => Some(Self::Null),
            JsonValue::Bool(b) => Some(Self::Bool(*b)),
            JsonValue::Number(n) => n.as_f64().map(Self::number),
            JsonValue::String(s) => Some(Self::Text(s.clone())),
            JsonValue::Array(_) | JsonValue::Object(_) => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Text(s) => write!(f, "{s:?}"),
            other => write!(f, "{}", other.to_text()),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::number(value)
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Case-insensitive match against [`TRUTHY_STRINGS`]
#[must_use]
pub fn string_to_bool(value: &str) -> bool {
    let lower = value.to_lowercase();
    TRUTHY_STRINGS.contains(&lower.as_str())
}

/// Parse user input for a number field
///
/// Empty, unparseable and non-finite input yields `None`.
#[must_use]
pub fn parse_number(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

/// Format a number the way the device expects to read it back
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}
