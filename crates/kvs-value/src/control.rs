//! Per-kind input state
//!
//! [`Control`] is the tagged union behind every field. Each operation
//! (read, write, default baseline) is one exhaustive match over it.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::value::{parse_number, Value};

/// Number of options a multi-select bit set can address
pub const MAX_BITSET_OPTIONS: u32 = 31;

/// Field kind discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldKind {
    /// Free text
    Text,
    /// Number input
    Number,
    /// Checkbox
    Boolean,
    /// Select with at most one option chosen
    SingleSelect,
    /// Select whose value is a bit set of chosen option indices
    MultiSelect,
}

impl FieldKind {
    /// Value an unset baseline stands for when comparing
    #[inline]
    #[must_use]
    pub fn empty_value(self) -> Value {
        match self {
            Self::Text => Value::Text(String::new()),
            Self::SingleSelect => Value::Null,
            Self::Number => Value::NoNumber,
            Self::Boolean => Value::Bool(false),
            Self::MultiSelect => Value::Bits(0),
        }
    }
}

/// One selectable option
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    /// Value submitted when selected
    pub value: String,
    /// Display label
    #[serde(default)]
    pub label: String,
    /// Disabled options read as null when selected
    #[serde(default)]
    pub disabled: bool,
    /// Selection state
    #[serde(default)]
    pub selected: bool,
}

impl Choice {
    /// Create an enabled, unselected option whose label equals its value
    #[inline]
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        let value = value.into();
        Self {
            label: value.clone(),
            value,
            disabled: false,
            selected: false,
        }
    }

    /// Set display label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Mark as disabled
    #[inline]
    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.disabled = true;
        self
    }

    /// Mark as selected
    #[inline]
    #[must_use]
    pub fn selected(mut self) -> Self {
        self.selected = true;
        self
    }
}

/// Option list of a selection field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Choices {
    options: Vec<Choice>,
}

impl Choices {
    /// Create from options
    #[must_use]
    pub fn new(options: impl IntoIterator<Item = Choice>) -> Self {
        Self {
            options: options.into_iter().collect(),
        }
    }

    /// Options whose values are the given strings, none selected
    #[must_use]
    pub fn from_values<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(values.into_iter().map(Choice::new))
    }

    /// Options for a catalog-backed select
    ///
    /// A disabled empty placeholder comes first and starts out selected, so
    /// an untouched select reads as null until the user picks an entry.
    #[must_use]
    pub fn from_catalog(entries: &[CatalogEntry]) -> Self {
        let placeholder = Choice::new("").disabled().selected();
        let rest = entries
            .iter()
            .map(|e| Choice::new(e.id.to_string()).with_label(e.name.clone()));
        Self::new(std::iter::once(placeholder).chain(rest))
    }

    /// All options
    #[inline]
    #[must_use]
    pub fn options(&self) -> &[Choice] {
        &self.options
    }

    /// Number of options
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.options.len()
    }

    /// Whether there are no options
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    /// Values of every selected option, in option order
    #[must_use]
    pub fn selected_values(&self) -> Vec<&str> {
        self.options
            .iter()
            .filter(|c| c.selected)
            .map(|c| c.value.as_str())
            .collect()
    }

    /// The selected option of a single-select
    ///
    /// When several options are flagged, the last one wins.
    #[must_use]
    pub fn selected_single(&self) -> Option<&Choice> {
        self.options.iter().rev().find(|c| c.selected)
    }

    /// Select exactly the options whose value is in `values`
    pub fn select_values(&mut self, values: &[String], multiple: bool) {
        for option in &mut self.options {
            option.selected = values.iter().any(|v| *v == option.value);
        }
        if !multiple {
            let last = self.options.iter().rposition(|c| c.selected);
            for (i, option) in self.options.iter_mut().enumerate() {
                option.selected = Some(i) == last;
            }
        }
    }

    /// Select the option at `index`, clearing the others
    ///
    /// Out-of-range indices clear the selection.
    pub fn select_index(&mut self, index: usize) {
        for (i, option) in self.options.iter_mut().enumerate() {
            option.selected = i == index;
        }
    }

    /// Clear the selection
    pub fn clear(&mut self) {
        for option in &mut self.options {
            option.selected = false;
        }
    }

    /// Bit set of selected option values
    ///
    /// Option values are bit indices; values that are not an index below
    /// [`MAX_BITSET_OPTIONS`] contribute nothing.
    #[must_use]
    pub fn bitset(&self) -> u32 {
        self.selected_values()
            .into_iter()
            .filter_map(|v| v.parse::<u32>().ok())
            .filter(|bit| *bit < MAX_BITSET_OPTIONS)
            .fold(0, |acc, bit| acc | (1u32 << bit))
    }

    /// Replace all options with catalog entries, keeping nothing selected
    /// but the placeholder
    pub fn repopulate(&mut self, entries: &[CatalogEntry]) {
        *self = Self::from_catalog(entries);
    }
}

/// Option values addressed by a bit set
#[must_use]
pub fn bitset_to_values(bits: u32) -> Vec<String> {
    (0..MAX_BITSET_OPTIONS)
        .filter(|bit| bits & (1u32 << bit) != 0)
        .map(|bit| bit.to_string())
        .collect()
}

/// Input state of a field, tagged by kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "kind", content = "state")]
pub enum Control {
    /// Free text
    Text(String),
    /// Parsed number, `None` when empty or unparseable
    Number(Option<f64>),
    /// Checkbox state
    Boolean(bool),
    /// Single selection
    SingleSelect(Choices),
    /// Multiple selection
    MultiSelect(Choices),
}

impl Control {
    /// Kind discriminant
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Text(_) => FieldKind::Text,
            Self::Number(_) => FieldKind::Number,
            Self::Boolean(_) => FieldKind::Boolean,
            Self::SingleSelect(_) => FieldKind::SingleSelect,
            Self::MultiSelect(_) => FieldKind::MultiSelect,
        }
    }

    /// Empty control of the given kind
    #[must_use]
    pub fn empty(kind: FieldKind) -> Self {
        match kind {
            FieldKind::Text => Self::Text(String::new()),
            FieldKind::Number => Self::Number(None),
            FieldKind::Boolean => Self::Boolean(false),
            FieldKind::SingleSelect => Self::SingleSelect(Choices::default()),
            FieldKind::MultiSelect => Self::MultiSelect(Choices::default()),
        }
    }

    /// Coerced live value
    #[must_use]
    pub fn read(&self) -> Value {
        match self {
            Self::Text(s) => Value::Text(s.clone()),
            Self::Number(Some(n)) => Value::number(*n),
            Self::Number(None) => Value::NoNumber,
            Self::Boolean(b) => Value::Bool(*b),
            Self::SingleSelect(choices) => match choices.selected_single() {
                Some(choice) if !choice.disabled => Value::Text(choice.value.clone()),
                _ => Value::Null,
            },
            Self::MultiSelect(choices) => Value::Bits(choices.bitset()),
        }
    }

    /// Write a value using this kind's input coercion
    pub fn write(&mut self, value: &Value) {
        match self {
            Self::Text(s) => *s = value.to_text(),
            Self::Number(n) => *n = number_input(value),
            Self::Boolean(b) => *b = value.to_bool(),
            Self::SingleSelect(choices) => match value {
                Value::Null | Value::NoNumber => choices.clear(),
                other => choices.select_values(&[other.to_text()], false),
            },
            Self::MultiSelect(choices) => {
                let values = match value {
                    Value::Null | Value::NoNumber => Vec::new(),
                    Value::Bits(bits) => bitset_to_values(*bits),
                    Value::Number(n) => number_to_bits(*n).map_or_else(Vec::new, bitset_to_values),
                    other => vec![other.to_text()],
                };
                choices.select_values(&values, true);
            }
        }
    }

    /// Options of a selection control
    #[inline]
    #[must_use]
    pub fn choices(&self) -> Option<&Choices> {
        match self {
            Self::SingleSelect(c) | Self::MultiSelect(c) => Some(c),
            _ => None,
        }
    }

    /// Mutable options of a selection control
    #[inline]
    pub fn choices_mut(&mut self) -> Option<&mut Choices> {
        match self {
            Self::SingleSelect(c) | Self::MultiSelect(c) => Some(c),
            _ => None,
        }
    }
}

fn number_input(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => Some(*n),
        Value::Bits(bits) => Some(f64::from(*bits)),
        Value::Text(s) => parse_number(s),
        Value::Null | Value::NoNumber | Value::Bool(_) => None,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn number_to_bits(n: f64) -> Option<u32> {
    (n >= 0.0 && n.fract() == 0.0 && n <= f64::from(u32::MAX)).then_some(n as u32)
}
