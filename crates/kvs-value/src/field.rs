//! Fields and change tracking
//!
//! A [`Field`] holds a live [`Control`], an optional baseline and a `changed`
//! flag. The flag only moves through [`Field::check_and_mark`],
//! [`Field::mark_changed`] and [`Field::commit`]; writing a value never
//! touches it.

use serde::{Deserialize, Serialize};

use crate::catalog::CatalogEntry;
use crate::control::{Control, FieldKind};
use crate::value::Value;

/// Follow-up the device needs once a field is saved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldAction {
    /// Applied immediately
    #[default]
    None,
    /// Requires a device reboot
    Reboot,
    /// Requires the console to reconnect
    Reconnect,
    /// Requires the console to reload
    Reload,
    /// Never counted as a pending change
    Untracked,
}

impl FieldAction {
    /// Whether edits of this field count towards dirty counters
    #[inline]
    #[must_use]
    pub fn is_tracked(self) -> bool {
        self != Self::Untracked
    }
}

/// Named editable value with a baseline and a change flag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    name: String,
    control: Control,
    #[serde(default)]
    original: Option<Value>,
    #[serde(default)]
    changed: bool,
    #[serde(default)]
    ignored: bool,
    #[serde(default)]
    read_only: bool,
    #[serde(default)]
    action: FieldAction,
    #[serde(default)]
    catalog: Option<String>,
}

impl Field {
    /// Create a field with no baseline
    #[must_use]
    pub fn new(name: impl Into<String>, control: Control) -> Self {
        Self {
            name: name.into(),
            control,
            original: None,
            changed: false,
            ignored: false,
            read_only: false,
            action: FieldAction::None,
            catalog: None,
        }
    }

    /// Create an empty field of the given kind
    #[inline]
    #[must_use]
    pub fn empty(name: impl Into<String>, kind: FieldKind) -> Self {
        Self::new(name, Control::empty(kind))
    }

    /// Exclude from every patch
    #[inline]
    #[must_use]
    pub fn with_ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    /// Mark as read-only
    #[inline]
    #[must_use]
    pub fn with_read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Set save follow-up
    #[inline]
    #[must_use]
    pub fn with_action(mut self, action: FieldAction) -> Self {
        self.action = action;
        self
    }

    /// Bind to a named option catalog
    #[inline]
    #[must_use]
    pub fn with_catalog(mut self, catalog: impl Into<String>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    /// Write `value` and take it as the baseline
    #[must_use]
    pub fn with_baseline(mut self, value: &Value) -> Self {
        self.load(value);
        self
    }

    /// Field name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.control.kind()
    }

    /// Input state
    #[inline]
    #[must_use]
    pub fn control(&self) -> &Control {
        &self.control
    }

    /// Mutable input state, for views writing raw input
    #[inline]
    pub fn control_mut(&mut self) -> &mut Control {
        &mut self.control
    }

    /// Change flag as of the last check
    #[inline]
    #[must_use]
    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Excluded from patches
    #[inline]
    #[must_use]
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Never edited or committed
    #[inline]
    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    /// Save follow-up
    #[inline]
    #[must_use]
    pub fn action(&self) -> FieldAction {
        self.action
    }

    /// Bound catalog name
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> Option<&str> {
        self.catalog.as_deref()
    }

    /// Coerced live value
    #[inline]
    #[must_use]
    pub fn read(&self) -> Value {
        self.control.read()
    }

    /// Baseline, `None` when never recorded
    #[inline]
    #[must_use]
    pub fn read_original(&self) -> Option<&Value> {
        self.original.as_ref()
    }

    /// Baseline as used for comparison
    ///
    /// An unset baseline stands for the kind's empty value.
    #[must_use]
    pub fn comparable_original(&self) -> Value {
        self.original
            .clone()
            .unwrap_or_else(|| self.kind().empty_value())
    }

    /// Write a value using the kind's input coercion
    ///
    /// The change flag is left alone.
    #[inline]
    pub fn set(&mut self, value: &Value) {
        self.control.write(value);
    }

    /// What `value` would read as once written into this field
    ///
    /// Single-selects keep values with no matching option yet, so a
    /// baseline can arrive before its catalog.
    #[must_use]
    pub fn coerce(&self, value: &Value) -> Value {
        if let Control::SingleSelect(_) = self.control {
            return match value {
                Value::Null | Value::NoNumber => Value::Null,
                other => Value::Text(other.to_text()),
            };
        }
        let mut scratch = self.control.clone();
        scratch.write(value);
        scratch.read()
    }

    /// Replace the baseline with the coerced form of `value`
    pub fn set_original(&mut self, value: &Value) {
        self.original = Some(self.coerce(value));
    }

    /// Swap in a raw baseline, returning the old one
    ///
    /// Used when a row moves to another slot and inherits that slot's
    /// device-side value.
    pub fn replace_original(&mut self, original: Option<Value>) -> Option<Value> {
        std::mem::replace(&mut self.original, original)
    }

    /// Apply a value supplied by the device: live value and baseline both
    /// take it and the flag is cleared
    pub fn load(&mut self, value: &Value) {
        self.control.write(value);
        self.original = Some(self.coerce(value));
        self.changed = false;
    }

    /// Recompute the change flag
    ///
    /// Returns whether this call flipped it.
    pub fn check_and_mark(&mut self) -> bool {
        let changed = self.read() != self.comparable_original();
        let flipped = changed != self.changed;
        self.changed = changed;
        flipped
    }

    /// Force the change flag on, returning whether it flipped
    pub fn mark_changed(&mut self) -> bool {
        let flipped = !self.changed;
        self.changed = true;
        flipped
    }

    /// Take the live value as the new baseline
    ///
    /// Read-only fields keep their baseline.
    pub fn commit(&mut self) {
        if self.read_only {
            return;
        }
        self.rebaseline();
    }

    /// Take the live value as the baseline regardless of flags
    ///
    /// Used when the device itself supplied the value.
    pub fn rebaseline(&mut self) {
        self.original = Some(self.read());
        self.changed = false;
    }

    /// Replace catalog-backed options and reselect the baseline
    pub fn repopulate(&mut self, entries: &[CatalogEntry]) {
        let Some(choices) = self.control.choices_mut() else {
            return;
        };
        choices.repopulate(entries);
        if let Some(original) = self.original.clone() {
            self.control.write(&original);
        }
    }
}

/// Commit every field in `fields`
pub fn commit<'a>(fields: impl IntoIterator<Item = &'a mut Field>) {
    for field in fields {
        field.commit();
    }
}
