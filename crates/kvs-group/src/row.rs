//! Rows

use kvs_value::{Field, FieldAction};

use crate::view::ViewHandle;

/// Ordered bundle of fields occupying one slot of a group
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    index: usize,
    fields: Vec<Field>,
    view: ViewHandle,
}

impl Row {
    pub(crate) fn new(index: usize, fields: Vec<Field>, view: ViewHandle) -> Self {
        Self {
            index,
            fields,
            view,
        }
    }

    /// Current slot
    #[inline]
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    pub(crate) fn set_index(&mut self, index: usize) {
        self.index = index;
    }

    /// Rendered row handle
    #[inline]
    #[must_use]
    pub fn view(&self) -> ViewHandle {
        self.view
    }

    /// Fields in template order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Mutable fields in template order
    #[inline]
    pub fn fields_mut(&mut self) -> &mut [Field] {
        &mut self.fields
    }

    /// Field by name
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Mutable field by name
    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.fields.iter_mut().find(|f| f.name() == name)
    }
}

/// Change flag movement of one field, reported so callers can keep
/// aggregate dirty counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagFlip {
    /// Save follow-up of the field
    pub action: FieldAction,
    /// Flag state after the flip
    pub changed: bool,
}

impl FlagFlip {
    /// Flip of `field` to its current flag state
    #[inline]
    #[must_use]
    pub fn of(field: &Field) -> Self {
        Self {
            action: field.action(),
            changed: field.is_changed(),
        }
    }
}
