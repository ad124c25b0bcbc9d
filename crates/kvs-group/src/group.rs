//! Groups and the reindexer
//!
//! Rows are identified by position only. Inserting or removing a row is
//! therefore expressed as value shifts over fixed slots: removing row `k`
//! makes every later row inherit the slot in front of it, and the vacated
//! last slot is scheduled for deletion on the device.

use kvs_value::{Field, Value};

use crate::error::{GroupError, Result};
use crate::pending::{PendingLog, PendingOp, Toggle};
use crate::row::{FlagFlip, Row};
use crate::view::RowView;

/// Result of a successful [`Group::append`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Appended {
    /// Slot of the new row
    pub index: usize,
    /// Flags forced on in the new row
    pub flips: Vec<FlagFlip>,
}

/// Ordered rows sharing a schema and positional key suffixes
#[derive(Debug, Clone)]
pub struct Group {
    id: String,
    template: Vec<Field>,
    schema: Vec<String>,
    deletion_schema: Option<Vec<String>>,
    max_rows: usize,
    rows: Vec<Row>,
    pending: PendingLog,
}

impl Group {
    /// Create an empty group whose rows are copies of `template`
    ///
    /// The schema defaults to the template's field names.
    #[must_use]
    pub fn new(id: impl Into<String>, template: Vec<Field>) -> Self {
        let schema = template.iter().map(|f| f.name().to_string()).collect();
        Self {
            id: id.into(),
            template,
            schema,
            deletion_schema: None,
            max_rows: 0,
            rows: Vec::new(),
            pending: PendingLog::new(),
        }
    }

    /// Override schema
    #[must_use]
    pub fn with_schema<I, S>(mut self, schema: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema = schema.into_iter().map(Into::into).collect();
        self
    }

    /// Names deleted on the device when a slot disappears
    #[must_use]
    pub fn with_deletion_schema<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.deletion_schema = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Cap the row count, 0 for unlimited
    #[inline]
    #[must_use]
    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }

    /// Group id
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Names every row carries on the device
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Names deleted per vacated slot, defaulting to the schema
    #[inline]
    #[must_use]
    pub fn deletion_schema(&self) -> &[String] {
        self.deletion_schema.as_deref().unwrap_or(&self.schema)
    }

    /// Row cap, 0 when unlimited
    #[inline]
    #[must_use]
    pub fn max_rows(&self) -> usize {
        self.max_rows
    }

    /// Change the row cap
    #[inline]
    pub fn set_max_rows(&mut self, max_rows: usize) {
        self.max_rows = max_rows;
    }

    /// Field prototypes of a new row
    #[inline]
    #[must_use]
    pub fn template(&self) -> &[Field] {
        &self.template
    }

    /// Rows in slot order
    #[inline]
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Mutable rows in slot order
    #[inline]
    pub fn rows_mut(&mut self) -> &mut [Row] {
        &mut self.rows
    }

    /// Row at `index`
    #[inline]
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Mutable row at `index`
    #[inline]
    pub fn row_mut(&mut self, index: usize) -> Option<&mut Row> {
        self.rows.get_mut(index)
    }

    /// Row count
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the group has no rows
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Uncommitted adds and deletes
    #[inline]
    #[must_use]
    pub fn pending(&self) -> &PendingLog {
        &self.pending
    }

    /// Whether one more row fits under the cap
    #[inline]
    #[must_use]
    pub fn check_max(&self) -> bool {
        self.max_rows == 0 || self.rows.len() < self.max_rows
    }

    /// Append a row built from the template
    ///
    /// Every schema field of the new row is forced `changed` so the device
    /// receives an explicit write for it.
    ///
    /// # Errors
    ///
    /// [`GroupError::MaxRowsReached`] when the cap is reached; nothing is
    /// mutated in that case.
    pub fn append(&mut self, view: &mut dyn RowView) -> Result<Appended> {
        if !self.check_max() {
            tracing::warn!("Group {} rejected append: {} rows max", self.id, self.max_rows);
            return Err(GroupError::MaxRowsReached {
                group: self.id.clone(),
                max: self.max_rows,
            });
        }

        let index = self.rows.len();
        match self.pending.toggle(index, PendingOp::Add) {
            Toggle::Cancelled => {
                tracing::debug!("Group {}: append cancels pending delete of slot {}", self.id, index);
            }
            _ => tracing::debug!("Group {}: pending add at slot {}", self.id, index),
        }

        let mut fields = self.template.clone();
        let mut flips = Vec::new();
        for field in &mut fields {
            if self.schema.iter().any(|n| n == field.name()) && field.mark_changed() {
                flips.push(FlagFlip::of(field));
            }
        }

        let handle = view.create_row_view(&self.id);
        self.rows.push(Row::new(index, fields, handle));
        Ok(Appended { index, flips })
    }

    /// Remove the row at `index`, shifting later rows one slot forward
    ///
    /// Each later row compares its live values against the device-side
    /// values of the slot it moves into and marks differing schema fields
    /// `changed`; it also takes over that slot's baseline. The vacated last
    /// slot toggles the pending log.
    ///
    /// Returns the flag flips caused by the removal, including the removed
    /// row's own changed fields going away.
    ///
    /// # Errors
    ///
    /// [`GroupError::RowOutOfRange`] when `index` has no row.
    pub fn remove(&mut self, index: usize, view: &mut dyn RowView) -> Result<Vec<FlagFlip>> {
        let len = self.rows.len();
        if index >= len {
            return Err(GroupError::RowOutOfRange {
                group: self.id.clone(),
                index,
                len,
            });
        }
        let last = len - 1;

        // device-side value of every schema field per slot, before the shift
        let slots: Vec<Vec<Option<Value>>> = self
            .rows
            .iter()
            .map(|row| {
                self.schema
                    .iter()
                    .map(|name| row.field(name).and_then(|f| f.read_original().cloned()))
                    .collect()
            })
            .collect();

        let mut flips: Vec<FlagFlip> = self.rows[index]
            .fields()
            .iter()
            .filter(|f| f.is_changed())
            .map(|f| FlagFlip {
                action: f.action(),
                changed: false,
            })
            .collect();

        for i in index + 1..=last {
            let row = &mut self.rows[i];
            for (slot, name) in self.schema.iter().enumerate() {
                let Some(field) = row.field_mut(name) else {
                    continue;
                };
                field.replace_original(slots[i - 1][slot].clone());
                if field.read() != field.comparable_original() && field.mark_changed() {
                    flips.push(FlagFlip::of(field));
                }
            }
        }

        match self.pending.toggle(last, PendingOp::Del) {
            Toggle::Cancelled => {
                tracing::debug!("Group {}: removal cancels pending add of slot {}", self.id, last);
            }
            _ => tracing::debug!("Group {}: pending delete at slot {}", self.id, last),
        }

        let removed = self.rows.remove(index);
        view.destroy_row_view(removed.view());
        for (i, row) in self.rows.iter_mut().enumerate().skip(index) {
            row.set_index(i);
        }

        Ok(flips)
    }

    /// Replace all rows with rows pushed by the device
    ///
    /// Values are zipped against `schema` (or the group's own schema when
    /// `None`); unknown names are skipped. Loaded rows arrive baselined and
    /// unchanged, and the pending log is cleared. Returns flag flips for
    /// changed fields of the discarded rows.
    pub fn load(
        &mut self,
        schema: Option<Vec<String>>,
        rows: &[Vec<Value>],
        view: &mut dyn RowView,
    ) -> Vec<FlagFlip> {
        if let Some(schema) = schema.filter(|s| !s.is_empty()) {
            self.schema = schema;
        }

        let mut flips = Vec::new();
        for row in self.rows.drain(..) {
            flips.extend(
                row.fields()
                    .iter()
                    .filter(|f| f.is_changed())
                    .map(|f| FlagFlip {
                        action: f.action(),
                        changed: false,
                    }),
            );
            view.destroy_row_view(row.view());
        }
        self.pending.clear();

        for (index, values) in rows.iter().enumerate() {
            let mut fields = self.template.clone();
            for (name, value) in self.schema.iter().zip(values) {
                match fields.iter_mut().find(|f| f.name() == name) {
                    Some(field) => field.load(value),
                    None => tracing::debug!("Group {}: no field {} in template", self.id, name),
                }
            }
            let handle = view.create_row_view(&self.id);
            self.rows.push(Row::new(index, fields, handle));
        }

        tracing::debug!("Group {} loaded {} rows", self.id, self.rows.len());
        flips
    }

    /// Take every row's live values as baseline and clear the pending log
    pub fn commit(&mut self) {
        for row in &mut self.rows {
            kvs_value::commit(row.fields_mut());
        }
        self.pending.clear();
    }
}
