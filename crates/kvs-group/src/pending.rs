//! Pending add/delete log
//!
//! Records which row slots were added or deleted since the last confirmed
//! save. Each slot holds at most one entry: recording the opposite
//! operation cancels the existing one instead of stacking.

use serde::{Deserialize, Serialize};

/// Uncommitted structural operation on a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingOp {
    /// Slot gained a row
    Add,
    /// Slot lost its row
    Del,
}

impl PendingOp {
    /// The operation that cancels this one
    #[inline]
    #[must_use]
    pub fn opposite(self) -> Self {
        match self {
            Self::Add => Self::Del,
            Self::Del => Self::Add,
        }
    }
}

/// Outcome of [`PendingLog::toggle`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    /// A new entry was appended
    Recorded,
    /// An entry of the opposite kind was removed
    Cancelled,
    /// The same operation was already pending
    Unchanged,
}

/// One log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingEntry {
    /// Slot index
    pub index: usize,
    /// Operation
    pub op: PendingOp,
}

/// Ordered pending log of one group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PendingLog {
    entries: Vec<PendingEntry>,
}

impl PendingLog {
    /// Create empty log
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `op` at `index`, cancelling a pending opposite entry
    pub fn toggle(&mut self, index: usize, op: PendingOp) -> Toggle {
        match self.entries.iter().position(|e| e.index == index) {
            Some(pos) if self.entries[pos].op == op.opposite() => {
                self.entries.remove(pos);
                Toggle::Cancelled
            }
            Some(_) => Toggle::Unchanged,
            None => {
                self.entries.push(PendingEntry { index, op });
                Toggle::Recorded
            }
        }
    }

    /// Pending operation at `index`
    #[must_use]
    pub fn get(&self, index: usize) -> Option<PendingOp> {
        self.entries
            .iter()
            .find(|e| e.index == index)
            .map(|e| e.op)
    }

    /// Entries in recording order
    #[inline]
    #[must_use]
    pub fn entries(&self) -> &[PendingEntry] {
        &self.entries
    }

    /// Slots pending deletion, in recording order
    pub fn deletions(&self) -> impl Iterator<Item = usize> + '_ {
        self.entries
            .iter()
            .filter(|e| e.op == PendingOp::Del)
            .map(|e| e.index)
    }

    /// Number of entries
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is pending
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    #[inline]
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
