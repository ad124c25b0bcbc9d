//! Error types for row groups

/// Errors raised by group operations
///
/// Both variants are rejections: the group is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GroupError {
    /// Appending would exceed the row cap
    #[error("group {group} already holds the maximum of {max} rows")]
    MaxRowsReached {
        /// Group id
        group: String,
        /// Configured cap
        max: usize,
    },

    /// Row index past the end of the group
    #[error("group {group} has no row {index} (len {len})")]
    RowOutOfRange {
        /// Group id
        group: String,
        /// Requested index
        index: usize,
        /// Current row count
        len: usize,
    },
}

impl GroupError {
    /// Check whether the error is a user-facing rejection that can be
    /// retried after removing a row
    #[inline]
    #[must_use]
    pub fn is_capacity(&self) -> bool {
        matches!(self, Self::MaxRowsReached { .. })
    }
}

/// Result type for group operations
pub type Result<T> = std::result::Result<T, GroupError>;
