//! Composite keys
//!
//! Top-level fields are stored under their name. Row fields append a
//! positional suffix taken from a running per-name counter over every row
//! visited, so rows of unrelated groups sharing a name still get sequential
//! suffixes.

use std::collections::HashMap;

/// Key of a row field at `index`
#[inline]
#[must_use]
pub fn composite_key(name: &str, index: usize) -> String {
    format!("{name}{index}")
}

/// Running per-name positional counter
#[derive(Debug, Clone, Default)]
pub struct KeyCounter {
    next: HashMap<String, usize>,
}

impl KeyCounter {
    /// Create counter with every name at zero
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Key for the next occurrence of `name`
    pub fn next_key(&mut self, name: &str) -> String {
        let slot = self.next.entry(name.to_string()).or_insert(0);
        let key = composite_key(name, *slot);
        *slot += 1;
        key
    }
}
