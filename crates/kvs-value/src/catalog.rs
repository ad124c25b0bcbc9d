//! Option catalogs
//!
//! Named lists of `{id, name}` entries that populate selection fields. The
//! catalog is an explicit store owned by whoever renders the fields; it must
//! be populated before a bound field is read.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// One catalog entry, rendered as an option with `value = id`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Option value
    pub id: u32,
    /// Option label
    pub name: String,
}

impl CatalogEntry {
    /// Create entry
    #[inline]
    #[must_use]
    pub fn new(id: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Store of named option catalogs
#[derive(Debug, Clone, Default)]
pub struct OptionCatalog {
    catalogs: BTreeMap<String, Vec<CatalogEntry>>,
}

impl OptionCatalog {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the entries of a catalog
    pub fn insert(&mut self, name: impl Into<String>, entries: Vec<CatalogEntry>) {
        self.catalogs.insert(name.into(), entries);
    }

    /// Generate `count` entries named `"<pretty> #<id>"`
    ///
    /// A zero count leaves the store untouched.
    pub fn insert_simple(&mut self, name: impl Into<String>, pretty: &str, count: u32) {
        if count == 0 {
            return;
        }

        let entries = (0..count)
            .map(|id| CatalogEntry::new(id, format!("{pretty} #{id}")))
            .collect();
        self.insert(name, entries);
    }

    /// Entries of a catalog, empty when unknown
    #[must_use]
    pub fn get(&self, name: &str) -> &[CatalogEntry] {
        self.catalogs.get(name).map_or(&[], Vec::as_slice)
    }

    /// Check whether a catalog was populated
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.catalogs.contains_key(name)
    }

    /// Catalog names in sorted order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.catalogs.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_entries() {
        let mut catalog = OptionCatalog::new();
        assert!(catalog.get("explicit").is_empty());

        catalog.insert(
            "explicit",
            vec![CatalogEntry::new(1, "foo"), CatalogEntry::new(2, "bar")],
        );

        let entries = catalog.get("explicit");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], CatalogEntry::new(1, "foo"));
        assert_eq!(entries[1], CatalogEntry::new(2, "bar"));
    }

    #[test]
    fn generated_entries() {
        let mut catalog = OptionCatalog::new();
        catalog.insert_simple("generated", "GENERATED", 5);

        let entries = catalog.get("generated");
        assert_eq!(entries.len(), 5);
        assert!(entries.iter().all(|e| e.name.starts_with("GENERATED #")));
        assert_eq!(entries[3].name, "GENERATED #3");
    }

    #[test]
    fn zero_count_is_noop() {
        let mut catalog = OptionCatalog::new();
        catalog.insert_simple("none", "NONE", 0);
        assert!(!catalog.contains("none"));
    }
}
