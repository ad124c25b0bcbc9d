//! Patch builder
//!
//! One pass over a [`Scope`]: every tracked field contributes its wire value
//! when changed (or unconditionally with `force_all`), then every group's
//! pending deletions contribute their deletion-schema keys.

use kvs_value::Field;

use crate::key::KeyCounter;
use crate::patch::{wire_value, Patch};
use crate::scope::{Scope, ScopeItem};

/// Builder options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildOptions {
    /// Write every field, changed or not
    pub force_all: bool,
    /// Emit deletions for vacated slots
    pub cleanup: bool,
    /// Send numeric-looking text as numbers
    pub numeric_strings: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            force_all: false,
            cleanup: true,
            numeric_strings: false,
        }
    }
}

impl BuildOptions {
    /// Create default options
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write every field
    #[inline]
    #[must_use]
    pub fn with_force_all(mut self, force_all: bool) -> Self {
        self.force_all = force_all;
        self
    }

    /// Toggle deletion output
    #[inline]
    #[must_use]
    pub fn with_cleanup(mut self, cleanup: bool) -> Self {
        self.cleanup = cleanup;
        self
    }

    /// Toggle numeric text conversion
    #[inline]
    #[must_use]
    pub fn with_numeric_strings(mut self, numeric_strings: bool) -> Self {
        self.numeric_strings = numeric_strings;
        self
    }
}

/// Builds [`Patch`]es from a scope
#[derive(Debug, Clone, Default)]
pub struct PatchBuilder {
    options: BuildOptions,
}

impl PatchBuilder {
    /// Create builder
    #[inline]
    #[must_use]
    pub fn new(options: BuildOptions) -> Self {
        Self { options }
    }

    /// Options in use
    #[inline]
    #[must_use]
    pub fn options(&self) -> BuildOptions {
        self.options
    }

    /// Build the patch for `scope`
    #[must_use]
    pub fn build(&self, scope: &Scope<'_>) -> Patch {
        let mut patch = Patch::new();
        let mut counter = KeyCounter::new();

        for item in scope.items() {
            match item {
                ScopeItem::Field(field) => self.visit(&mut patch, field.name().to_string(), field),
                ScopeItem::Group(group) => {
                    for row in group.rows() {
                        for field in row.fields().iter().filter(|f| !is_skipped(f)) {
                            let key = counter.next_key(field.name());
                            self.visit(&mut patch, key, field);
                        }
                    }
                }
            }
        }

        if self.options.cleanup {
            for group in scope.groups() {
                for index in group.pending().deletions() {
                    for name in group.deletion_schema() {
                        patch.delete(crate::composite_key(name, index));
                    }
                }
            }
        }

        tracing::debug!(
            "Built patch: {} set, {} del",
            patch.set.len(),
            patch.del.len()
        );
        patch
    }

    fn visit(&self, patch: &mut Patch, key: String, field: &Field) {
        if is_skipped(field) {
            return;
        }
        if !(field.is_changed() || self.options.force_all) {
            return;
        }
        if let Some(value) = wire_value(&field.read(), self.options.numeric_strings) {
            patch.insert(key, value);
        }
    }
}

/// Ignored and read-only fields neither submit nor take a positional suffix
fn is_skipped(field: &Field) -> bool {
    field.is_ignored() || field.is_read_only()
}

/// Build with default options except `force_all`
#[must_use]
pub fn build(scope: &Scope<'_>, force_all: bool) -> Patch {
    PatchBuilder::new(BuildOptions::new().with_force_all(force_all)).build(scope)
}
