//! Patch scope

use kvs_group::Group;
use kvs_value::Field;

/// One entry of a scope, in document order
#[derive(Debug, Clone, Copy)]
pub enum ScopeItem<'a> {
    /// Top-level field
    Field(&'a Field),
    /// Row group
    Group(&'a Group),
}

/// Fields and groups a patch is built from
#[derive(Debug, Clone, Default)]
pub struct Scope<'a> {
    items: Vec<ScopeItem<'a>>,
}

impl<'a> Scope<'a> {
    /// Create empty scope
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Scope of top-level fields followed by groups
    #[must_use]
    pub fn of<F, G>(fields: F, groups: G) -> Self
    where
        F: IntoIterator<Item = &'a Field>,
        G: IntoIterator<Item = &'a Group>,
    {
        let items = fields
            .into_iter()
            .map(ScopeItem::Field)
            .chain(groups.into_iter().map(ScopeItem::Group))
            .collect();
        Self { items }
    }

    /// Add a top-level field
    #[must_use]
    pub fn field(mut self, field: &'a Field) -> Self {
        self.items.push(ScopeItem::Field(field));
        self
    }

    /// Add a group
    #[must_use]
    pub fn group(mut self, group: &'a Group) -> Self {
        self.items.push(ScopeItem::Group(group));
        self
    }

    /// Items in document order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[ScopeItem<'a>] {
        &self.items
    }

    /// Groups in document order
    pub fn groups(&self) -> impl Iterator<Item = &'a Group> + '_ {
        self.items.iter().filter_map(|item| match item {
            ScopeItem::Group(group) => Some(*group),
            ScopeItem::Field(_) => None,
        })
    }
}
