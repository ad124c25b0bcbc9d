//! Settings console
//!
//! Owns one scope of top-level fields and row groups and is the only entry
//! point for mutations: the view reports edits through
//! [`SettingsConsole::on_edit`], the device through
//! [`SettingsConsole::apply_remote`]. Every flag flip is folded into the
//! dirty counters.

use std::fmt::{self, Display, Formatter};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use kvs_group::{FlagFlip, Group, HeadlessView, RowView};
use kvs_patch::{Patch, PatchBuilder, Scope};
use kvs_value::{CatalogEntry, Field, OptionCatalog, Value};

use crate::config::{ConsoleConfig, RemotePolicy};
use crate::counters::{DirtyCounters, PostSaveAction};
use crate::error::{ConsoleError, Result};
use crate::transport::Transport;

/// Remote key confirming a save
pub const SAVED_KEY: &str = "saved";

/// Location of a field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldRef {
    /// Field inside a group row
    Row {
        /// Group id
        group: String,
        /// Row index
        row: usize,
        /// Field name
        name: String,
    },
    /// Top-level field
    Top {
        /// Field name
        name: String,
    },
}

impl FieldRef {
    /// Top-level field
    #[inline]
    #[must_use]
    pub fn top(name: impl Into<String>) -> Self {
        Self::Top { name: name.into() }
    }

    /// Field of a group row
    #[inline]
    #[must_use]
    pub fn row(group: impl Into<String>, row: usize, name: impl Into<String>) -> Self {
        Self::Row {
            group: group.into(),
            row,
            name: name.into(),
        }
    }
}

impl Display for FieldRef {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Top { name } => write!(f, "{name}"),
            Self::Row { group, row, name } => write!(f, "{group}[{row}].{name}"),
        }
    }
}

/// Rows pushed by the device for one group
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupPush {
    /// Names the positional values map to, defaulting to the group schema
    #[serde(default)]
    pub schema: Option<Vec<String>>,
    /// New row cap
    #[serde(default)]
    pub max: Option<usize>,
    /// One value list per row
    #[serde(default)]
    pub values: Vec<Vec<JsonValue>>,
}

/// What [`SettingsConsole::apply_remote`] did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteOutcome {
    /// Fields and groups updated
    pub applied: usize,
    /// Keys with no matching field or group, or an unusable value
    pub ignored: Vec<String>,
    /// Follow-up when the push confirmed a save
    pub confirmed: Option<PostSaveAction>,
}

/// Change tracking over one scope of fields and groups
#[derive(Debug)]
pub struct SettingsConsole<V: RowView = HeadlessView> {
    config: ConsoleConfig,
    fields: Vec<Field>,
    groups: Vec<Group>,
    catalog: OptionCatalog,
    counters: DirtyCounters,
    awaiting_confirmation: bool,
    sent_follow_up: PostSaveAction,
    view: V,
}

impl SettingsConsole<HeadlessView> {
    /// Console with a view that renders nothing
    #[must_use]
    pub fn headless(config: ConsoleConfig) -> Self {
        Self::new(config, HeadlessView::new())
    }
}

impl<V: RowView> SettingsConsole<V> {
    /// Create empty console
    #[must_use]
    pub fn new(config: ConsoleConfig, view: V) -> Self {
        Self {
            config,
            fields: Vec::new(),
            groups: Vec::new(),
            catalog: OptionCatalog::new(),
            counters: DirtyCounters::default(),
            awaiting_confirmation: false,
            sent_follow_up: PostSaveAction::None,
            view,
        }
    }

    /// Add a top-level field
    #[must_use]
    pub fn with_field(mut self, field: Field) -> Self {
        self.add_field(field);
        self
    }

    /// Add a group
    #[must_use]
    pub fn with_group(mut self, group: Group) -> Self {
        self.add_group(group);
        self
    }

    /// Add a top-level field, binding it to its catalog when populated
    pub fn add_field(&mut self, mut field: Field) {
        bind_catalog(&self.catalog, &mut field);
        self.fields.push(field);
    }

    /// Add a group
    pub fn add_group(&mut self, group: Group) {
        self.groups.push(group);
    }

    /// Configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &ConsoleConfig {
        &self.config
    }

    /// Top-level fields in document order
    #[inline]
    #[must_use]
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Groups in document order
    #[inline]
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// First top-level field named `name`
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Group by id
    #[must_use]
    pub fn group(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id() == id)
    }

    /// Field at a location
    #[must_use]
    pub fn field_at(&self, target: &FieldRef) -> Option<&Field> {
        match target {
            FieldRef::Top { name } => self.field(name),
            FieldRef::Row { group, row, name } => self.group(group)?.row(*row)?.field(name),
        }
    }

    /// Option catalogs
    #[inline]
    #[must_use]
    pub fn catalog(&self) -> &OptionCatalog {
        &self.catalog
    }

    /// Dirty counters
    #[inline]
    #[must_use]
    pub fn counters(&self) -> DirtyCounters {
        self.counters
    }

    /// Whether tracked edits are waiting to be saved
    #[inline]
    #[must_use]
    pub fn pending_changes(&self) -> bool {
        self.counters.changed > 0
    }

    /// Whether a save was sent and not yet confirmed
    #[inline]
    #[must_use]
    pub fn is_awaiting_confirmation(&self) -> bool {
        self.awaiting_confirmation
    }

    /// Row view
    #[inline]
    #[must_use]
    pub fn view(&self) -> &V {
        &self.view
    }

    /// Recompute the change flag of an edited field
    ///
    /// Returns whether the flag flipped.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnknownField`] when nothing lives at `target`.
    pub fn on_edit(&mut self, target: &FieldRef) -> Result<bool> {
        let field = locate_mut(&mut self.fields, &mut self.groups, target)?;
        let flipped = field.check_and_mark();
        if flipped {
            let flip = FlagFlip::of(field);
            tracing::debug!("Field {} changed: {}", target, flip.changed);
            self.counters.apply(flip);
        }
        Ok(flipped)
    }

    /// Write a value the way the view would, then run [`Self::on_edit`]
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnknownField`] for a missing field and
    /// [`ConsoleError::ReadOnly`] for a read-only one.
    pub fn edit(&mut self, target: &FieldRef, value: &Value) -> Result<bool> {
        let field = locate_mut(&mut self.fields, &mut self.groups, target)?;
        if field.is_read_only() {
            return Err(ConsoleError::ReadOnly(target.to_string()));
        }
        field.set(value);
        self.on_edit(target)
    }

    /// Append a row to a group
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnknownGroup`], or a capacity rejection leaving the
    /// group untouched.
    pub fn append_row(&mut self, group_id: &str) -> Result<usize> {
        let group = find_group_mut(&mut self.groups, group_id)?;
        let appended = group.append(&mut self.view)?;
        self.counters.apply_all(appended.flips);

        if let Some(row) = group.row_mut(appended.index) {
            for field in row.fields_mut() {
                bind_catalog(&self.catalog, field);
            }
        }
        tracing::debug!("Appended row {} to {}", appended.index, group_id);
        Ok(appended.index)
    }

    /// Remove a row from a group
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnknownGroup`] or an out-of-range row.
    pub fn remove_row(&mut self, group_id: &str, index: usize) -> Result<()> {
        let group = find_group_mut(&mut self.groups, group_id)?;
        let flips = group.remove(index, &mut self.view)?;
        self.counters.apply_all(flips);
        tracing::debug!("Removed row {} from {}", index, group_id);
        Ok(())
    }

    /// Replace a group's rows with rows pushed by the device
    ///
    /// # Errors
    ///
    /// [`ConsoleError::UnknownGroup`].
    pub fn load_group(&mut self, group_id: &str, push: GroupPush) -> Result<()> {
        let group = find_group_mut(&mut self.groups, group_id)?;
        if let Some(max) = push.max {
            group.set_max_rows(max);
        }
        let rows: Vec<Vec<Value>> = push
            .values
            .iter()
            .map(|row| {
                row.iter()
                    .map(|v| Value::from_json(v).unwrap_or(Value::Null))
                    .collect()
            })
            .collect();
        let flips = group.load(push.schema, &rows, &mut self.view);
        self.counters.apply_all(flips);

        for row in group.rows_mut() {
            for field in row.fields_mut() {
                bind_catalog(&self.catalog, field);
            }
        }
        Ok(())
    }

    /// Apply a key-value update pushed by the device
    ///
    /// Scalar keys update every top-level field of that name under the
    /// configured [`RemotePolicy`]; row fields are never addressed this way.
    /// Objects carrying `values` for a group id reload that group. A truthy
    /// `saved` key confirms the pending save once everything else is
    /// applied. Anything else is ignored.
    pub fn apply_remote(&mut self, update: &Map<String, JsonValue>) -> RemoteOutcome {
        let mut outcome = RemoteOutcome::default();
        let mut saved = false;

        for (key, raw) in update {
            if key == SAVED_KEY {
                saved = Value::from_json(raw).is_some_and(|v| v.to_bool());
                continue;
            }

            if self.groups.iter().any(|g| g.id() == key) {
                match serde_json::from_value::<GroupPush>(raw.clone()) {
                    Ok(push) if raw.get("values").is_some() => {
                        if self.load_group(key, push).is_ok() {
                            outcome.applied += 1;
                        }
                    }
                    _ => {
                        tracing::debug!("Ignoring malformed push for group {}", key);
                        outcome.ignored.push(key.clone());
                    }
                }
                continue;
            }

            let Some(value) = Value::from_json(raw) else {
                tracing::debug!("Ignoring non-scalar value for {}", key);
                outcome.ignored.push(key.clone());
                continue;
            };

            let mut matched = 0;
            for field in self.fields.iter_mut().filter(|f| f.name() == key) {
                if let Some(flip) = apply_remote_value(field, &value, self.config.remote_policy) {
                    self.counters.apply(flip);
                }
                matched += 1;
            }
            if matched == 0 {
                tracing::debug!("Ignoring unknown remote key {}", key);
                outcome.ignored.push(key.clone());
            } else {
                outcome.applied += matched;
            }
        }

        if saved {
            outcome.confirmed = Some(self.confirm_saved());
        }
        outcome
    }

    /// Build the patch for the current state without sending it
    #[must_use]
    pub fn patch(&self, force_all: bool) -> Patch {
        let scope = Scope::of(&self.fields, &self.groups);
        PatchBuilder::new(self.config.build_options(force_all)).build(&scope)
    }

    /// Send the current patch and wait for confirmation
    ///
    /// Flags and baselines stay as they are until [`Self::confirm_saved`];
    /// only the changed counter is reset. A second save before confirmation
    /// recomputes the patch from current state.
    ///
    /// # Errors
    ///
    /// [`ConsoleError::Transport`] when the transport refuses the request;
    /// the console is then left unchanged.
    pub fn save(&mut self, transport: &mut dyn Transport, force_all: bool) -> Result<Patch> {
        let patch = self.patch(force_all);
        transport.send_patch(&patch.clone().into_request())?;

        self.sent_follow_up = self.sent_follow_up.max(self.counters.follow_up());
        self.counters.changed = 0;
        self.awaiting_confirmation = true;
        tracing::info!(
            "Sent patch: {} set, {} del",
            patch.set.len(),
            patch.del.len()
        );
        Ok(patch)
    }

    /// Commit after the device confirmed the last save
    ///
    /// Returns the follow-up the saved fields require, as known when the
    /// patch was sent or now, whichever is more disruptive, and resets the
    /// counters. Without a save in flight nothing is committed.
    pub fn confirm_saved(&mut self) -> PostSaveAction {
        if !self.awaiting_confirmation {
            tracing::debug!("Ignoring confirmation with no save in flight");
            return PostSaveAction::None;
        }

        kvs_value::commit(self.fields.iter_mut());
        for group in &mut self.groups {
            group.commit();
        }

        let action = self.sent_follow_up.max(self.counters.follow_up());
        self.counters.reset();
        self.sent_follow_up = PostSaveAction::None;
        self.awaiting_confirmation = false;
        tracing::info!("Save confirmed, follow-up: {:?}", action);
        action
    }

    /// Populate a catalog and refresh every bound selection field
    ///
    /// Bound fields reselect their baseline. Change flags are left alone.
    pub fn update_catalog(&mut self, name: &str, entries: Vec<CatalogEntry>) {
        self.catalog.insert(name, entries);
        self.refresh_catalog(name);
    }

    /// Populate a catalog with `count` generated entries
    pub fn update_catalog_simple(&mut self, name: &str, pretty: &str, count: u32) {
        self.catalog.insert_simple(name, pretty, count);
        self.refresh_catalog(name);
    }

    fn refresh_catalog(&mut self, name: &str) {
        let entries = self.catalog.get(name);
        let rows = self.groups.iter_mut().flat_map(|g| g.rows_mut().iter_mut());
        let fields = self
            .fields
            .iter_mut()
            .chain(rows.flat_map(|r| r.fields_mut().iter_mut()));

        let mut refreshed = 0;
        for field in fields.filter(|f| f.catalog() == Some(name)) {
            field.repopulate(entries);
            refreshed += 1;
        }
        tracing::debug!("Catalog {} refreshed {} fields", name, refreshed);
    }
}

fn find_group_mut<'a>(groups: &'a mut [Group], id: &str) -> Result<&'a mut Group> {
    groups
        .iter_mut()
        .find(|g| g.id() == id)
        .ok_or_else(|| ConsoleError::UnknownGroup(id.to_string()))
}

fn locate_mut<'a>(
    fields: &'a mut [Field],
    groups: &'a mut [Group],
    target: &FieldRef,
) -> Result<&'a mut Field> {
    let found = match target {
        FieldRef::Top { name } => fields.iter_mut().find(|f| f.name() == name),
        FieldRef::Row { group, row, name } => find_group_mut(groups, group)?
            .row_mut(*row)
            .and_then(|r| r.field_mut(name)),
    };
    found.ok_or_else(|| ConsoleError::UnknownField(target.to_string()))
}

fn bind_catalog(catalog: &OptionCatalog, field: &mut Field) {
    let Some(name) = field.catalog() else {
        return;
    };
    if catalog.contains(name) {
        let entries = catalog.get(name).to_vec();
        field.repopulate(&entries);
    }
}

/// Apply a pushed value under `policy`, returning the flag flip if any
fn apply_remote_value(field: &mut Field, value: &Value, policy: RemotePolicy) -> Option<FlagFlip> {
    let was_changed = field.is_changed();
    match policy {
        RemotePolicy::PreserveLocal if was_changed => {
            field.set_original(value);
            field.check_and_mark();
        }
        RemotePolicy::PreserveLocal | RemotePolicy::RemoteWins => field.load(value),
    }
    (field.is_changed() != was_changed).then(|| FlagFlip::of(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use kvs_value::{Choice, Choices, Control, FieldAction, FieldKind};
    use serde_json::json;

    fn remote(value: JsonValue) -> Map<String, JsonValue> {
        match value {
            JsonValue::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn console() -> SettingsConsole {
        SettingsConsole::headless(ConsoleConfig::default())
            .with_field(Field::empty("hostname", FieldKind::Text).with_baseline(&Value::text("dev")))
            .with_field(
                Field::empty("port", FieldKind::Number)
                    .with_baseline(&Value::Number(80.0))
                    .with_action(FieldAction::Reboot),
            )
    }

    #[test]
    fn edits_drive_counters() {
        let mut console = console();
        let hostname = FieldRef::top("hostname");

        assert!(console.edit(&hostname, &Value::text("console")).unwrap());
        assert!(console.pending_changes());
        assert_eq!(console.counters().changed, 1);

        assert!(console.edit(&hostname, &Value::text("dev")).unwrap());
        assert!(!console.pending_changes());
    }

    #[test]
    fn unknown_field_is_an_error() {
        let mut console = console();
        assert!(matches!(
            console.on_edit(&FieldRef::top("missing")),
            Err(ConsoleError::UnknownField(_))
        ));
    }

    #[test]
    fn read_only_edit_rejected() {
        let mut console = SettingsConsole::headless(ConsoleConfig::default())
            .with_field(Field::empty("serial", FieldKind::Text).with_read_only());
        let err = console
            .edit(&FieldRef::top("serial"), &Value::text("x"))
            .unwrap_err();
        assert!(err.is_rejection());
    }

    #[test]
    fn preserve_local_keeps_edit() {
        let mut console = console();
        let hostname = FieldRef::top("hostname");
        console.edit(&hostname, &Value::text("local")).unwrap();

        let outcome = console.apply_remote(&remote(json!({"hostname": "remote"})));
        assert_eq!(outcome.applied, 1);

        let field = console.field("hostname").unwrap();
        assert_eq!(field.read(), Value::text("local"));
        assert_eq!(field.read_original(), Some(&Value::text("remote")));
        assert!(field.is_changed());
    }

    #[test]
    fn preserve_local_clears_flag_when_remote_matches_edit() {
        let mut console = console();
        console
            .edit(&FieldRef::top("hostname"), &Value::text("same"))
            .unwrap();
        console.apply_remote(&remote(json!({"hostname": "same"})));

        assert!(!console.field("hostname").unwrap().is_changed());
        assert!(!console.pending_changes());
    }

    #[test]
    fn remote_wins_discards_edit() {
        let mut console = SettingsConsole::headless(
            ConsoleConfig::default().with_remote_policy(RemotePolicy::RemoteWins),
        )
        .with_field(Field::empty("hostname", FieldKind::Text).with_baseline(&Value::text("dev")));
        console
            .edit(&FieldRef::top("hostname"), &Value::text("local"))
            .unwrap();

        console.apply_remote(&remote(json!({"hostname": "remote"})));
        let field = console.field("hostname").unwrap();
        assert_eq!(field.read(), Value::text("remote"));
        assert!(!field.is_changed());
        assert!(!console.pending_changes());
    }

    #[test]
    fn unknown_and_non_scalar_keys_are_ignored() {
        let mut console = console();
        let outcome = console.apply_remote(&remote(json!({
            "nothing": 1,
            "hostname": {"nested": true},
        })));
        assert_eq!(outcome.applied, 0);
        assert_eq!(outcome.ignored, vec!["nothing".to_string(), "hostname".to_string()]);
        assert_eq!(console.field("hostname").unwrap().read(), Value::text("dev"));
    }

    #[test]
    fn confirmation_without_save_commits_nothing() {
        let mut console = console();
        console
            .edit(&FieldRef::top("port"), &Value::Number(8080.0))
            .unwrap();
        assert_eq!(console.confirm_saved(), PostSaveAction::None);
        assert!(console.field("port").unwrap().is_changed());
    }

    #[test]
    fn catalog_update_reselects_baseline() {
        let select = Field::new(
            "uplink",
            Control::SingleSelect(Choices::new([Choice::new("").disabled().selected()])),
        )
        .with_catalog("interfaces");
        let mut console = SettingsConsole::headless(ConsoleConfig::default()).with_field(select);
        console.apply_remote(&remote(json!({"uplink": "2"})));
        assert_eq!(console.field("uplink").unwrap().read(), Value::Null);

        console.update_catalog(
            "interfaces",
            vec![CatalogEntry::new(1, "eth0"), CatalogEntry::new(2, "eth1")],
        );
        let field = console.field("uplink").unwrap();
        assert_eq!(field.read(), Value::text("2"));
        assert!(!field.is_changed());
    }

    #[test]
    fn field_ref_display() {
        assert_eq!(FieldRef::top("a").to_string(), "a");
        assert_eq!(FieldRef::row("g", 2, "foo").to_string(), "g[2].foo");
    }
}
