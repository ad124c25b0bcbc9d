//! Scenario replay
//!
//! A scenario describes a layout, the key-values the device pushes first,
//! and a list of steps. Replaying it drives a headless console and collects
//! every patch that was sent. Scenarios are JSON or YAML:
//!
//! ```yaml
//! layout:
//!   groups:
//!     - id: foobar
//!       fields:
//!         - { name: foo, kind: text }
//!         - { name: bar, kind: text }
//! device:
//!   foobar: { values: [["1111111", ""], ["2222222", "foobarfoo"]] }
//! steps:
//!   - { op: remove, group: foobar, row: 0 }
//!   - { op: save }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use kvs_group::Group;
use kvs_patch::Patch;
use kvs_value::{
    CatalogEntry, Choices, Control, Field, FieldAction, FieldKind, Value, MAX_BITSET_OPTIONS,
};

use crate::config::ConsoleConfig;
use crate::console::{FieldRef, SettingsConsole};
use crate::counters::{DirtyCounters, PostSaveAction};
use crate::error::ScenarioError;
use crate::transport::Transport;

/// Field declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Field kind
    pub kind: FieldKind,
    /// Option values of a select; bit indices for a multi-select
    #[serde(default)]
    pub options: Vec<String>,
    /// Catalog populating a select
    #[serde(default)]
    pub catalog: Option<String>,
    /// Excluded from patches
    #[serde(default)]
    pub ignored: bool,
    /// Never edited or committed
    #[serde(default)]
    pub read_only: bool,
    /// Save follow-up
    #[serde(default)]
    pub action: FieldAction,
    /// Rendered default, not a baseline
    #[serde(default)]
    pub default: Option<JsonValue>,
}

impl FieldSpec {
    /// Build the field
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Layout`] for a catalog on a non-select field or a
    /// multi-select with more options than its bit set holds.
    pub fn build(&self) -> Result<Field, ScenarioError> {
        let control = match self.kind {
            FieldKind::SingleSelect if self.catalog.is_some() => {
                Control::SingleSelect(Choices::from_catalog(&[]))
            }
            FieldKind::SingleSelect => Control::SingleSelect(Choices::from_values(&self.options)),
            FieldKind::MultiSelect => {
                if self.options.len() > MAX_BITSET_OPTIONS as usize {
                    return Err(ScenarioError::Layout(format!(
                        "{} has {} options, at most {} fit a bit set",
                        self.name,
                        self.options.len(),
                        MAX_BITSET_OPTIONS
                    )));
                }
                Control::MultiSelect(Choices::from_values(&self.options))
            }
            kind if self.catalog.is_some() => {
                return Err(ScenarioError::Layout(format!(
                    "{} is {:?} and cannot use a catalog",
                    self.name, kind
                )));
            }
            kind => Control::empty(kind),
        };

        let mut field = Field::new(&self.name, control).with_action(self.action);
        if let Some(catalog) = &self.catalog {
            field = field.with_catalog(catalog);
        }
        if self.ignored {
            field = field.with_ignored();
        }
        if self.read_only {
            field = field.with_read_only();
        }
        if let Some(value) = self.default.as_ref().and_then(Value::from_json) {
            field.set(&value);
        }
        Ok(field)
    }
}

/// Group declaration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    /// Group id
    pub id: String,
    /// Row template
    pub fields: Vec<FieldSpec>,
    /// Schema, defaulting to the template names
    #[serde(default)]
    pub schema: Option<Vec<String>>,
    /// Names deleted per vacated slot, defaulting to the schema
    #[serde(default)]
    pub deletion_schema: Option<Vec<String>>,
    /// Row cap, 0 for unlimited
    #[serde(default)]
    pub max_rows: usize,
}

impl GroupSpec {
    /// Build the empty group
    ///
    /// # Errors
    ///
    /// Propagates template field errors.
    pub fn build(&self) -> Result<Group, ScenarioError> {
        let template = self
            .fields
            .iter()
            .map(FieldSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        let mut group = Group::new(&self.id, template).with_max_rows(self.max_rows);
        if let Some(schema) = &self.schema {
            group = group.with_schema(schema);
        }
        if let Some(names) = &self.deletion_schema {
            group = group.with_deletion_schema(names);
        }
        Ok(group)
    }
}

/// Catalog contents, explicit or generated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogSpec {
    /// Catalog name
    pub name: String,
    /// Explicit entries
    #[serde(default)]
    pub entries: Vec<CatalogEntry>,
    /// Label prefix of generated entries
    #[serde(default)]
    pub pretty: Option<String>,
    /// Number of generated entries
    #[serde(default)]
    pub count: u32,
}

/// Fields, groups and catalogs of a console
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    /// Top-level fields
    #[serde(default)]
    pub fields: Vec<FieldSpec>,
    /// Groups
    #[serde(default)]
    pub groups: Vec<GroupSpec>,
    /// Catalogs populated before anything is read
    #[serde(default)]
    pub catalogs: Vec<CatalogSpec>,
}

/// One scripted action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    /// User edit
    Edit {
        /// Field name
        field: String,
        /// Group id for row fields
        #[serde(default)]
        group: Option<String>,
        /// Row index for row fields
        #[serde(default)]
        row: Option<usize>,
        /// New value
        value: JsonValue,
    },
    /// Append a row
    Append {
        /// Group id
        group: String,
    },
    /// Remove a row
    Remove {
        /// Group id
        group: String,
        /// Row index
        row: usize,
    },
    /// Device push
    Remote {
        /// Pushed key-values
        values: Map<String, JsonValue>,
    },
    /// Save
    Save {
        /// Write every field
        #[serde(default)]
        force_all: bool,
    },
    /// Device confirms the save
    Confirm,
    /// Catalog update
    Catalog(CatalogSpec),
}

/// A replayable session
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Console layout
    #[serde(default)]
    pub layout: Layout,
    /// Initial device key-values
    #[serde(default)]
    pub device: Map<String, JsonValue>,
    /// Steps in order
    #[serde(default)]
    pub steps: Vec<Step>,
}

impl Scenario {
    /// Parse JSON text
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Json`] on invalid input.
    pub fn from_json_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse YAML text
    ///
    /// # Errors
    ///
    /// [`ScenarioError::Yaml`] on invalid input.
    pub fn from_yaml_str(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Load from a file, YAML for `.yaml`/`.yml` and JSON otherwise
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            _ => Self::from_json_str(&text),
        }
    }
}

/// Everything a replay produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScenarioReport {
    /// Patches in the order they were sent
    pub patches: Vec<Patch>,
    /// Follow-ups of confirmed saves
    pub follow_ups: Vec<PostSaveAction>,
    /// Non-fatal rejections as `(step, message)`
    pub rejections: Vec<(usize, String)>,
    /// Counters after the last step
    pub counters: DirtyCounters,
}

/// Build a console for `layout` and apply the device's initial push
///
/// # Errors
///
/// [`ScenarioError::Layout`] for invalid field declarations.
pub fn build_console(
    layout: &Layout,
    device: &Map<String, JsonValue>,
    config: ConsoleConfig,
) -> Result<SettingsConsole, ScenarioError> {
    let mut console = SettingsConsole::headless(config);
    for catalog in &layout.catalogs {
        apply_catalog(&mut console, catalog);
    }
    for spec in &layout.fields {
        console.add_field(spec.build()?);
    }
    for spec in &layout.groups {
        console.add_group(spec.build()?);
    }

    let outcome = console.apply_remote(device);
    if !outcome.ignored.is_empty() {
        tracing::warn!("Device keys with no field: {}", outcome.ignored.join(", "));
    }
    Ok(console)
}

/// Replay a scenario, sending every save through `transport`
///
/// Capacity and read-only rejections are recorded and replay continues;
/// any other failure stops it.
///
/// # Errors
///
/// [`ScenarioError::Layout`] or [`ScenarioError::Step`].
pub fn replay(
    scenario: &Scenario,
    config: ConsoleConfig,
    transport: &mut dyn Transport,
) -> Result<ScenarioReport, ScenarioError> {
    let mut console = build_console(&scenario.layout, &scenario.device, config)?;
    let mut report = ScenarioReport::default();

    for (step, action) in scenario.steps.iter().enumerate() {
        tracing::debug!("Step {}: {:?}", step, action);
        let result = match action {
            Step::Edit {
                field,
                group,
                row,
                value,
            } => {
                let target = match (group, row) {
                    (Some(group), Some(row)) => FieldRef::row(group, *row, field),
                    _ => FieldRef::top(field),
                };
                let value = Value::from_json(value).unwrap_or(Value::Null);
                console.edit(&target, &value).map(|_| ())
            }
            Step::Append { group } => console.append_row(group).map(|_| ()),
            Step::Remove { group, row } => console.remove_row(group, *row),
            Step::Remote { values } => {
                if let Some(follow_up) = console.apply_remote(values).confirmed {
                    report.follow_ups.push(follow_up);
                }
                Ok(())
            }
            Step::Save { force_all } => console
                .save(transport, *force_all)
                .map(|patch| report.patches.push(patch)),
            Step::Confirm => {
                report.follow_ups.push(console.confirm_saved());
                Ok(())
            }
            Step::Catalog(catalog) => {
                apply_catalog(&mut console, catalog);
                Ok(())
            }
        };

        match result {
            Ok(()) => {}
            Err(e) if e.is_rejection() => {
                tracing::warn!("Step {} rejected: {}", step, e);
                report.rejections.push((step, e.to_string()));
            }
            Err(source) => return Err(ScenarioError::Step { step, source }),
        }
    }

    report.counters = console.counters();
    Ok(report)
}

fn apply_catalog(console: &mut SettingsConsole, catalog: &CatalogSpec) {
    match &catalog.pretty {
        Some(pretty) => console.update_catalog_simple(&catalog.name, pretty, catalog.count),
        None => console.update_catalog(&catalog.name, catalog.entries.clone()),
    }
}
