//! Console integration tests
//!
//! Full edit/save/confirm cycles, device pushes and scenario replay.

use std::io::Write;

use kvs_console::{
    replay, ConsoleConfig, ConsoleError, DirtyCounters, FieldRef, GroupPush, PostSaveAction,
    RemotePolicy, Scenario, SettingsConsole,
};
use kvs_test_utils::{foo_bar_group, remote, RecordingTransport, RecordingView, BAR_VALUES, FOO_VALUES};
use kvs_group::Group;
use kvs_value::{CatalogEntry, Field, FieldAction, FieldKind, Value};
use pretty_assertions::assert_eq;
use serde_json::json;

fn reindex_console() -> SettingsConsole<RecordingView> {
    let mut console = SettingsConsole::new(ConsoleConfig::default(), RecordingView::new())
        .with_field(
            Field::empty("hostname", FieldKind::Text)
                .with_baseline(&Value::text("dev"))
                .with_action(FieldAction::Reload),
        )
        .with_group(foo_bar_group().with_max_rows(5));

    let values: Vec<_> = FOO_VALUES
        .iter()
        .zip(BAR_VALUES)
        .map(|(foo, bar)| vec![json!(foo), json!(bar)])
        .collect();
    console
        .load_group(
            "foobar",
            GroupPush {
                values,
                ..GroupPush::default()
            },
        )
        .unwrap();
    console
}

/// Removing a row through the console yields the expected wire request
#[test]
fn test_remove_row_save_and_confirm() {
    let mut console = reindex_console();
    let mut transport = RecordingTransport::new();

    console.remove_row("foobar", 1).unwrap();
    assert!(console.pending_changes());
    assert_eq!(console.counters().changed, 4);

    let patch = console.save(&mut transport, false).unwrap();
    assert_eq!(transport.sent.len(), 1);
    assert_eq!(patch.del, vec!["foo3", "bar3"]);
    assert_eq!(patch.set.len(), 4);
    assert!(console.is_awaiting_confirmation());
    assert!(!console.pending_changes());

    assert_eq!(console.confirm_saved(), PostSaveAction::None);
    assert!(!console.is_awaiting_confirmation());
    assert!(console.patch(false).is_empty());
}

/// The wire request wraps the patch in a settings envelope
#[test]
fn test_wire_envelope() {
    let mut console = reindex_console();
    let mut transport = RecordingTransport::new();
    console
        .edit(&FieldRef::top("hostname"), &Value::text("console"))
        .unwrap();
    console.save(&mut transport, false).unwrap();

    let wire = serde_json::to_value(&transport.sent[0]).unwrap();
    assert_eq!(
        wire,
        json!({"settings": {"set": {"hostname": "console"}, "del": []}})
    );
}

/// The follow-up picks the most disruptive action among saved fields
#[test]
fn test_follow_up_precedence() {
    let mut console = SettingsConsole::headless(ConsoleConfig::default())
        .with_field(
            Field::empty("theme", FieldKind::Text)
                .with_baseline(&Value::text("light"))
                .with_action(FieldAction::Reload),
        )
        .with_field(
            Field::empty("ssid", FieldKind::Text)
                .with_baseline(&Value::text("home"))
                .with_action(FieldAction::Reconnect),
        );
    let mut transport = RecordingTransport::new();

    console.edit(&FieldRef::top("theme"), &Value::text("dark")).unwrap();
    console.edit(&FieldRef::top("ssid"), &Value::text("work")).unwrap();
    console.save(&mut transport, false).unwrap();

    assert_eq!(console.confirm_saved(), PostSaveAction::Reconnect);
    assert_eq!(console.counters(), DirtyCounters::default());
}

/// Untracked fields are saved but never make the console dirty
#[test]
fn test_untracked_fields() {
    let mut console = SettingsConsole::headless(ConsoleConfig::default()).with_field(
        Field::empty("note", FieldKind::Text).with_action(FieldAction::Untracked),
    );
    console.edit(&FieldRef::top("note"), &Value::text("hi")).unwrap();

    assert!(!console.pending_changes());
    assert_eq!(console.patch(false).set.get("note"), Some(&json!("hi")));
}

/// A refused request leaves counters and flags untouched
#[test]
fn test_transport_failure() {
    let mut console = reindex_console();
    let mut transport = RecordingTransport::refusing();
    console
        .edit(&FieldRef::top("hostname"), &Value::text("console"))
        .unwrap();

    let err = console.save(&mut transport, false).unwrap_err();
    assert!(matches!(err, ConsoleError::Transport(_)));
    assert!(console.pending_changes());
    assert!(!console.is_awaiting_confirmation());
}

/// A sixth row is rejected without touching the group
#[test]
fn test_max_rows_rejected() {
    let mut console = reindex_console();
    console.append_row("foobar").unwrap();

    let err = console.append_row("foobar").unwrap_err();
    assert!(err.is_rejection());
    assert_eq!(console.group("foobar").unwrap().len(), 5);
    assert_eq!(console.view().live(), 5);
}

/// Row edits go through the same change tracking as top-level ones
#[test]
fn test_row_edit() {
    let mut console = reindex_console();
    let target = FieldRef::row("foobar", 2, "bar");

    assert!(console.edit(&target, &Value::text("edited")).unwrap());
    assert_eq!(console.patch(false).set.get("bar2"), Some(&json!("edited")));
    assert!(matches!(
        console.edit(&FieldRef::row("foobar", 9, "bar"), &Value::Null),
        Err(ConsoleError::UnknownField(_))
    ));
}

/// A truthy `saved` key confirms the save after applying the other keys;
/// the echoed value clearing the flag does not lose the follow-up
#[test]
fn test_remote_saved_confirms() {
    let mut console = reindex_console();
    let mut transport = RecordingTransport::new();
    console
        .edit(&FieldRef::top("hostname"), &Value::text("console"))
        .unwrap();
    console.save(&mut transport, false).unwrap();

    let outcome = console.apply_remote(&remote(json!({"hostname": "console", "saved": 1})));
    assert_eq!(outcome.confirmed, Some(PostSaveAction::Reload));
    assert!(!console.field("hostname").unwrap().is_changed());
    assert!(console.patch(false).is_empty());
}

/// A group push replaces the rows and updates the cap
#[test]
fn test_remote_group_push() {
    let mut console = reindex_console();
    let outcome = console.apply_remote(&remote(json!({
        "foobar": {"schema": ["bar", "foo"], "max": 2, "values": [["x", "y"]]},
    })));

    assert_eq!(outcome.applied, 1);
    let group = console.group("foobar").unwrap();
    assert_eq!(group.len(), 1);
    assert_eq!(group.max_rows(), 2);
    let row = group.row(0).unwrap();
    assert_eq!(row.field("bar").unwrap().read(), Value::text("x"));
    assert_eq!(row.field("foo").unwrap().read(), Value::text("y"));
    assert_eq!(console.view().live(), 1);
}

/// A push without row values for a group is ignored
#[test]
fn test_malformed_group_push_ignored() {
    let mut console = reindex_console();
    let outcome = console.apply_remote(&remote(json!({"foobar": 3})));
    assert_eq!(outcome.ignored, vec!["foobar".to_string()]);
    assert_eq!(console.group("foobar").unwrap().len(), 4);
}

/// Remote-wins replaces a pending local edit
#[test]
fn test_remote_wins_policy() {
    let config = ConsoleConfig::default().with_remote_policy(RemotePolicy::RemoteWins);
    let mut console = SettingsConsole::headless(config)
        .with_field(Field::empty("hostname", FieldKind::Text).with_baseline(&Value::text("dev")));
    console
        .edit(&FieldRef::top("hostname"), &Value::text("local"))
        .unwrap();

    console.apply_remote(&remote(json!({"hostname": "remote"})));
    assert_eq!(console.field("hostname").unwrap().read(), Value::text("remote"));
    assert!(console.patch(false).is_empty());
}

const REINDEX_SCENARIO: &str = r#"{
  "layout": {
    "groups": [
      {"id": "foobar", "max_rows": 5, "fields": [
        {"name": "foo", "kind": "text"},
        {"name": "bar", "kind": "text"}
      ]}
    ]
  },
  "device": {
    "foobar": {"values": [
      ["1111111", ""], ["2222222", "foobarfoo"], ["3333333", "barfoobar"], ["4444444", ""]
    ]}
  },
  "steps": [
    {"op": "remove", "group": "foobar", "row": 1},
    {"op": "save"},
    {"op": "confirm"},
    {"op": "append", "group": "foobar"},
    {"op": "append", "group": "foobar"},
    {"op": "append", "group": "foobar"}
  ]
}"#;

/// Replaying the reindex scenario sends the minimal patch and records
/// the capacity rejection
#[test]
fn test_replay_scenario() {
    let scenario = Scenario::from_json_str(REINDEX_SCENARIO).unwrap();
    let mut transport = RecordingTransport::new();
    let report = replay(&scenario, ConsoleConfig::default(), &mut transport).unwrap();

    assert_eq!(report.patches.len(), 1);
    let patch = &report.patches[0];
    assert_eq!(patch.del, vec!["foo3", "bar3"]);
    assert_eq!(patch.set.get("foo1"), Some(&json!("3333333")));
    assert_eq!(patch.set.get("foo2"), Some(&json!("4444444")));
    assert_eq!(patch.set.get("bar1"), Some(&json!("barfoobar")));
    assert_eq!(patch.set.get("bar2"), Some(&json!("")));

    assert_eq!(report.follow_ups, vec![PostSaveAction::None]);
    assert_eq!(report.rejections.len(), 1);
    assert_eq!(report.rejections[0].0, 5);
    assert_eq!(report.counters.changed, 4);
}

/// Scenario and config files load from disk in either format
#[test]
fn test_load_files() {
    let dir = tempfile::tempdir().unwrap();

    let config_path = dir.path().join("console.toml");
    let mut file = std::fs::File::create(&config_path).unwrap();
    writeln!(file, "remote_policy = \"remote-wins\"").unwrap();
    let config = ConsoleConfig::load(&config_path).unwrap();
    assert_eq!(config.remote_policy, RemotePolicy::RemoteWins);

    let scenario_path = dir.path().join("scenario.yaml");
    std::fs::write(
        &scenario_path,
        "layout:\n  fields:\n    - { name: mode, kind: text }\ndevice:\n  mode: auto\nsteps:\n  - { op: edit, field: mode, value: manual }\n  - { op: save }\n",
    )
    .unwrap();
    let scenario = Scenario::load(&scenario_path).unwrap();
    let mut transport = RecordingTransport::new();
    let report = replay(&scenario, config, &mut transport).unwrap();
    assert_eq!(report.patches[0].set.get("mode"), Some(&json!("manual")));
}

/// A catalog arriving for an untouched select leaves it clean
#[test]
fn test_catalog_update_keeps_untouched_select_clean() {
    let mut console = SettingsConsole::headless(ConsoleConfig::default()).with_field(
        Field::empty("uplink", FieldKind::SingleSelect).with_catalog("interfaces"),
    );
    console.update_catalog("interfaces", vec![CatalogEntry::new(1, "eth0")]);

    assert!(!console.field("uplink").unwrap().is_changed());
    assert_eq!(console.counters(), DirtyCounters::default());
    assert!(!console.pending_changes());
    assert!(console.patch(false).is_empty());

    assert!(console
        .edit(&FieldRef::top("uplink"), &Value::text("1"))
        .unwrap());
    assert_eq!(console.patch(false).set.get("uplink"), Some(&json!("1")));
}

/// Appended rows keep every schema key through a catalog refresh
#[test]
fn test_catalog_update_keeps_appended_row_visible() {
    let template = vec![
        Field::empty("name", FieldKind::Text),
        Field::empty("ports", FieldKind::MultiSelect).with_catalog("ports"),
    ];
    let mut console =
        SettingsConsole::headless(ConsoleConfig::default()).with_group(Group::new("g", template));
    console.append_row("g").unwrap();
    let before = console.patch(false);
    assert_eq!(before.set.get("ports0"), Some(&json!(0)));

    console.update_catalog_simple("ports", "Port", 4);

    let after = console.patch(false);
    assert_eq!(after, before);
    assert_eq!(after.set.get("name0"), Some(&json!("")));
    assert_eq!(console.counters().changed, 2);
}

mod counters {
    use super::*;
    use proptest::prelude::*;

    const NAMES: [&str; 3] = ["a", "b", "c"];

    proptest! {
        /// The changed counter always equals the number of dirty fields
        #[test]
        fn prop_counter_matches_flags(
            edits in prop::collection::vec((0usize..3, "[xy]{0,1}"), 0..24),
        ) {
            let mut console = SettingsConsole::headless(ConsoleConfig::default());
            for name in NAMES {
                console.add_field(Field::empty(name, FieldKind::Text).with_baseline(&Value::text("x")));
            }

            for (index, text) in edits {
                console
                    .edit(&FieldRef::top(NAMES[index]), &Value::text(text))
                    .unwrap();
            }

            let dirty = console.fields().iter().filter(|f| f.is_changed()).count();
            prop_assert_eq!(console.counters().changed, dirty);
            prop_assert_eq!(console.pending_changes(), dirty > 0);
        }
    }
}
