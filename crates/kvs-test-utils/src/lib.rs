//! Testing utilities for the kvs workspace
//!
//! Recording collaborators and group fixtures shared by the integration
//! tests of every crate.

#![allow(missing_docs)]

use kvs_console::{Transport, TransportError};
use kvs_group::{Group, RowView, ViewHandle};
use kvs_patch::WireRequest;
use kvs_value::{Choices, Control, Field, FieldKind, Value};
use serde_json::{Map, Value as JsonValue};

/// `foo` values of the reindex fixture
pub const FOO_VALUES: [&str; 4] = ["1111111", "2222222", "3333333", "4444444"];

/// `bar` values of the reindex fixture
pub const BAR_VALUES: [&str; 4] = ["", "foobarfoo", "barfoobar", ""];

/// View remembering every row it rendered and detached
#[derive(Debug, Default)]
pub struct RecordingView {
    next: u64,
    pub created: Vec<(String, ViewHandle)>,
    pub destroyed: Vec<ViewHandle>,
}

impl RecordingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn live(&self) -> usize {
        self.created.len() - self.destroyed.len()
    }
}

impl RowView for RecordingView {
    fn create_row_view(&mut self, group_id: &str) -> ViewHandle {
        let handle = ViewHandle(self.next);
        self.next += 1;
        self.created.push((group_id.to_string(), handle));
        handle
    }

    fn destroy_row_view(&mut self, handle: ViewHandle) {
        self.destroyed.push(handle);
    }
}

/// Transport keeping every request, optionally refusing them
#[derive(Debug, Default)]
pub struct RecordingTransport {
    pub sent: Vec<WireRequest>,
    pub refuse: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refusing() -> Self {
        Self {
            sent: Vec::new(),
            refuse: true,
        }
    }
}

impl Transport for RecordingTransport {
    fn send_patch(&mut self, request: &WireRequest) -> Result<(), TransportError> {
        if self.refuse {
            return Err(TransportError::new("connection closed"));
        }
        self.sent.push(request.clone());
        Ok(())
    }
}

/// Empty group with text fields `foo` and `bar`
pub fn foo_bar_group() -> Group {
    Group::new(
        "foobar",
        vec![
            Field::empty("foo", FieldKind::Text),
            Field::empty("bar", FieldKind::Text),
        ],
    )
}

/// Positional rows for a `foo`/`bar` group
pub fn foo_bar_rows(foo: &[&str], bar: &[&str]) -> Vec<Vec<Value>> {
    foo.iter()
        .zip(bar)
        .map(|(foo, bar)| vec![Value::text(*foo), Value::text(*bar)])
        .collect()
}

/// Four committed rows built from [`FOO_VALUES`] and [`BAR_VALUES`]
pub fn reindex_fixture(view: &mut dyn RowView) -> Group {
    let mut group = foo_bar_group();
    group.load(None, &foo_bar_rows(&FOO_VALUES, &BAR_VALUES), view);
    group
}

/// Multi-select whose option values are the bit indices `0..count`
pub fn bit_select(name: &str, count: u32) -> Field {
    Field::new(
        name,
        Control::MultiSelect(Choices::from_values((0..count).map(|i| i.to_string()))),
    )
}

/// JSON object literal as a remote update
pub fn remote(value: JsonValue) -> Map<String, JsonValue> {
    match value {
        JsonValue::Object(map) => map,
        other => panic!("remote update must be an object, got {other}"),
    }
}
