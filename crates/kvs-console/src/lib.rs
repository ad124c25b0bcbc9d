//! KVS Console - settings console over the kvs core
//!
//! [`SettingsConsole`] owns the top-level fields and row groups of one
//! configuration view and provides the explicit entry points that mutate
//! them:
//! - user edits ([`SettingsConsole::on_edit`], [`SettingsConsole::edit`])
//! - row operations ([`SettingsConsole::append_row`], [`SettingsConsole::remove_row`])
//! - device pushes ([`SettingsConsole::apply_remote`])
//! - saving and confirmation ([`SettingsConsole::save`], [`SettingsConsole::confirm_saved`])
//!
//! # Example
//!
//! ```rust
//! use kvs_console::{ConsoleConfig, FieldRef, PostSaveAction, SettingsConsole, WriterTransport};
//! use kvs_value::{Field, FieldAction, FieldKind, Value};
//!
//! let mut console = SettingsConsole::headless(ConsoleConfig::default()).with_field(
//!     Field::empty("port", FieldKind::Number)
//!         .with_baseline(&Value::Number(80.0))
//!         .with_action(FieldAction::Reboot),
//! );
//!
//! console.edit(&FieldRef::top("port"), &Value::text("8080")).unwrap();
//! assert!(console.pending_changes());
//!
//! let mut transport = WriterTransport::new(Vec::new());
//! let patch = console.save(&mut transport, false).unwrap();
//! assert_eq!(patch.set["port"], 8080);
//! assert_eq!(console.confirm_saved(), PostSaveAction::Reboot);
//! ```

pub mod config;
pub mod console;
pub mod counters;
pub mod error;
pub mod scenario;
pub mod telemetry;
pub mod transport;

pub use config::{ConsoleConfig, LogFormat, RemotePolicy};
pub use console::{FieldRef, GroupPush, RemoteOutcome, SettingsConsole, SAVED_KEY};
pub use counters::{DirtyCounters, PostSaveAction};
pub use error::{ConfigError, ConsoleError, Result, ScenarioError, TransportError};
pub use scenario::{
    build_console, replay, CatalogSpec, FieldSpec, GroupSpec, Layout, Scenario, ScenarioReport,
    Step,
};
pub use transport::{Transport, WriterTransport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
