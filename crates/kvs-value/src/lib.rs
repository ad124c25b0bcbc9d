//! KVS Value - typed field values with explicit change tracking
//!
//! Every editable setting is a [`Field`]: a [`Control`] holding the live
//! input, a baseline recorded the last time the device confirmed the value,
//! and a `changed` flag recomputed only on request.
//!
//! # Example
//!
//! ```rust
//! use kvs_value::{Field, FieldKind, Value};
//!
//! let mut field = Field::empty("hostname", FieldKind::Text).with_baseline(&Value::text("dev"));
//! field.set(&Value::text("console"));
//! assert!(field.check_and_mark());
//! assert!(field.is_changed());
//! ```

pub mod catalog;
pub mod control;
pub mod field;
pub mod value;

pub use catalog::{CatalogEntry, OptionCatalog};
pub use control::{bitset_to_values, Choice, Choices, Control, FieldKind, MAX_BITSET_OPTIONS};
pub use field::{commit, Field, FieldAction};
pub use value::{format_number, parse_number, string_to_bool, Value, TRUTHY_STRINGS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
