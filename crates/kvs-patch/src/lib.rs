//! KVS Patch - minimal set/delete patches
//!
//! Walks fields and groups in document order and produces the smallest
//! [`Patch`] that reproduces pending edits on the device.
//!
//! # Example
//!
//! ```rust
//! use kvs_patch::{build, Scope};
//! use kvs_value::{Field, FieldKind, Value};
//!
//! let mut field = Field::empty("hostname", FieldKind::Text);
//! field.set(&Value::text("console"));
//! field.check_and_mark();
//!
//! let patch = build(&Scope::new().field(&field), false);
//! assert_eq!(patch.set["hostname"], "console");
//! ```

pub mod builder;
pub mod key;
pub mod patch;
pub mod scope;

pub use builder::{build, BuildOptions, PatchBuilder};
pub use key::{composite_key, KeyCounter};
pub use patch::{wire_value, Patch, WireRequest, NO_NUMBER_WIRE};
pub use scope::{Scope, ScopeItem};
