//! KVS Group - repeatable row groups
//!
//! A [`Group`] keeps rows stored on the device under keys suffixed with the
//! row's position. Because rows have no stable identity, the group:
//! - records uncommitted slot additions and deletions in a [`PendingLog`]
//! - shifts values forward when a row is removed from the middle
//! - forces every schema field of an appended row to be written
//!
//! Rendering is delegated to a [`RowView`].

pub mod error;
pub mod group;
pub mod pending;
pub mod row;
pub mod view;

pub use error::{GroupError, Result};
pub use group::{Appended, Group};
pub use pending::{PendingEntry, PendingLog, PendingOp, Toggle};
pub use row::{FlagFlip, Row};
pub use view::{HeadlessView, RowView, ViewHandle};
