//! View collaborator
//!
//! Rendering rows is someone else's job; the group only asks the view for a
//! handle when a row appears and hands it back when the row goes away.

use serde::{Deserialize, Serialize};

/// Opaque handle of a rendered row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ViewHandle(pub u64);

/// Renders and detaches rows
pub trait RowView {
    /// Render a row for `group_id`
    fn create_row_view(&mut self, group_id: &str) -> ViewHandle;

    /// Detach a rendered row
    fn destroy_row_view(&mut self, handle: ViewHandle);
}

/// View that renders nothing and hands out sequential handles
#[derive(Debug, Clone, Default)]
pub struct HeadlessView {
    next: u64,
    live: usize,
}

impl HeadlessView {
    /// Create headless view
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows currently attached
    #[inline]
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }
}

impl RowView for HeadlessView {
    fn create_row_view(&mut self, _group_id: &str) -> ViewHandle {
        let handle = ViewHandle(self.next);
        self.next += 1;
        self.live += 1;
        handle
    }

    fn destroy_row_view(&mut self, _handle: ViewHandle) {
        self.live = self.live.saturating_sub(1);
    }
}
