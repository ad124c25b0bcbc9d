//! Dirty counters and the post-save follow-up

use serde::{Deserialize, Serialize};

use kvs_group::FlagFlip;
use kvs_value::FieldAction;

/// What the console must do once a save is confirmed
///
/// Ordered from least to most disruptive.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum PostSaveAction {
    /// Nothing
    #[default]
    None,
    /// Reload the console
    Reload,
    /// Reconnect to the device
    Reconnect,
    /// Reboot the device
    Reboot,
}

/// Number of dirty tracked fields, overall and per follow-up
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirtyCounters {
    /// Dirty fields not yet handed to a save
    pub changed: usize,
    /// Dirty fields requiring a reboot
    pub reboot: usize,
    /// Dirty fields requiring a reconnect
    pub reconnect: usize,
    /// Dirty fields requiring a reload
    pub reload: usize,
}

impl DirtyCounters {
    /// Account for one flag flip
    ///
    /// Untracked fields are ignored.
    pub fn apply(&mut self, flip: FlagFlip) {
        if !flip.action.is_tracked() {
            return;
        }
        bump(&mut self.changed, flip.changed);
        match flip.action {
            FieldAction::Reboot => bump(&mut self.reboot, flip.changed),
            FieldAction::Reconnect => bump(&mut self.reconnect, flip.changed),
            FieldAction::Reload => bump(&mut self.reload, flip.changed),
            FieldAction::None | FieldAction::Untracked => {}
        }
    }

    /// Account for several flips
    pub fn apply_all(&mut self, flips: impl IntoIterator<Item = FlagFlip>) {
        for flip in flips {
            self.apply(flip);
        }
    }

    /// Follow-up implied by the counters: reboot, then reconnect, then reload
    #[must_use]
    pub fn follow_up(&self) -> PostSaveAction {
        if self.reboot > 0 {
            PostSaveAction::Reboot
        } else if self.reconnect > 0 {
            PostSaveAction::Reconnect
        } else if self.reload > 0 {
            PostSaveAction::Reload
        } else {
            PostSaveAction::None
        }
    }

    /// Zero every counter
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn bump(counter: &mut usize, up: bool) {
    if up {
        *counter += 1;
    } else {
        *counter = counter.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flip(action: FieldAction, changed: bool) -> FlagFlip {
        FlagFlip { action, changed }
    }

    #[test]
    fn follow_up_precedence() {
        let mut counters = DirtyCounters::default();
        assert_eq!(counters.follow_up(), PostSaveAction::None);

        counters.apply(flip(FieldAction::Reload, true));
        assert_eq!(counters.follow_up(), PostSaveAction::Reload);

        counters.apply(flip(FieldAction::Reconnect, true));
        assert_eq!(counters.follow_up(), PostSaveAction::Reconnect);

        counters.apply(flip(FieldAction::Reboot, true));
        assert_eq!(counters.follow_up(), PostSaveAction::Reboot);
        assert_eq!(counters.changed, 3);
    }

    #[test]
    fn actions_order_by_disruption() {
        assert!(PostSaveAction::Reboot > PostSaveAction::Reconnect);
        assert!(PostSaveAction::Reconnect > PostSaveAction::Reload);
        assert!(PostSaveAction::Reload > PostSaveAction::None);
    }

    #[test]
    fn untracked_fields_never_count() {
        let mut counters = DirtyCounters::default();
        counters.apply(flip(FieldAction::Untracked, true));
        assert_eq!(counters, DirtyCounters::default());
    }

    #[test]
    fn counters_do_not_underflow() {
        let mut counters = DirtyCounters::default();
        counters.apply(flip(FieldAction::Reboot, false));
        assert_eq!(counters.changed, 0);
        assert_eq!(counters.reboot, 0);
    }
}
