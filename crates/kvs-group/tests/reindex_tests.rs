//! Reindexing integration tests
//!
//! Drives groups through append/remove sequences and checks slot flags,
//! the pending log and view bookkeeping.

use kvs_group::{GroupError, PendingOp};
use kvs_test_utils::{foo_bar_group, foo_bar_rows, reindex_fixture, RecordingView};
use kvs_value::Value;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn flags(group: &kvs_group::Group) -> Vec<(bool, bool)> {
    group
        .rows()
        .iter()
        .map(|row| {
            (
                row.field("foo").unwrap().is_changed(),
                row.field("bar").unwrap().is_changed(),
            )
        })
        .collect()
}

/// Removing row 1 of four shifts rows 2 and 3 forward and vacates slot 3
#[test]
fn test_remove_middle_row() {
    let mut view = RecordingView::new();
    let mut group = reindex_fixture(&mut view);

    let flips = group.remove(1, &mut view).unwrap();

    assert_eq!(group.len(), 3);
    assert_eq!(flips.len(), 4);
    assert_eq!(flags(&group), vec![(false, false), (true, true), (true, true)]);
    assert_eq!(group.pending().entries().len(), 1);
    assert_eq!(group.pending().get(3), Some(PendingOp::Del));
    assert_eq!(view.destroyed.len(), 1);
    assert_eq!(view.live(), 3);

    let foo: Vec<_> = group
        .rows()
        .iter()
        .map(|r| r.field("foo").unwrap().read())
        .collect();
    assert_eq!(
        foo,
        vec![Value::text("1111111"), Value::text("3333333"), Value::text("4444444")]
    );
}

/// Rows whose value already matches the slot they move into stay clean
#[test]
fn test_equal_neighbours_stay_clean() {
    let mut view = RecordingView::new();
    let mut group = foo_bar_group();
    group.load(
        None,
        &foo_bar_rows(&["a", "a", "a"], &["x", "y", "x"]),
        &mut view,
    );

    group.remove(0, &mut view).unwrap();
    assert_eq!(flags(&group), vec![(false, true), (false, true)]);
}

/// Appending into a slot with a pending delete cancels it
#[test]
fn test_append_cancels_pending_delete() {
    let mut view = RecordingView::new();
    let mut group = reindex_fixture(&mut view);

    group.remove(3, &mut view).unwrap();
    assert_eq!(group.pending().get(3), Some(PendingOp::Del));

    let appended = group.append(&mut view).unwrap();
    assert_eq!(appended.index, 3);
    assert!(group.pending().is_empty());
}

/// A full group rejects the append without rendering anything
#[test]
fn test_max_rows_rejection() {
    let mut view = RecordingView::new();
    let mut group = foo_bar_group().with_max_rows(5);
    for _ in 0..5 {
        group.append(&mut view).unwrap();
    }

    let err = group.append(&mut view).unwrap_err();
    assert_eq!(
        err,
        GroupError::MaxRowsReached {
            group: "foobar".into(),
            max: 5
        }
    );
    assert_eq!(group.len(), 5);
    assert_eq!(view.created.len(), 5);
    assert_eq!(group.pending().len(), 5);
}

/// Zero means unlimited
#[test]
fn test_zero_max_is_unlimited() {
    let mut view = RecordingView::new();
    let mut group = foo_bar_group().with_max_rows(0);
    for _ in 0..50 {
        group.append(&mut view).unwrap();
    }
    assert!(group.check_max());
}

/// Removing the only row of a committed group schedules its slot
#[test]
fn test_remove_last_committed_row() {
    let mut view = RecordingView::new();
    let mut group = foo_bar_group();
    group.load(None, &foo_bar_rows(&["a"], &["b"]), &mut view);

    let flips = group.remove(0, &mut view).unwrap();
    assert!(flips.is_empty());
    assert!(group.is_empty());
    assert_eq!(group.pending().deletions().collect::<Vec<_>>(), vec![0]);
}

proptest! {
    /// Appending k rows and removing any k rows leaves nothing pending
    #[test]
    fn prop_append_then_remove_cancels(
        committed in 0usize..6,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..5),
    ) {
        let mut view = RecordingView::new();
        let mut group = foo_bar_group();
        let values: Vec<String> = (0..committed).map(|i| i.to_string()).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        group.load(None, &foo_bar_rows(&refs, &refs), &mut view);

        for _ in &picks {
            group.append(&mut view).unwrap();
        }
        for pick in &picks {
            let index = pick.index(group.len());
            group.remove(index, &mut view).unwrap();
        }

        prop_assert_eq!(group.len(), committed);
        prop_assert!(group.pending().is_empty());
    }

    /// Row indices always match positions
    #[test]
    fn prop_indices_match_positions(
        rows in 1usize..8,
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..8),
    ) {
        let mut view = RecordingView::new();
        let mut group = foo_bar_group();
        for _ in 0..rows {
            group.append(&mut view).unwrap();
        }
        for pick in removals {
            if group.is_empty() {
                break;
            }
            let index = pick.index(group.len());
            group.remove(index, &mut view).unwrap();
        }

        for (i, row) in group.rows().iter().enumerate() {
            prop_assert_eq!(row.index(), i);
        }
        prop_assert_eq!(view.live(), group.len());
    }
}
