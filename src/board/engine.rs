//! Reorder and column-transition engine.
//!
//! Every mutation of a task's column or ordinal goes through [`apply`]. The
//! engine takes the full task collection and hands back the full replacement
//! collection; callers commit it to their store and persist it.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::board::partition::partition;
use crate::error::{BoardError, Result};
use crate::fields::Status;
use crate::id::TaskId;
use crate::task::Task;

/// Move `task_id` to `target` at `target_index`, stamping `updated_at` with
/// the current time on a cross-column move.
pub fn apply<'a>(
    tasks: &'a [Task],
    task_id: &TaskId,
    target: Status,
    target_index: usize,
) -> Result<Cow<'a, [Task]>> {
    apply_at(tasks, task_id, target, target_index, Utc::now())
}

/// [`apply`] with an explicit clock.
///
/// Returns `Cow::Borrowed(tasks)` when the move is a no-op. Only the source
/// and destination columns are renumbered; every other task is carried over
/// unchanged.
pub fn apply_at<'a>(
    tasks: &'a [Task],
    task_id: &TaskId,
    target: Status,
    target_index: usize,
    now: DateTime<Utc>,
) -> Result<Cow<'a, [Task]>> {
    let moving = tasks
        .iter()
        .find(|t| &t.id == task_id)
        .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
    let source = moving.status;

    if source == target {
        let order: Vec<&TaskId> = partition(tasks, source).into_iter().map(|t| &t.id).collect();
        let current = order.iter().position(|id| *id == task_id).unwrap_or(0);
        let index = target_index.min(order.len().saturating_sub(1));
        if index == current {
            debug!(task = %task_id, column = source.id(), index, "reorder is a no-op");
            return Ok(Cow::Borrowed(tasks));
        }

        let mut order = order;
        let id = order.remove(current);
        order.insert(index, id);
        debug!(task = %task_id, column = source.id(), from = current, to = index, "reordering task");
        return Ok(Cow::Owned(renumber(tasks, &[(source, &order)], None)));
    }

    let mut source_order: Vec<&TaskId> =
        partition(tasks, source).into_iter().map(|t| &t.id).collect();
    source_order.retain(|id| *id != task_id);

    let mut dest_order: Vec<&TaskId> =
        partition(tasks, target).into_iter().map(|t| &t.id).collect();
    let index = target_index.min(dest_order.len());
    dest_order.insert(index, task_id);

    debug!(
        task = %task_id,
        from = source.id(),
        to = target.id(),
        index,
        "moving task across columns"
    );
    let moved = Moved {
        task_id,
        status: target,
        now,
    };
    Ok(Cow::Owned(renumber(
        tasks,
        &[(source, &source_order), (target, &dest_order)],
        Some(moved),
    )))
}

/// Move `task_id` to the end of `target`. Used when a status is changed from
/// an edit form rather than by dragging. Same column is a no-op.
pub fn move_to_end<'a>(tasks: &'a [Task], task_id: &TaskId, target: Status) -> Result<Cow<'a, [Task]>> {
    let current = tasks
        .iter()
        .find(|t| &t.id == task_id)
        .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
    if current.status == target {
        return Ok(Cow::Borrowed(tasks));
    }
    apply(tasks, task_id, target, usize::MAX)
}

/// Shift a task `delta` slots up (negative) or down (positive) within its
/// own column.
pub fn shift<'a>(tasks: &'a [Task], task_id: &TaskId, delta: isize) -> Result<Cow<'a, [Task]>> {
    let task = tasks
        .iter()
        .find(|t| &t.id == task_id)
        .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
    let column = task.status;
    let current = partition(tasks, column)
        .iter()
        .position(|t| &t.id == task_id)
        .unwrap_or(0);
    let index = current.saturating_add_signed(delta);
    apply(tasks, task_id, column, index)
}

struct Moved<'a> {
    task_id: &'a TaskId,
    status: Status,
    now: DateTime<Utc>,
}

/// Build the replacement collection. Tasks listed in `columns` take their
/// index in that list as position; the moved task also takes its new status.
fn renumber(tasks: &[Task], columns: &[(Status, &Vec<&TaskId>)], moved: Option<Moved<'_>>) -> Vec<Task> {
    tasks
        .iter()
        .map(|task| {
            let mut task = task.clone();
            if let Some(m) = moved.as_ref().filter(|m| m.task_id == &task.id) {
                task.status = m.status;
                task.touch(m.now);
            }
            if let Some((_, order)) = columns.iter().find(|(status, _)| *status == task.status) {
                if let Some(index) = order.iter().position(|id| *id == &task.id) {
                    task.position = Some(index as u32);
                }
            }
            task
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap()
    }

    fn task(id: &str, status: Status, position: u32) -> Task {
        let mut t = Task::new(format!("Task {id}"));
        t.id = id.into();
        t.status = status;
        t.position = Some(position);
        t.created_at = now() - Duration::days(1);
        t
    }

    fn column(tasks: &[Task], status: Status) -> Vec<(String, u32)> {
        partition(tasks, status)
            .into_iter()
            .map(|t| (t.id.to_string(), t.position.unwrap_or(u32::MAX)))
            .collect()
    }

    fn pairs(items: &[(&str, u32)]) -> Vec<(String, u32)> {
        items.iter().map(|(id, p)| (id.to_string(), *p)).collect()
    }

    fn assert_dense(tasks: &[Task]) {
        for status in Status::ALL {
            let positions: Vec<u32> = partition(tasks, status)
                .iter()
                .map(|t| t.position.expect("position"))
                .collect();
            let expected: Vec<u32> = (0..positions.len() as u32).collect();
            assert_eq!(positions, expected, "column {status} is not dense");
        }
    }

    #[test]
    fn test_same_column_reorder_moves_task_up() {
        let tasks = vec![
            task("A", Status::Todo, 0),
            task("B", Status::Todo, 1),
            task("C", Status::Todo, 2),
        ];
        let out = apply_at(&tasks, &"B".into(), Status::Todo, 0, now()).unwrap();
        assert_eq!(
            column(&out, Status::Todo),
            pairs(&[("B", 0), ("A", 1), ("C", 2)])
        );
        assert_dense(&out);
    }

    #[test]
    fn test_same_column_reorder_clamps_to_last_slot() {
        let tasks = vec![
            task("A", Status::Review, 0),
            task("B", Status::Review, 1),
            task("C", Status::Review, 2),
        ];
        let out = apply_at(&tasks, &"A".into(), Status::Review, 99, now()).unwrap();
        assert_eq!(
            column(&out, Status::Review),
            pairs(&[("B", 0), ("C", 1), ("A", 2)])
        );
    }

    #[test]
    fn test_reorder_to_current_index_returns_input_unchanged() {
        let tasks = vec![task("A", Status::Todo, 0), task("B", Status::Todo, 1)];
        let out = apply_at(&tasks, &"B".into(), Status::Todo, 1, now()).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, tasks.as_slice());
    }

    #[test]
    fn test_same_column_reorder_does_not_stamp_updated_at() {
        let tasks = vec![task("A", Status::Todo, 0), task("B", Status::Todo, 1)];
        let out = apply_at(&tasks, &"B".into(), Status::Todo, 0, now()).unwrap();
        assert!(out.iter().all(|t| t.updated_at.is_none()));
    }

    #[test]
    fn test_move_into_empty_column_clamps_to_zero() {
        let tasks = vec![task("A", Status::Todo, 0)];
        let out = apply_at(&tasks, &"A".into(), Status::InProgress, 5, now()).unwrap();
        assert!(column(&out, Status::Todo).is_empty());
        assert_eq!(column(&out, Status::InProgress), pairs(&[("A", 0)]));
        assert_eq!(out[0].status, Status::InProgress);
        assert_eq!(out[0].updated_at, Some(now()));
    }

    #[test]
    fn test_cross_column_move_closes_and_opens_gaps() {
        let tasks = vec![
            task("X", Status::Review, 0),
            task("Y", Status::Review, 1),
            task("Z", Status::Done, 0),
        ];
        let out = apply_at(&tasks, &"X".into(), Status::Done, 1, now()).unwrap();
        assert_eq!(column(&out, Status::Review), pairs(&[("Y", 0)]));
        assert_eq!(column(&out, Status::Done), pairs(&[("Z", 0), ("X", 1)]));
        assert_dense(&out);
    }

    #[test]
    fn test_cross_column_move_leaves_other_columns_untouched() {
        let mut stray = task("S", Status::InProgress, 7);
        stray.updated_at = Some(now() - Duration::hours(3));
        let tasks = vec![
            task("A", Status::Todo, 0),
            stray.clone(),
            task("B", Status::Todo, 1),
            task("D", Status::Done, 0),
        ];
        let out = apply_at(&tasks, &"A".into(), Status::Done, 0, now()).unwrap();
        assert_eq!(out.len(), tasks.len());
        let kept = out.iter().find(|t| t.id.as_str() == "S").unwrap();
        assert_eq!(kept, &stray);
        assert_eq!(column(&out, Status::Done), pairs(&[("A", 0), ("D", 1)]));
        assert_eq!(column(&out, Status::Todo), pairs(&[("B", 0)]));
    }

    #[test]
    fn test_apply_renumbers_sparse_columns_densely() {
        let tasks = vec![
            task("A", Status::Todo, 3),
            task("B", Status::Todo, 10),
            task("C", Status::Todo, 42),
            task("D", Status::Done, 5),
        ];
        let out = apply_at(&tasks, &"C".into(), Status::Done, 0, now()).unwrap();
        assert_dense(&out);
    }

    #[test]
    fn test_unknown_task_is_an_error_and_input_is_untouched() {
        let tasks = vec![task("A", Status::Todo, 0)];
        let snapshot = tasks.clone();
        let err = apply_at(&tasks, &"nonexistent-id".into(), Status::Done, 0, now()).unwrap_err();
        assert!(matches!(err, BoardError::TaskNotFound { ref id } if id == "nonexistent-id"));
        assert_eq!(tasks, snapshot);
    }

    #[test]
    fn test_move_to_end_appends_to_destination() {
        let tasks = vec![
            task("A", Status::Todo, 0),
            task("B", Status::Review, 0),
            task("C", Status::Review, 1),
        ];
        let out = move_to_end(&tasks, &"A".into(), Status::Review).unwrap();
        assert_eq!(
            column(&out, Status::Review),
            pairs(&[("B", 0), ("C", 1), ("A", 2)])
        );
        let same = move_to_end(&tasks, &"B".into(), Status::Review).unwrap();
        assert!(matches!(same, Cow::Borrowed(_)));
    }

    #[test]
    fn test_shift_moves_one_slot_and_stops_at_edges() {
        let tasks = vec![task("A", Status::Todo, 0), task("B", Status::Todo, 1)];
        let down = shift(&tasks, &"A".into(), 1).unwrap();
        assert_eq!(column(&down, Status::Todo), pairs(&[("B", 0), ("A", 1)]));
        let up_at_top = shift(&tasks, &"A".into(), -1).unwrap();
        assert!(matches!(up_at_top, Cow::Borrowed(_)));
    }

    #[test]
    fn test_every_move_keeps_columns_dense() {
        let tasks = vec![
            task("a", Status::Todo, 0),
            task("b", Status::Todo, 1),
            task("c", Status::InProgress, 0),
            task("d", Status::Review, 0),
            task("e", Status::Done, 0),
        ];
        for id in ["a", "b", "c", "d", "e"] {
            for status in Status::ALL {
                for index in 0..4 {
                    let out = apply_at(&tasks, &id.into(), status, index, now()).unwrap();
                    assert_eq!(out.len(), tasks.len());
                    assert_dense(&out);
                }
            }
        }
    }

    #[test]
    fn test_moves_renumber_columns_with_missing_positions() {
        let mut loose = task("b", Status::Todo, 0);
        loose.position = None;
        let mut legacy = task("r", Status::Review, 0);
        legacy.position = None;
        let tasks = vec![task("a", Status::Todo, 0), loose, task("c", Status::Todo, 4), legacy];
        assert_eq!(
            column(&tasks, Status::Todo),
            pairs(&[("a", 0), ("c", 4), ("b", u32::MAX)])
        );

        let out = apply_at(&tasks, &"b".into(), Status::Todo, 0, now()).unwrap();
        assert_eq!(
            column(&out, Status::Todo),
            pairs(&[("b", 0), ("a", 1), ("c", 2)])
        );

        let out = apply_at(&tasks, &"a".into(), Status::Review, 0, now()).unwrap();
        assert_eq!(column(&out, Status::Todo), pairs(&[("c", 0), ("b", 1)]));
        assert_eq!(column(&out, Status::Review), pairs(&[("a", 0), ("r", 1)]));
        assert_dense(&out);
    }
}
