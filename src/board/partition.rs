//! Column partitioning: the ordered subsequence of tasks in one status column.

use std::cmp::Ordering;

use crate::fields::Status;
use crate::task::Task;

/// Ordering used inside a column.
///
/// Positioned tasks come first in ascending position. Tasks without a
/// position follow. Equal or missing positions fall back to creation time and
/// finally to the id so the order is total.
pub fn column_order(a: &Task, b: &Task) -> Ordering {
    let by_position = match (a.position, b.position) {
        (Some(pa), Some(pb)) => pa.cmp(&pb),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    };
    by_position
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

/// Tasks whose status is `column`, in on-screen top-to-bottom order.
pub fn partition(tasks: &[Task], column: Status) -> Vec<&Task> {
    let mut out: Vec<&Task> = tasks.iter().filter(|t| t.status == column).collect();
    out.sort_by(|a, b| column_order(a, b));
    out
}

/// Number of tasks in each column, indexed by `Status::index`.
pub fn column_counts(tasks: &[Task]) -> [usize; 4] {
    let mut counts = [0; 4];
    for task in tasks {
        counts[task.status.index()] += 1;
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn task(id: &str, status: Status, position: Option<u32>, minute: i64) -> Task {
        let mut t = Task::new(format!("Task {id}"));
        t.id = id.into();
        t.status = status;
        t.position = position;
        t.created_at = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap() + Duration::minutes(minute);
        t
    }

    fn ids(tasks: &[&Task]) -> Vec<String> {
        tasks.iter().map(|t| t.id.to_string()).collect()
    }

    #[test]
    fn test_partition_filters_and_sorts_by_position() {
        let tasks = vec![
            task("c", Status::Todo, Some(2), 0),
            task("x", Status::Done, Some(0), 0),
            task("a", Status::Todo, Some(0), 5),
            task("b", Status::Todo, Some(1), 1),
        ];
        assert_eq!(ids(&partition(&tasks, Status::Todo)), vec!["a", "b", "c"]);
        assert_eq!(ids(&partition(&tasks, Status::Done)), vec!["x"]);
        assert!(partition(&tasks, Status::Review).is_empty());
    }

    #[test]
    fn test_equal_positions_tie_break_by_creation_time() {
        let tasks = vec![
            task("late", Status::Review, Some(1), 30),
            task("early", Status::Review, Some(1), 10),
            task("first", Status::Review, Some(0), 50),
        ];
        assert_eq!(
            ids(&partition(&tasks, Status::Review)),
            vec!["first", "early", "late"]
        );
    }

    #[test]
    fn test_missing_positions_follow_positioned_tasks_by_creation_time() {
        let tasks = vec![
            task("legacy-2", Status::Todo, None, 20),
            task("legacy-1", Status::Todo, None, 10),
            task("placed", Status::Todo, Some(7), 99),
        ];
        assert_eq!(
            ids(&partition(&tasks, Status::Todo)),
            vec!["placed", "legacy-1", "legacy-2"]
        );
    }

    #[test]
    fn test_partition_is_deterministic_across_calls() {
        let tasks = vec![
            task("b", Status::Todo, None, 0),
            task("a", Status::Todo, None, 0),
            task("c", Status::Todo, Some(0), 0),
        ];
        let first = ids(&partition(&tasks, Status::Todo));
        for _ in 0..10 {
            assert_eq!(ids(&partition(&tasks, Status::Todo)), first);
        }
        assert_eq!(first, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_column_counts() {
        let tasks = vec![
            task("a", Status::Todo, None, 0),
            task("b", Status::Todo, None, 0),
            task("c", Status::Done, None, 0),
        ];
        assert_eq!(column_counts(&tasks), [2, 0, 0, 1]);
    }
}
