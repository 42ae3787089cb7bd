//! Drag session controller.
//!
//! Tracks one drag gesture from pick-up to release. Hovering only updates
//! transient state; the task store is touched exactly once, when a drop
//! lands on a column.

use tracing::{debug, info, warn};

use crate::board::resolver::{resolve, target_column, Dragged, Gesture, Resolution};
use crate::board::store::TaskStore;
use crate::error::{BoardError, Result};
use crate::fields::Status;
use crate::id::TaskId;

/// Live insertion point while dragging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hover {
    pub column: Status,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveDrag {
    pub task_id: TaskId,
    pub origin: Status,
    pub hover: Option<Hover>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DragState {
    #[default]
    Idle,
    Dragging(ActiveDrag),
}

/// What a finished gesture did to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropOutcome {
    /// The task now sits at `index` of `column`.
    Moved {
        task_id: TaskId,
        column: Status,
        index: usize,
    },
    /// Dropped where it already was.
    Unchanged,
    /// Released outside every column, cancelled, or no drag was active.
    Discarded,
}

#[derive(Debug, Default)]
pub struct DragSession {
    state: DragState,
}

impl DragSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &DragState {
        &self.state
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.state, DragState::Dragging(_))
    }

    pub fn active(&self) -> Option<&ActiveDrag> {
        match &self.state {
            DragState::Dragging(active) => Some(active),
            DragState::Idle => None,
        }
    }

    pub fn hover(&self) -> Option<Hover> {
        self.active().and_then(|a| a.hover)
    }

    /// Pick up a task. Only valid from `Idle`; a second start while a drag is
    /// in progress is ignored.
    pub fn on_drag_start(&mut self, store: &TaskStore, task_id: &TaskId) -> Result<()> {
        if let DragState::Dragging(active) = &self.state {
            warn!(active = %active.task_id, requested = %task_id, "drag already in progress, ignoring start");
            return Ok(());
        }
        let task = store
            .get(task_id)
            .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
        debug!(task = %task_id, origin = task.status.id(), "drag started");
        self.state = DragState::Dragging(ActiveDrag {
            task_id: task_id.clone(),
            origin: task.status,
            hover: None,
        });
        Ok(())
    }

    /// Update the live insertion point. The store is not modified.
    pub fn on_drag_over(&mut self, store: &TaskStore, gesture: &Gesture) -> Option<Hover> {
        let DragState::Dragging(active) = &mut self.state else {
            return None;
        };
        match resolve_against(store, gesture, active) {
            (Some(column), Resolution::Index(index)) => {
                active.hover = Some(Hover { column, index });
            }
            (_, Resolution::Suppressed) => {}
            _ => active.hover = None,
        }
        active.hover
    }

    /// Finish the gesture. The session is back to `Idle` afterwards whatever
    /// the outcome.
    ///
    /// The insertion index is recomputed from the store as it is now, so a
    /// hover computed against older contents cannot misplace the task.
    pub fn on_drag_end(&mut self, store: &mut TaskStore, gesture: &Gesture) -> Result<DropOutcome> {
        let DragState::Dragging(active) = std::mem::take(&mut self.state) else {
            return Ok(DropOutcome::Discarded);
        };

        let (column, index) = match resolve_against(store, gesture, &active) {
            (Some(column), Resolution::Index(index)) => (column, index),
            (_, Resolution::Suppressed) => {
                debug!(task = %active.task_id, "dropped onto itself");
                return Ok(DropOutcome::Unchanged);
            }
            _ => {
                debug!(task = %active.task_id, "dropped outside any column");
                return Ok(DropOutcome::Discarded);
            }
        };

        if !store.move_task(&active.task_id, column, index)? {
            return Ok(DropOutcome::Unchanged);
        }
        let index = store
            .partition(column)
            .iter()
            .position(|t| t.id == active.task_id)
            .unwrap_or(index);
        info!(
            task = %active.task_id,
            from = active.origin.id(),
            to = column.id(),
            index,
            "drop committed"
        );
        Ok(DropOutcome::Moved {
            task_id: active.task_id,
            column,
            index,
        })
    }

    /// Abandon the gesture without touching the store.
    pub fn cancel(&mut self) {
        if let DragState::Dragging(active) = std::mem::take(&mut self.state) {
            debug!(task = %active.task_id, "drag cancelled");
        }
    }
}

fn resolve_against(store: &TaskStore, gesture: &Gesture, active: &ActiveDrag) -> (Option<Status>, Resolution) {
    let Some(column) = target_column(gesture, store.tasks()) else {
        return (None, Resolution::NoTarget);
    };
    let tasks = store.partition(column);
    let dragged = Dragged {
        task_id: &active.task_id,
        origin: active.origin,
    };
    (Some(column), resolve(gesture, &tasks, Some(dragged)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::resolver::CardBounds;
    use crate::task::Task;

    fn store_with(columns: &[(Status, &[&str])]) -> TaskStore {
        let mut store = TaskStore::default();
        for (status, ids) in columns {
            for id in *ids {
                let mut task = Task::new(format!("Task {id}")).with_status(*status);
                task.id = (*id).into();
                store.insert(task);
            }
        }
        store
    }

    fn order(store: &TaskStore, column: Status) -> Vec<String> {
        store
            .partition(column)
            .iter()
            .map(|t| t.id.to_string())
            .collect()
    }

    #[test]
    fn test_start_requires_known_task() {
        let store = store_with(&[(Status::Todo, &["a"])]);
        let mut session = DragSession::new();
        assert!(session.on_drag_start(&store, &"zzz".into()).is_err());
        assert_eq!(session.state(), &DragState::Idle);

        session.on_drag_start(&store, &"a".into()).unwrap();
        let active = session.active().unwrap();
        assert_eq!(active.origin, Status::Todo);
        assert!(active.hover.is_none());
    }

    #[test]
    fn test_second_start_is_ignored() {
        let store = store_with(&[(Status::Todo, &["a", "b"])]);
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"a".into()).unwrap();
        session.on_drag_start(&store, &"b".into()).unwrap();
        assert_eq!(session.active().unwrap().task_id, "a".into());
    }

    #[test]
    fn test_drag_over_updates_hover_without_touching_store() {
        let store = store_with(&[(Status::Todo, &["a"]), (Status::Review, &["r1", "r2"])]);
        let before = store.clone();
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"a".into()).unwrap();

        let hover = session.on_drag_over(&store, &Gesture::over_task("r2"));
        assert_eq!(
            hover,
            Some(Hover {
                column: Status::Review,
                index: 1
            })
        );
        assert_eq!(store, before);

        assert_eq!(session.on_drag_over(&store, &Gesture::outside()), None);
        assert!(session.is_dragging());
    }

    #[test]
    fn test_hover_over_self_keeps_previous_hover() {
        let store = store_with(&[(Status::Todo, &["a", "b", "c"])]);
        let cards = vec![
            CardBounds::new("a".into(), 0, 4),
            CardBounds::new("b".into(), 4, 4),
            CardBounds::new("c".into(), 8, 4),
        ];
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"b".into()).unwrap();
        session.on_drag_over(&store, &Gesture::over_task("c").at(11).with_cards(cards.clone()));
        let hover = session.on_drag_over(&store, &Gesture::over_task("b").at(5).with_cards(cards));
        assert_eq!(
            hover,
            Some(Hover {
                column: Status::Todo,
                index: 2
            })
        );
    }

    #[test]
    fn test_drop_commits_once_and_returns_to_idle() {
        let mut store = store_with(&[(Status::Review, &["x", "y"]), (Status::Done, &["z"])]);
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"x".into()).unwrap();
        session.on_drag_over(&store, &Gesture::over_column(Status::Done));

        let outcome = session
            .on_drag_end(&mut store, &Gesture::over_column(Status::Done))
            .unwrap();
        assert_eq!(
            outcome,
            DropOutcome::Moved {
                task_id: "x".into(),
                column: Status::Done,
                index: 1
            }
        );
        assert_eq!(order(&store, Status::Review), vec!["y"]);
        assert_eq!(order(&store, Status::Done), vec!["z", "x"]);
        assert_eq!(session.state(), &DragState::Idle);
        assert!(session.hover().is_none());
    }

    #[test]
    fn test_drop_outside_discards_without_mutation() {
        let mut store = store_with(&[(Status::Todo, &["a", "b"])]);
        let before = store.clone();
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"a".into()).unwrap();
        session.on_drag_over(&store, &Gesture::over_column(Status::Done));

        let outcome = session.on_drag_end(&mut store, &Gesture::outside()).unwrap();
        assert_eq!(outcome, DropOutcome::Discarded);
        assert_eq!(store, before);
        assert!(!session.is_dragging());
    }

    #[test]
    fn test_drop_onto_itself_is_unchanged() {
        let mut store = store_with(&[(Status::Todo, &["a", "b"])]);
        let before = store.clone();
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"a".into()).unwrap();
        let outcome = session
            .on_drag_end(&mut store, &Gesture::over_task("a"))
            .unwrap();
        assert_eq!(outcome, DropOutcome::Unchanged);
        assert_eq!(store, before);
    }

    #[test]
    fn test_keyboard_slot_drop_reorders_within_column() {
        let mut store = store_with(&[(Status::Todo, &["a", "b", "c"])]);
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"c".into()).unwrap();
        let outcome = session
            .on_drag_end(&mut store, &Gesture::slot(Status::Todo, 0))
            .unwrap();
        assert!(matches!(outcome, DropOutcome::Moved { index: 0, .. }));
        assert_eq!(order(&store, Status::Todo), vec!["c", "a", "b"]);
    }

    #[test]
    fn test_drop_index_is_recomputed_against_live_store() {
        let mut store = store_with(&[(Status::Todo, &["a"]), (Status::Done, &["d1", "d2"])]);
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"a".into()).unwrap();
        session.on_drag_over(&store, &Gesture::over_column(Status::Done));
        assert_eq!(session.hover().unwrap().index, 2);

        // The destination shrinks mid-gesture.
        store.remove(&"d2".into()).unwrap();
        let outcome = session
            .on_drag_end(&mut store, &Gesture::over_column(Status::Done))
            .unwrap();
        assert!(matches!(outcome, DropOutcome::Moved { index: 1, .. }));
        assert_eq!(order(&store, Status::Done), vec!["d1", "a"]);
    }

    #[test]
    fn test_end_without_session_is_discarded() {
        let mut store = store_with(&[(Status::Todo, &["a"])]);
        let mut session = DragSession::new();
        let outcome = session
            .on_drag_end(&mut store, &Gesture::over_column(Status::Done))
            .unwrap();
        assert_eq!(outcome, DropOutcome::Discarded);
    }

    #[test]
    fn test_cancel_clears_state() {
        let store = store_with(&[(Status::Todo, &["a"])]);
        let mut session = DragSession::new();
        session.on_drag_start(&store, &"a".into()).unwrap();
        session.on_drag_over(&store, &Gesture::over_column(Status::Review));
        session.cancel();
        assert_eq!(session.state(), &DragState::Idle);
    }
}
