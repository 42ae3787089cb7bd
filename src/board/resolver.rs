//! Drop-position resolution for drag gestures.
//!
//! A gesture is described by plain values (what the pointer is over, its row,
//! and the on-screen rows of the column's cards) so resolution never has to
//! ask the terminal or any other renderer where things are.

use crate::fields::Status;
use crate::id::TaskId;
use crate::task::Task;

/// What the gesture is currently over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropTarget {
    /// Outside every column.
    Outside,
    /// A column's body, not a specific card.
    Column(Status),
    /// A specific card.
    Task(TaskId),
    /// An explicit insertion slot, used by keyboard drags.
    Slot { column: Status, index: usize },
}

/// Vertical extent of one rendered card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardBounds {
    pub task_id: TaskId,
    pub top: i32,
    pub height: i32,
}

impl CardBounds {
    pub fn new(task_id: TaskId, top: i32, height: i32) -> Self {
        CardBounds {
            task_id,
            top,
            height,
        }
    }

    /// True when `y` lies strictly above the card's vertical midpoint.
    fn pointer_above_midpoint(&self, y: i32) -> bool {
        2 * y < 2 * self.top + self.height
    }
}

/// A snapshot of a pointer or keyboard drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Gesture {
    pub target: DropTarget,
    /// Pointer row, when the input device has one.
    pub pointer_y: Option<i32>,
    /// Bounds of the target column's cards, top to bottom.
    pub cards: Vec<CardBounds>,
}

impl Gesture {
    pub fn new(target: DropTarget) -> Self {
        Gesture {
            target,
            pointer_y: None,
            cards: Vec::new(),
        }
    }

    pub fn outside() -> Self {
        Self::new(DropTarget::Outside)
    }

    pub fn over_column(column: Status) -> Self {
        Self::new(DropTarget::Column(column))
    }

    pub fn over_task(task_id: impl Into<TaskId>) -> Self {
        Self::new(DropTarget::Task(task_id.into()))
    }

    pub fn slot(column: Status, index: usize) -> Self {
        Self::new(DropTarget::Slot { column, index })
    }

    pub fn at(mut self, pointer_y: i32) -> Self {
        self.pointer_y = Some(pointer_y);
        self
    }

    pub fn with_cards(mut self, cards: Vec<CardBounds>) -> Self {
        self.cards = cards;
        self
    }

    fn bounds_of(&self, id: &TaskId) -> Option<&CardBounds> {
        self.cards.iter().find(|b| &b.task_id == id)
    }
}

/// Result of resolving a gesture against a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Insert at this index of the column, the dragged task excluded.
    Index(usize),
    /// The pointer is over the dragged task inside its origin column.
    Suppressed,
    /// The gesture is not over any column.
    NoTarget,
}

/// The task being dragged and the column it was picked up from.
#[derive(Debug, Clone, Copy)]
pub struct Dragged<'a> {
    pub task_id: &'a TaskId,
    pub origin: Status,
}

/// Column a gesture points into, looking task targets up in `tasks`.
pub fn target_column(gesture: &Gesture, tasks: &[Task]) -> Option<Status> {
    match &gesture.target {
        DropTarget::Outside => None,
        DropTarget::Column(column) => Some(*column),
        DropTarget::Slot { column, .. } => Some(*column),
        DropTarget::Task(id) => tasks.iter().find(|t| &t.id == id).map(|t| t.status),
    }
}

/// Resolve the insertion index inside `column`, the target column's tasks in
/// on-screen order.
///
/// The dragged task is removed from `column` before any index is computed,
/// so the result is the index the task will occupy after the drop.
pub fn resolve(gesture: &Gesture, column: &[&Task], dragged: Option<Dragged<'_>>) -> Resolution {
    if gesture.target == DropTarget::Outside {
        return Resolution::NoTarget;
    }

    if let (DropTarget::Task(over), Some(dragged)) = (&gesture.target, dragged) {
        let still_home = column
            .iter()
            .any(|t| &t.id == over && t.status == dragged.origin);
        if over == dragged.task_id && still_home {
            return Resolution::Suppressed;
        }
    }

    let siblings: Vec<&Task> = column
        .iter()
        .copied()
        .filter(|t| dragged.map_or(true, |d| &t.id != d.task_id))
        .collect();

    if siblings.is_empty() {
        return Resolution::Index(0);
    }

    let index = match &gesture.target {
        DropTarget::Outside => return Resolution::NoTarget,
        DropTarget::Slot { index, .. } => (*index).min(siblings.len()),
        DropTarget::Column(_) => match gesture.pointer_y {
            Some(y) => siblings
                .iter()
                .position(|t| gesture.bounds_of(&t.id).is_some_and(|b| b.pointer_above_midpoint(y)))
                .unwrap_or(siblings.len()),
            None => siblings.len(),
        },
        DropTarget::Task(over) => match siblings.iter().position(|t| &t.id == over) {
            Some(i) => match (gesture.pointer_y, gesture.bounds_of(over)) {
                (Some(y), Some(bounds)) if !bounds.pointer_above_midpoint(y) => i + 1,
                _ => i,
            },
            None => siblings.len(),
        },
    };
    Resolution::Index(index)
}
