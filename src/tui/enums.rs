//! Enumerations for board state management.

use crate::id::TaskId;

/// What the board is showing on top of the columns.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mode {
    Board,
    Detail,
    AddTask,
    ConfirmDelete(TaskId),
    Help,
}

/// Which input device started the current drag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragInput {
    Keyboard,
    Mouse,
}
