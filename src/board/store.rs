//! In-memory task store for one project.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::board::engine;
use crate::board::partition::partition;
use crate::error::{BoardError, Result};
use crate::fields::Status;
use crate::id::TaskId;
use crate::task::Task;

/// The tasks of a single project, in insertion order.
///
/// Serializes as a plain list so the data file stays a list of task records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskStore {
    tasks: Vec<Task>,
}

impl TaskStore {
    pub fn new(tasks: Vec<Task>) -> Self {
        TaskStore { tasks }
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Replace the whole collection.
    pub fn replace(&mut self, tasks: Vec<Task>) {
        self.tasks = tasks;
    }

    pub fn into_tasks(self) -> Vec<Task> {
        self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| &t.id == id)
    }

    pub fn get_mut(&mut self, id: &TaskId) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| &t.id == id)
    }

    pub fn partition(&self, column: Status) -> Vec<&Task> {
        partition(&self.tasks, column)
    }

    /// Append `task` to the end of its column and return its id.
    ///
    /// The column is renumbered first, so tasks without a position or with
    /// gaps between positions still sort ahead of the new one.
    pub fn insert(&mut self, mut task: Task) -> TaskId {
        let end = self.renumber(task.status) as u32;
        task.position = Some(end);
        debug!(task = %task.id, column = task.status.id(), position = end, "inserting task");
        let id = task.id.clone();
        self.tasks.push(task);
        id
    }

    /// Remove a task and close the gap it leaves in its column. Other
    /// columns keep their positions.
    pub fn remove(&mut self, id: &TaskId) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|t| &t.id == id)
            .ok_or_else(|| BoardError::task_not_found(id.as_str()))?;
        let removed = self.tasks.remove(index);
        self.renumber(removed.status);
        debug!(task = %id, column = removed.status.id(), "removed task");
        Ok(removed)
    }

    /// Give a column dense positions `0..n` in its current order. Returns `n`.
    fn renumber(&mut self, column: Status) -> usize {
        let order: Vec<TaskId> = self.partition(column).into_iter().map(|t| t.id.clone()).collect();
        for (position, sibling) in order.iter().enumerate() {
            if let Some(task) = self.get_mut(sibling) {
                task.position = Some(position as u32);
            }
        }
        order.len()
    }

    /// Move a task through the engine and install the result. Returns
    /// false when the move was a no-op.
    pub fn move_task(&mut self, id: &TaskId, column: Status, index: usize) -> Result<bool> {
        let next = match engine::apply(&self.tasks, id, column, index)? {
            Cow::Borrowed(_) => return Ok(false),
            Cow::Owned(tasks) => tasks,
        };
        self.tasks = next;
        Ok(true)
    }

    /// Change a task's column from outside a drag, appending it to the end.
    pub fn move_to_end(&mut self, id: &TaskId, column: Status) -> Result<bool> {
        let next = match engine::move_to_end(&self.tasks, id, column)? {
            Cow::Borrowed(_) => return Ok(false),
            Cow::Owned(tasks) => tasks,
        };
        self.tasks = next;
        Ok(true)
    }

    /// Shift a task up or down within its column.
    pub fn shift(&mut self, id: &TaskId, delta: isize) -> Result<bool> {
        let next = match engine::shift(&self.tasks, id, delta)? {
            Cow::Borrowed(_) => return Ok(false),
            Cow::Owned(tasks) => tasks,
        };
        self.tasks = next;
        Ok(true)
    }
}

impl From<Vec<Task>> for TaskStore {
    fn from(tasks: Vec<Task>) -> Self {
        TaskStore::new(tasks)
    }
}
