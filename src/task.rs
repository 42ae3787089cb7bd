//! Task data structure and related functionality.
//!
//! This module defines the `Task` struct that represents a single card on a
//! project's board, along with the validation applied when tasks are created
//! or edited.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{BoardError, Result};
use crate::fields::{Priority, Status};
use crate::id::{MemberId, TaskId};

/// Minimum length of a task title after trimming.
pub const MIN_TITLE_LEN: usize = 3;

/// A work item owned by exactly one project.
///
/// `position` orders the task within its status column. Records written by
/// older versions carry no position and sort by creation time instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: Status,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, alias = "dueDate", skip_serializing_if = "Option::is_none")]
    pub due: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<MemberId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Create a new task in the `To Do` column with a fresh id.
    ///
    /// The position is left unset; the task store assigns one when the task
    /// is inserted.
    pub fn new(title: impl Into<String>) -> Self {
        Task {
            id: TaskId::generate(),
            title: title.into(),
            description: None,
            status: Status::Todo,
            priority: Priority::default(),
            due: None,
            assignee: None,
            position: None,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.description = Some(description).filter(|d| !d.trim().is_empty());
        self
    }

    pub fn with_due(mut self, due: Option<DateTime<Utc>>) -> Self {
        self.due = due;
        self
    }

    pub fn with_assignee(mut self, assignee: Option<MemberId>) -> Self {
        self.assignee = assignee;
        self
    }

    /// Stamp the last-updated time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = Some(now);
    }

    pub fn is_done(&self) -> bool {
        self.status == Status::Done
    }
}

/// Validate a task title: required and at least three characters long.
pub fn validate_title(title: &str) -> Result<()> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(BoardError::validation("Task title is required"));
    }
    if trimmed.chars().count() < MIN_TITLE_LEN {
        return Err(BoardError::validation(format!(
            "Task title must be at least {MIN_TITLE_LEN} characters"
        )));
    }
    Ok(())
}

/// Validate a due date: it may not fall before the start of `today`.
pub fn validate_due(due: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Result<()> {
    if let Some(due) = due {
        if due.date_naive() < now.date_naive() {
            return Err(BoardError::validation("Due date cannot be in the past"));
        }
    }
    Ok(())
}
