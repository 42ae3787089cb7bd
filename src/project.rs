//! Projects and team members.
//!
//! A project owns its tasks through a [`TaskStore`] and keeps its own ordered
//! copy of the team members working on it. Assignees are stored by member id
//! and resolved against that list when displayed.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::board::TaskStore;
use crate::error::{BoardError, Result};
use crate::fields::{ProjectStatus, Status};
use crate::id::{MemberId, ProjectId};
use crate::task::Task;

/// Minimum length of a project name after trimming.
pub const MIN_NAME_LEN: usize = 3;

/// A deadline this close (or closer) is flagged as soon.
pub const DEADLINE_SOON_DAYS: i64 = 2;

/// A person who can be assigned tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    pub id: MemberId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl TeamMember {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        TeamMember {
            id: MemberId::generate(),
            name: name.into(),
            email: email.into(),
            avatar: None,
        }
    }

    /// Up to two initials, used where there is no room for the full name.
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .take(2)
            .collect::<String>()
            .to_uppercase()
    }
}

/// A project with its team and task board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default)]
    pub tasks: TaskStore,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Project {
    /// Create an empty, active project after validating its name.
    pub fn new(name: &str, description: &str) -> Result<Self> {
        validate_name(name)?;
        Ok(Project {
            id: ProjectId::generate(),
            name: name.trim().to_string(),
            description: description.trim().to_string(),
            status: ProjectStatus::Active,
            team_members: Vec::new(),
            tasks: TaskStore::default(),
            created_at: Utc::now(),
            updated_at: None,
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }

    /// Add a member to the project team. Adding an existing member is a no-op.
    pub fn add_member(&mut self, member: TeamMember) -> bool {
        if self.team_members.iter().any(|m| m.id == member.id) {
            return false;
        }
        self.team_members.push(member);
        true
    }

    /// Remove a member from the team. Tasks keep their (now stale) assignee
    /// reference; it renders as unassigned.
    pub fn remove_member(&mut self, id: &MemberId) -> Result<TeamMember> {
        let index = self
            .team_members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| BoardError::MemberNotFound {
                identifier: id.to_string(),
            })?;
        Ok(self.team_members.remove(index))
    }

    /// Resolve a task's assignee. A reference to someone no longer on the
    /// team resolves to `None`.
    pub fn assignee_of(&self, task: &Task) -> Option<&TeamMember> {
        let id = task.assignee.as_ref()?;
        self.team_members.iter().find(|m| &m.id == id)
    }

    /// Check that `assignee` is on this project's team.
    pub fn check_assignee(&self, assignee: Option<&MemberId>) -> Result<()> {
        match assignee {
            Some(id) if !self.team_members.iter().any(|m| &m.id == id) => {
                Err(BoardError::MemberNotFound {
                    identifier: id.to_string(),
                })
            }
            _ => Ok(()),
        }
    }

    pub fn done_count(&self) -> usize {
        self.tasks.tasks().iter().filter(|t| t.status == Status::Done).count()
    }

    /// Percentage of tasks that are done, 0 for an empty project.
    pub fn progress(&self) -> f64 {
        let total = self.tasks.len();
        if total == 0 {
            return 0.0;
        }
        self.done_count() as f64 / total as f64 * 100.0
    }

    /// Earliest due date among open tasks that has not already passed.
    pub fn next_deadline(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.tasks
            .tasks()
            .iter()
            .filter(|t| !t.is_done())
            .filter_map(|t| t.due)
            .filter(|due| *due >= now)
            .min()
    }
}

/// Validate a project name: required and at least three characters long.
pub fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(BoardError::validation("Project name is required"));
    }
    if trimmed.chars().count() < MIN_NAME_LEN {
        return Err(BoardError::validation(format!(
            "Project name must be at least {MIN_NAME_LEN} characters"
        )));
    }
    Ok(())
}

/// True when `deadline` falls within the next [`DEADLINE_SOON_DAYS`] days.
pub fn is_deadline_soon(deadline: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    deadline >= now && deadline - now <= Duration::days(DEADLINE_SOON_DAYS)
}
