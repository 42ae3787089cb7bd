//! The data file and helpers shared by the CLI and the board.
//!
//! `Database` is the whole persisted state: every project (each owning its
//! tasks), the global team roster, and the active project. It is read and
//! rewritten in one piece.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{BoardError, Result};
use crate::id::{MemberId, ProjectId, TaskId};
use crate::project::{Project, TeamMember};
use crate::task::Task;

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Database {
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub team_members: Vec<TeamMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_project: Option<ProjectId>,
}

impl Database {
    /// Load the data file. A missing file is an empty database.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "no data file yet, starting empty");
            return Ok(Database::default());
        }
        let data = fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Database::default());
        }
        let db: Database = serde_json::from_str(&data)?;
        debug!(path = %path.display(), projects = db.projects.len(), "loaded data file");
        Ok(db)
    }

    /// Write the data file via a temp file and rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        let data = serde_json::to_string_pretty(self)?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.flush()?;
        fs::rename(&tmp, path)?;
        Ok(())
    }

    /// Save, logging a failure instead of returning it. In-memory state is
    /// kept either way. Returns false when the write failed.
    pub fn save_or_warn(&self, path: &Path) -> bool {
        match self.save(path) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to save data file");
                false
            }
        }
    }

    pub fn project(&self, id: &ProjectId) -> Option<&Project> {
        self.projects.iter().find(|p| &p.id == id)
    }

    pub fn project_mut(&mut self, id: &ProjectId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| &p.id == id)
    }

    pub fn member(&self, id: &MemberId) -> Option<&TeamMember> {
        self.team_members.iter().find(|m| &m.id == id)
    }

    /// The active project, falling back to the first one.
    pub fn active(&self) -> Option<&Project> {
        self.active_project
            .as_ref()
            .and_then(|id| self.project(id))
            .or_else(|| self.projects.first())
    }

    pub fn add_project(&mut self, project: Project) -> ProjectId {
        let id = project.id.clone();
        if self.active_project.is_none() {
            self.active_project = Some(id.clone());
        }
        self.projects.push(project);
        id
    }

    /// Delete a project and everything it owns.
    pub fn remove_project(&mut self, id: &ProjectId) -> Result<Project> {
        let index = self
            .projects
            .iter()
            .position(|p| &p.id == id)
            .ok_or_else(|| BoardError::ProjectNotFound {
                identifier: id.to_string(),
            })?;
        let removed = self.projects.remove(index);
        if self.active_project.as_ref() == Some(id) {
            self.active_project = self.projects.first().map(|p| p.id.clone());
        }
        Ok(removed)
    }

    /// Remove a member from the roster and from every project team.
    pub fn remove_member(&mut self, id: &MemberId) -> Result<TeamMember> {
        let index = self
            .team_members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| BoardError::MemberNotFound {
                identifier: id.to_string(),
            })?;
        for project in &mut self.projects {
            project.team_members.retain(|m| &m.id != id);
        }
        Ok(self.team_members.remove(index))
    }

    /// Find the project owning a task.
    pub fn project_of_task(&self, id: &TaskId) -> Option<&Project> {
        self.projects.iter().find(|p| p.tasks.get(id).is_some())
    }

    pub fn project_of_task_mut(&mut self, id: &TaskId) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.tasks.get(id).is_some())
    }

    /// Resolve a project by id, id prefix, or case-insensitive name.
    pub fn resolve_project(&self, identifier: &str) -> Result<ProjectId> {
        let found = resolve_identifier(
            identifier,
            &self.projects,
            |p| p.id.as_str(),
            |p| p.name.as_str(),
        );
        match found {
            Lookup::One(p) => Ok(p.id.clone()),
            Lookup::None => Err(BoardError::ProjectNotFound {
                identifier: identifier.to_string(),
            }),
            Lookup::Many(matches) => Err(BoardError::Ambiguous {
                kind: "project",
                identifier: identifier.to_string(),
                candidates: candidate_lines(matches.iter().map(|p| (p.id.short(), p.name.as_str()))),
            }),
        }
    }

    /// Resolve a roster member by id, id prefix, name, or email.
    pub fn resolve_member(&self, identifier: &str) -> Result<MemberId> {
        if let Some(m) = self
            .team_members
            .iter()
            .find(|m| m.email.eq_ignore_ascii_case(identifier.trim()))
        {
            return Ok(m.id.clone());
        }
        let found = resolve_identifier(
            identifier,
            &self.team_members,
            |m| m.id.as_str(),
            |m| m.name.as_str(),
        );
        match found {
            Lookup::One(m) => Ok(m.id.clone()),
            Lookup::None => Err(BoardError::MemberNotFound {
                identifier: identifier.to_string(),
            }),
            Lookup::Many(matches) => Err(BoardError::Ambiguous {
                kind: "team member",
                identifier: identifier.to_string(),
                candidates: candidate_lines(matches.iter().map(|m| (m.id.short(), m.name.as_str()))),
            }),
        }
    }

    /// Resolve a task across all projects (or just `within`).
    pub fn resolve_task(&self, identifier: &str, within: Option<&ProjectId>) -> Result<TaskId> {
        let tasks: Vec<&Task> = self
            .projects
            .iter()
            .filter(|p| within.map_or(true, |id| &p.id == id))
            .flat_map(|p| p.tasks.tasks())
            .collect();
        match resolve_identifier(identifier, &tasks, |t| t.id.as_str(), |t| t.title.as_str()) {
            Lookup::One(t) => Ok(t.id.clone()),
            Lookup::None => Err(BoardError::task_not_found(identifier)),
            Lookup::Many(matches) => Err(BoardError::Ambiguous {
                kind: "task",
                identifier: identifier.to_string(),
                candidates: candidate_lines(matches.iter().map(|t| (t.id.short(), t.title.as_str()))),
            }),
        }
    }
}

enum Lookup<'a, T> {
    None,
    One(&'a T),
    Many(Vec<&'a T>),
}

/// Exact id wins, then a case-insensitive name, then an id prefix.
fn resolve_identifier<'a, T>(
    identifier: &str,
    items: &'a [T],
    id: impl Fn(&T) -> &str,
    name: impl Fn(&T) -> &str,
) -> Lookup<'a, T> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Lookup::None;
    }
    if let Some(exact) = items.iter().find(|item| id(item) == identifier) {
        return Lookup::One(exact);
    }
    let lowered = identifier.to_lowercase();
    let by_name: Vec<&T> = items
        .iter()
        .filter(|item| name(item).to_lowercase() == lowered)
        .collect();
    let by_prefix: Vec<&T> = items
        .iter()
        .filter(|item| id(item).starts_with(identifier))
        .collect();
    let matches = if by_name.is_empty() { by_prefix } else { by_name };
    match matches.len() {
        0 => Lookup::None,
        1 => Lookup::One(matches[0]),
        _ => Lookup::Many(matches),
    }
}

fn candidate_lines<'a>(items: impl Iterator<Item = (&'a str, &'a str)>) -> String {
    items
        .map(|(id, name)| format!("  {id}  {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow"
/// - "monday".."sunday" (and three-letter forms), "this friday", "next monday"
/// - "end of week", "end of month", "weekend"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "end of week" | "eow" => return Some(end_of_week(today)),
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            return NaiveDate::from_ymd_opt(year, month, 1).map(|d| d - Duration::days(1));
        }
        "weekend" | "this weekend" => {
            let ahead = (5 + 7 - today.weekday().num_days_from_monday() as i64) % 7;
            return Some(today + Duration::days(ahead));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let units: [(&str, i64); 3] = [("d", 1), ("w", 7), ("m", 30)];
        for (suffix, days) in units {
            if let Some(Ok(n)) = rest.trim().strip_suffix(suffix).map(|n| n.trim().parse::<i64>()) {
                return Some(today + Duration::days(n * days));
            }
        }
    }

    let (next, day) = match s.strip_prefix("next ") {
        Some(day) => (true, day),
        None => (false, s.strip_prefix("this ").unwrap_or(&s)),
    };
    if let Some(target) = weekday_number(day) {
        let current = today.weekday().num_days_from_monday() as i64;
        let ahead = (target + 7 - current) % 7;
        let ahead = if next { ahead + 7 } else { ahead };
        return Some(today + Duration::days(ahead));
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

fn weekday_number(name: &str) -> Option<i64> {
    const DAYS: [&str; 7] = [
        "monday",
        "tuesday",
        "wednesday",
        "thursday",
        "friday",
        "saturday",
        "sunday",
    ];
    DAYS.iter()
        .position(|d| *d == name || (name.len() == 3 && d.starts_with(name)))
        .map(|i| i as i64)
}

/// Sunday of the ISO week containing `today`.
pub fn end_of_week(today: NaiveDate) -> NaiveDate {
    let weekday = today.weekday().num_days_from_monday() as i64;
    today + Duration::days(6 - weekday)
}

/// Turn a parsed due day into a timestamp at local midnight.
pub fn due_timestamp(day: NaiveDate) -> DateTime<Utc> {
    let midnight = day.and_time(NaiveTime::MIN);
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Parse a due date argument, rejecting input that is not understood.
pub fn parse_due_arg(s: &str) -> Result<DateTime<Utc>> {
    let today = Local::now().date_naive();
    parse_due_input(s, today)
        .map(due_timestamp)
        .ok_or_else(|| BoardError::validation(format!("could not understand due date '{s}'")))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: Option<DateTime<Utc>>, today: NaiveDate) -> String {
    let Some(due) = due else {
        return "-".into();
    };
    let days = (due.with_timezone(&Local).date_naive() - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Truncate a string to a maximum width, adding an ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

/// Print tasks as a table, in the order given.
pub fn print_task_table(project: &Project, tasks: &[&Task]) {
    println!(
        "{:<9} {:<12} {:<4} {:<7} {:<10} {:<16} Title",
        "ID", "Status", "Pos", "Pri", "Due", "Assignee"
    );
    let today = Local::now().date_naive();
    for t in tasks {
        let assignee = project
            .assignee_of(t)
            .map(|m| m.name.as_str())
            .unwrap_or("Unassigned");
        let position = t
            .position
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".into());
        println!(
            "{:<9} {:<12} {:<4} {:<7} {:<10} {:<16} {}",
            t.id.short(),
            t.status.id(),
            position,
            t.priority.label(),
            format_due_relative(t.due, today),
            truncate(assignee, 16),
            t.title
        );
    }
}
