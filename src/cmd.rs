//! Command implementations for the CLI interface.
//!
//! Each handler works on the loaded [`Database`] and writes it back with
//! [`Database::save`] after a change. Handlers return errors instead of
//! exiting so `main` decides how to report them.

use std::path::Path;

use chrono::Utc;
use clap::Subcommand;
use clap_complete::{generate, Shell};
use tracing::info;

use crate::board::partition::column_counts;
use crate::db::{format_due_relative, parse_due_arg, print_task_table, truncate, Database};
use crate::error::{BoardError, Result};
use crate::fields::{Priority, ProjectStatus, Status};
use crate::id::ProjectId;
use crate::project::{Project, TeamMember};
use crate::task::{validate_due, validate_title, Task};

#[derive(Subcommand)]
pub enum Commands {
    /// Open the task board.
    Ui {
        /// Project ID or name. Defaults to the active project.
        #[arg(long)]
        project: Option<String>,
    },

    /// Create, inspect and manage projects.
    Project {
        #[command(subcommand)]
        action: ProjectAction,
    },

    /// Manage the team roster.
    Member {
        #[command(subcommand)]
        action: MemberAction,
    },

    /// Add, edit and move tasks.
    Task {
        #[command(subcommand)]
        action: TaskAction,
    },

    /// Generate sample team members, projects and tasks.
    Seed,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a project.
    Add {
        /// Project name (at least 3 characters).
        name: String,
        #[arg(long)]
        desc: Option<String>,
        /// Team member ID, name or email. May be repeated.
        #[arg(long = "member")]
        members: Vec<String>,
    },
    /// List projects with progress and next deadline.
    List,
    /// Show a project's board, column by column.
    Show { project: Option<String> },
    /// Make a project the active one.
    Use { project: String },
    /// Delete a project and all of its tasks.
    Delete { project: String },
    /// Change a project's status.
    Status {
        project: String,
        #[arg(value_enum)]
        status: ProjectStatus,
    },
    /// Put a roster member on a project's team.
    AddMember { project: String, member: String },
    /// Take a member off a project's team.
    RemoveMember { project: String, member: String },
}

#[derive(Subcommand)]
pub enum MemberAction {
    /// Add someone to the roster.
    Add {
        name: String,
        #[arg(long)]
        email: String,
        /// Avatar URL.
        #[arg(long)]
        avatar: Option<String>,
    },
    /// List the roster.
    List,
    /// Remove someone from the roster and every project team.
    Remove { member: String },
}

#[derive(Subcommand)]
pub enum TaskAction {
    /// Add a task to the end of a column.
    Add {
        /// Task title (at least 3 characters).
        title: String,
        /// Project ID or name. Defaults to the active project.
        #[arg(long)]
        project: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        /// Column: todo | in-progress | review | done.
        #[arg(long, default_value = "todo")]
        status: String,
        #[arg(long, value_enum, default_value_t = Priority::Medium)]
        priority: Priority,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", "in Nd", "next friday".
        #[arg(long)]
        due: Option<String>,
        /// Team member ID, name or email.
        #[arg(long)]
        assignee: Option<String>,
    },
    /// List tasks in board order.
    List {
        /// Project ID or name. Defaults to the active project.
        #[arg(long)]
        project: Option<String>,
        /// Only this column.
        #[arg(long)]
        status: Option<String>,
    },
    /// Edit a task. A status change moves the task to the end of that column.
    Update {
        /// Task ID, ID prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,
        #[arg(long)]
        clear_due: bool,
        #[arg(long, conflicts_with = "unassign")]
        assignee: Option<String>,
        #[arg(long)]
        unassign: bool,
    },
    /// Move a task to a column and position.
    Move {
        /// Task ID, ID prefix or title.
        id: String,
        /// Target column: todo | in-progress | review | done.
        #[arg(long)]
        to: String,
        /// Zero-based position in the target column. Defaults to the end.
        #[arg(long)]
        index: Option<usize>,
        /// Limit the task lookup to one project.
        #[arg(long)]
        project: Option<String>,
    },
    /// Delete a task.
    Delete {
        /// Task ID, ID prefix or title.
        id: String,
    },
}

/// The project named on the command line, or the active one.
pub fn target_project(db: &Database, project: Option<&str>) -> Result<ProjectId> {
    match project {
        Some(identifier) => db.resolve_project(identifier),
        None => db
            .active()
            .map(|p| p.id.clone())
            .ok_or_else(|| BoardError::ProjectNotFound {
                identifier: "(no projects yet, try `tb project add` or `tb seed`)".into(),
            }),
    }
}

fn project_mut<'a>(db: &'a mut Database, id: &ProjectId) -> Result<&'a mut Project> {
    db.project_mut(id).ok_or_else(|| BoardError::ProjectNotFound {
        identifier: id.to_string(),
    })
}

/// Open the board on `project` (or the active project).
pub fn cmd_ui(db: Database, db_path: &Path, project: Option<String>, show_empty_hint: bool) -> Result<()> {
    let project_id = target_project(&db, project.as_deref())?;
    crate::tui::run::run_board(db, db_path, project_id, show_empty_hint)
}

pub fn cmd_project(db: &mut Database, db_path: &Path, action: ProjectAction) -> Result<()> {
    match action {
        ProjectAction::Add { name, desc, members } => {
            let mut project = Project::new(&name, desc.as_deref().unwrap_or(""))?;
            for identifier in members {
                let id = db.resolve_member(&identifier)?;
                if let Some(member) = db.member(&id) {
                    project.add_member(member.clone());
                }
            }
            let name = project.name.clone();
            let id = db.add_project(project);
            db.save(db_path)?;
            info!(project = %id, "project created");
            println!("Added project {} ({})", name, id.short());
        }
        ProjectAction::List => cmd_project_list(db),
        ProjectAction::Show { project } => {
            let id = target_project(db, project.as_deref())?;
            if let Some(project) = db.project(&id) {
                print_board(project, db.active_project.as_ref() == Some(&id));
            }
        }
        ProjectAction::Use { project } => {
            let id = db.resolve_project(&project)?;
            db.active_project = Some(id.clone());
            db.save(db_path)?;
            if let Some(project) = db.project(&id) {
                println!("Active project: {}", project.name);
            }
        }
        ProjectAction::Delete { project } => {
            let id = db.resolve_project(&project)?;
            let removed = db.remove_project(&id)?;
            db.save(db_path)?;
            info!(project = %id, tasks = removed.tasks.len(), "project deleted");
            println!("Deleted project {} and {} task(s)", removed.name, removed.tasks.len());
        }
        ProjectAction::Status { project, status } => {
            let id = db.resolve_project(&project)?;
            let project = project_mut(db, &id)?;
            project.status = status;
            project.touch();
            let name = project.name.clone();
            db.save(db_path)?;
            println!("{} is now {}", name, status.label());
        }
        ProjectAction::AddMember { project, member } => {
            let project_id = db.resolve_project(&project)?;
            let member_id = db.resolve_member(&member)?;
            let member = db
                .member(&member_id)
                .cloned()
                .ok_or_else(|| BoardError::MemberNotFound { identifier: member.clone() })?;
            let project = project_mut(db, &project_id)?;
            if project.add_member(member.clone()) {
                project.touch();
                db.save(db_path)?;
                println!("Added {} to the team", member.name);
            } else {
                println!("{} is already on the team", member.name);
            }
        }
        ProjectAction::RemoveMember { project, member } => {
            let project_id = db.resolve_project(&project)?;
            let member_id = db.resolve_member(&member)?;
            let project = project_mut(db, &project_id)?;
            let removed = project.remove_member(&member_id)?;
            project.touch();
            db.save(db_path)?;
            println!("Removed {} from the team", removed.name);
        }
    }
    Ok(())
}

fn cmd_project_list(db: &Database) {
    if db.projects.is_empty() {
        println!("No projects yet. Add one with `tb project add` or try `tb seed`.");
        return;
    }
    let now = Utc::now();
    let today = now.date_naive();
    println!(
        "  {:<9} {:<24} {:<10} {:<12} {:<6} {:<10} Team",
        "ID", "Name", "Status", "T/P/R/D", "Done", "Deadline"
    );
    for p in &db.projects {
        let marker = if db.active_project.as_ref() == Some(&p.id) { '*' } else { ' ' };
        let deadline = p.next_deadline(now);
        let soon = deadline.is_some_and(|d| crate::project::is_deadline_soon(d, now));
        let [todo, doing, review, done] = column_counts(p.tasks.tasks());
        println!(
            "{} {:<9} {:<24} {:<10} {:<12} {:<6} {:<10} {}",
            marker,
            p.id.short(),
            truncate(&p.name, 24),
            p.status.label(),
            format!("{todo}/{doing}/{review}/{done}"),
            format!("{:.0}%", p.progress()),
            format!("{}{}", format_due_relative(deadline, today), if soon { "!" } else { "" }),
            p.team_members.len()
        );
    }
}

/// Print a project's columns with their tasks in board order.
pub fn print_board(project: &Project, active: bool) {
    println!(
        "{}{} [{}]  {:.0}% done",
        project.name,
        if active { " (active)" } else { "" },
        project.status.label(),
        project.progress()
    );
    if !project.description.is_empty() {
        println!("{}", project.description);
    }
    if !project.team_members.is_empty() {
        let names: Vec<&str> = project.team_members.iter().map(|m| m.name.as_str()).collect();
        println!("Team: {}", names.join(", "));
    }
    for column in Status::ALL {
        let tasks = project.tasks.partition(column);
        println!();
        println!("{} ({})", column.title(), tasks.len());
        if !tasks.is_empty() {
            print_task_table(project, &tasks);
        }
    }
}

pub fn cmd_member(db: &mut Database, db_path: &Path, action: MemberAction) -> Result<()> {
    match action {
        MemberAction::Add { name, email, avatar } => {
            let name = name.trim();
            let email = email.trim();
            if name.is_empty() {
                return Err(BoardError::validation("Member name is required"));
            }
            if !email.contains('@') {
                return Err(BoardError::validation(format!("'{email}' is not an email address")));
            }
            if db.team_members.iter().any(|m| m.email.eq_ignore_ascii_case(email)) {
                return Err(BoardError::validation(format!("{email} is already on the roster")));
            }
            let mut member = TeamMember::new(name, email);
            member.avatar = avatar.filter(|a| !a.trim().is_empty());
            let id = member.id.clone();
            db.team_members.push(member);
            db.save(db_path)?;
            println!("Added {} ({})", name, id.short());
        }
        MemberAction::List => {
            println!("{:<9} {:<20} {:<28} Projects", "ID", "Name", "Email");
            for m in &db.team_members {
                let projects = db
                    .projects
                    .iter()
                    .filter(|p| p.team_members.iter().any(|t| t.id == m.id))
                    .count();
                println!(
                    "{:<9} {:<20} {:<28} {}",
                    m.id.short(),
                    truncate(&m.name, 20),
                    truncate(&m.email, 28),
                    projects
                );
            }
        }
        MemberAction::Remove { member } => {
            let id = db.resolve_member(&member)?;
            let removed = db.remove_member(&id)?;
            db.save(db_path)?;
            println!("Removed {} from the roster", removed.name);
        }
    }
    Ok(())
}

pub fn cmd_task(db: &mut Database, db_path: &Path, action: TaskAction) -> Result<()> {
    match action {
        TaskAction::Add {
            title,
            project,
            desc,
            status,
            priority,
            due,
            assignee,
        } => cmd_task_add(db, db_path, title, project, desc, &status, priority, due, assignee),
        TaskAction::List { project, status } => {
            let id = target_project(db, project.as_deref())?;
            let only = status.as_deref().map(str::parse::<Status>).transpose()?;
            let Some(project) = db.project(&id) else {
                return Err(BoardError::ProjectNotFound { identifier: id.to_string() });
            };
            let tasks: Vec<&Task> = Status::ALL
                .into_iter()
                .filter(|c| only.map_or(true, |s| s == *c))
                .flat_map(|c| project.tasks.partition(c))
                .collect();
            if tasks.is_empty() {
                println!("No tasks.");
            } else {
                print_task_table(project, &tasks);
            }
            Ok(())
        }
        TaskAction::Update {
            id,
            title,
            desc,
            status,
            priority,
            due,
            clear_due,
            assignee,
            unassign,
        } => {
            let edit = TaskEdit {
                title,
                desc,
                status,
                priority,
                due,
                clear_due,
                assignee,
                unassign,
            };
            cmd_task_update(db, db_path, &id, edit)
        }
        TaskAction::Move { id, to, index, project } => {
            // Parse the column before touching anything.
            let column: Status = to.parse()?;
            let within = project.as_deref().map(|p| db.resolve_project(p)).transpose()?;
            let task_id = db.resolve_task(&id, within.as_ref())?;
            let project = db
                .project_of_task_mut(&task_id)
                .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
            if !project.tasks.move_task(&task_id, column, index.unwrap_or(usize::MAX))? {
                println!("Task is already there.");
                return Ok(());
            }
            project.touch();
            let placed = project
                .tasks
                .partition(column)
                .iter()
                .position(|t| t.id == task_id)
                .unwrap_or_default();
            db.save(db_path)?;
            info!(task = %task_id, column = column.id(), index = placed, "task moved");
            println!("Moved {} to {} at position {}", task_id.short(), column.title(), placed);
            Ok(())
        }
        TaskAction::Delete { id } => {
            let task_id = db.resolve_task(&id, None)?;
            let project = db
                .project_of_task_mut(&task_id)
                .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
            let removed = project.tasks.remove(&task_id)?;
            project.touch();
            db.save(db_path)?;
            info!(task = %task_id, "task deleted");
            println!("Deleted task {}", removed.title);
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_task_add(
    db: &mut Database,
    db_path: &Path,
    title: String,
    project: Option<String>,
    desc: Option<String>,
    status: &str,
    priority: Priority,
    due: Option<String>,
    assignee: Option<String>,
) -> Result<()> {
    validate_title(&title)?;
    let status: Status = status.parse()?;
    let due = due.as_deref().map(parse_due_arg).transpose()?;
    validate_due(due, Utc::now())?;
    let project_id = target_project(db, project.as_deref())?;
    let assignee = assignee.as_deref().map(|a| db.resolve_member(a)).transpose()?;

    let project = project_mut(db, &project_id)?;
    project.check_assignee(assignee.as_ref())?;
    let task = Task::new(title.trim())
        .with_status(status)
        .with_priority(priority)
        .with_description(desc.unwrap_or_default())
        .with_due(due)
        .with_assignee(assignee);
    let id = project.tasks.insert(task);
    project.touch();
    let project_name = project.name.clone();
    db.save(db_path)?;
    info!(task = %id, column = status.id(), "task created");
    println!("Added task {} to {} in {}", id.short(), status.title(), project_name);
    Ok(())
}

/// Field changes requested by `task update`.
#[derive(Debug, Default)]
pub struct TaskEdit {
    pub title: Option<String>,
    pub desc: Option<String>,
    pub status: Option<String>,
    pub priority: Option<Priority>,
    pub due: Option<String>,
    pub clear_due: bool,
    pub assignee: Option<String>,
    pub unassign: bool,
}

/// Apply an edit. Every input is validated before the task is touched.
pub fn cmd_task_update(db: &mut Database, db_path: &Path, identifier: &str, edit: TaskEdit) -> Result<()> {
    let task_id = db.resolve_task(identifier, None)?;
    if let Some(title) = &edit.title {
        validate_title(title)?;
    }
    let status = edit.status.as_deref().map(str::parse::<Status>).transpose()?;
    let due = edit.due.as_deref().map(parse_due_arg).transpose()?;
    let now = Utc::now();
    validate_due(due, now)?;
    let assignee = edit.assignee.as_deref().map(|a| db.resolve_member(a)).transpose()?;

    let project = db
        .project_of_task_mut(&task_id)
        .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
    project.check_assignee(assignee.as_ref())?;

    if let Some(status) = status {
        project.tasks.move_to_end(&task_id, status)?;
    }
    let task = project
        .tasks
        .get_mut(&task_id)
        .ok_or_else(|| BoardError::task_not_found(task_id.as_str()))?;
    if let Some(title) = edit.title {
        task.title = title.trim().to_string();
    }
    if let Some(desc) = edit.desc {
        task.description = Some(desc).filter(|d| !d.trim().is_empty());
    }
    if let Some(priority) = edit.priority {
        task.priority = priority;
    }
    if edit.clear_due {
        task.due = None;
    } else if due.is_some() {
        task.due = due;
    }
    if edit.unassign {
        task.assignee = None;
    } else if assignee.is_some() {
        task.assignee = assignee;
    }
    task.touch(now);
    project.touch();
    db.save(db_path)?;
    println!("Updated task {}", task_id.short());
    Ok(())
}

pub fn cmd_seed(db: &mut Database, db_path: &Path) -> Result<()> {
    let (projects, tasks) = crate::seed::generate(db, Utc::now());
    db.save(db_path)?;
    println!("Generated {projects} projects with {tasks} tasks.");
    Ok(())
}

pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
