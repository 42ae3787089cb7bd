//! Sample data for trying the board out.

use chrono::{DateTime, Duration, Utc};
use tracing::info;

use crate::board::TaskStore;
use crate::db::Database;
use crate::fields::{Priority, ProjectStatus, Status};
use crate::id::ProjectId;
use crate::project::{Project, TeamMember};
use crate::task::Task;

const MEMBERS: [(&str, &str); 5] = [
    ("Ada Lovelace", "ada@example.com"),
    ("Alan Turing", "alan@example.com"),
    ("Grace Hopper", "grace@example.com"),
    ("Margaret Hamilton", "margaret@example.com"),
    ("Linus Torvalds", "linus@example.com"),
];

struct SeedTask {
    title: &'static str,
    status: Status,
    priority: Priority,
    due_in_days: Option<i64>,
}

const fn seed(title: &'static str, status: Status, priority: Priority, due_in_days: Option<i64>) -> SeedTask {
    SeedTask {
        title,
        status,
        priority,
        due_in_days,
    }
}

struct SeedProject {
    name: &'static str,
    description: &'static str,
    status: ProjectStatus,
    members: &'static [usize],
    tasks: &'static [SeedTask],
}

const PROJECTS: [SeedProject; 3] = [
    SeedProject {
        name: "Website Redesign",
        description: "Refresh the marketing site and move it to the new design system.",
        status: ProjectStatus::Active,
        members: &[0, 2, 3],
        tasks: &[
            seed("Audit current pages", Status::Done, Priority::Medium, None),
            seed("Collect brand assets", Status::Done, Priority::Low, None),
            seed("Wireframe landing page", Status::Review, Priority::High, Some(1)),
            seed("Build component library", Status::InProgress, Priority::High, Some(5)),
            seed("Write launch copy", Status::InProgress, Priority::Medium, Some(8)),
            seed("Set up analytics", Status::Todo, Priority::Low, Some(14)),
            seed("Accessibility review", Status::Todo, Priority::High, Some(12)),
        ],
    },
    SeedProject {
        name: "Mobile App",
        description: "First release of the companion app.",
        status: ProjectStatus::Active,
        members: &[1, 4],
        tasks: &[
            seed("Pick navigation library", Status::Done, Priority::Medium, None),
            seed("Offline sync prototype", Status::InProgress, Priority::High, Some(2)),
            seed("Push notifications", Status::Todo, Priority::Medium, Some(20)),
            seed("App store listing", Status::Todo, Priority::Low, None),
        ],
    },
    SeedProject {
        name: "Office Move",
        description: "Relocate the team to the new floor.",
        status: ProjectStatus::OnHold,
        members: &[2],
        tasks: &[
            seed("Measure new space", Status::Review, Priority::Medium, None),
            seed("Order desks", Status::Todo, Priority::High, Some(30)),
        ],
    },
];

/// Add sample members and projects to `db`. Existing data is kept; members
/// already on the roster (matched by email) are reused.
pub fn generate(db: &mut Database, now: DateTime<Utc>) -> (usize, usize) {
    let mut roster = Vec::with_capacity(MEMBERS.len());
    for (name, email) in MEMBERS {
        let member = match db.team_members.iter().find(|m| m.email == email) {
            Some(existing) => existing.clone(),
            None => {
                let member = TeamMember::new(name, email);
                db.team_members.push(member.clone());
                member
            }
        };
        roster.push(member);
    }

    let mut task_count = 0;
    for template in &PROJECTS {
        let mut project = Project {
            id: ProjectId::generate(),
            name: template.name.to_string(),
            description: template.description.to_string(),
            status: template.status,
            team_members: Vec::new(),
            tasks: TaskStore::default(),
            created_at: now,
            updated_at: None,
        };
        for &i in template.members {
            project.add_member(roster[i].clone());
        }
        for (n, t) in template.tasks.iter().enumerate() {
            let assignee = template.members.get(n % template.members.len()).map(|&i| roster[i].id.clone());
            let task = Task::new(t.title)
                .with_status(t.status)
                .with_priority(t.priority)
                .with_due(t.due_in_days.map(|d| now + Duration::days(d)))
                .with_assignee(assignee);
            project.tasks.insert(task);
            task_count += 1;
        }
        db.add_project(project);
    }
    info!(projects = PROJECTS.len(), tasks = task_count, "generated sample data");
    (PROJECTS.len(), task_count)
}
