//! # taskboard
//!
//! Projects, team members and a four-column kanban board (To Do, In Progress,
//! Review, Done) kept in a local JSON file.
//!
//! The [`board`] module holds the ordering rules and is independent of any
//! front end:
//!
//! - [`board::partition`] lists one column's tasks in display order
//! - [`board::apply`] moves a task to a column and index, renumbering positions
//! - [`board::DragSession`] turns pointer or keyboard gestures into exactly one
//!   move per drop
//!
//! ```
//! use taskboard::board::{DragSession, DropOutcome, Gesture, TaskStore};
//! use taskboard::fields::Status;
//! use taskboard::task::Task;
//!
//! let mut store = TaskStore::default();
//! let id = store.insert(Task::new("Write release notes"));
//! store.insert(Task::new("Ship").with_status(Status::Done));
//!
//! let mut session = DragSession::new();
//! session.on_drag_start(&store, &id).unwrap();
//! let outcome = session
//!     .on_drag_end(&mut store, &Gesture::over_column(Status::Done))
//!     .unwrap();
//! assert!(matches!(outcome, DropOutcome::Moved { index: 1, .. }));
//! assert_eq!(store.partition(Status::Done)[1].id, id);
//! ```
//!
//! The `tb` binary wraps this in a CLI and a terminal board; data lives in
//! `~/.taskboard/` unless `--db` points elsewhere.

pub mod board;
pub mod cli;
pub mod cmd;
pub mod config;
pub mod db;
pub mod error;
pub mod fields;
pub mod id;
pub mod logging;
pub mod project;
pub mod seed;
pub mod task;
pub mod tui {
    pub mod board;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
}

pub use error::{BoardError, Result};
