//! Board TUI entry point and setup.

use std::{io, path::Path};

use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::CrosstermBackend, Terminal};
use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::id::ProjectId;
use crate::tui::board::BoardApp;

/// Initialise and run the board for `project`. The terminal is restored
/// before any error from the event loop is returned.
pub fn run_board(db: Database, db_path: &Path, project: ProjectId, show_empty_hint: bool) -> Result<()> {
    info!(project = %project, "opening board");
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = BoardApp::new(db, db_path, project, show_empty_hint);
    let result = app.run(&mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;

    result?;
    Ok(())
}
