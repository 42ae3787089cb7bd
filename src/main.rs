//! # tb
//!
//! Command-line front end for taskboard.
//!
//! ```bash
//! # Try it with sample data
//! tb seed
//! tb ui
//!
//! # Or build a board from scratch
//! tb member add "Ada Lovelace" --email ada@example.com
//! tb project add "Website" --member ada@example.com
//! tb task add "Wireframe landing page" --priority high --due "next friday"
//! tb task move "wireframe landing page" --to review --index 0
//! tb project show Website
//! ```
//!
//! On the board, Space picks a card up and drops it, arrows move the
//! insertion point, and cards can also be dragged with the mouse.

use clap::Parser;

use taskboard::cli::Cli;
use taskboard::cmd::*;
use taskboard::config::Config;
use taskboard::db::Database;
use taskboard::{logging, Result};

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    if let Err(e) = Config::log_path().and_then(|path| logging::init(&path, cli.debug, &config.log_filter)) {
        eprintln!("Logging disabled: {e}");
    }

    let command = match cli.command {
        Commands::Completions { shell } => {
            cmd_completions(shell);
            return Ok(());
        }
        command => command,
    };

    let db_path = config.data_path(cli.db)?;
    let mut db = Database::load(&db_path)?;

    match command {
        Commands::Ui { project } => cmd_ui(db, &db_path, project, config.show_empty_hint),
        Commands::Project { action } => cmd_project(&mut db, &db_path, action),
        Commands::Member { action } => cmd_member(&mut db, &db_path, action),
        Commands::Task { action } => cmd_task(&mut db, &db_path, action),
        Commands::Seed => cmd_seed(&mut db, &db_path),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}
