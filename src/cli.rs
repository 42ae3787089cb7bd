use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Projects, team members and a drag-and-drop task board in the terminal.
/// Storage defaults to ~/.taskboard/projects.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tb", version, about = "Terminal project dashboard with a kanban task board")]
pub struct Cli {
    /// Path to the JSON data file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Log at debug level to ~/.taskboard/taskboard.log.
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::{ProjectAction, TaskAction};

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_move() {
        let cli = Cli::try_parse_from(["tb", "task", "move", "abc", "--to", "review", "--index", "0"]).unwrap();
        match cli.command {
            Commands::Task {
                action: TaskAction::Move { id, to, index, .. },
            } => {
                assert_eq!(id, "abc");
                assert_eq!(to, "review");
                assert_eq!(index, Some(0));
            }
            _ => panic!("expected task move"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tb", "project", "list", "--db", "/tmp/p.json", "--debug"]).unwrap();
        assert_eq!(cli.db, Some(PathBuf::from("/tmp/p.json")));
        assert!(cli.debug);
        assert!(matches!(
            cli.command,
            Commands::Project {
                action: ProjectAction::List
            }
        ));
    }
}
