//! Log setup.
//!
//! The board owns the terminal, so events go to `~/.taskboard/taskboard.log`
//! rather than stderr. The filter comes from `TASKBOARD_LOG`, then `--debug`,
//! then the config file.
//!
//! Levels used across the crate:
//! - WARN: a write to the data file failed, or a gesture was ignored
//! - INFO: committed drops, created and deleted records
//! - DEBUG: engine moves, resolver decisions, file loads

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::Result;

pub const ENV_VAR: &str = "TASKBOARD_LOG";

/// Pick the filter directive.
pub fn filter_directive(env: Option<String>, debug: bool, configured: &str) -> String {
    match env.filter(|v| !v.trim().is_empty()) {
        Some(directive) => directive,
        None if debug => "taskboard=debug".to_string(),
        None => configured.to_string(),
    }
}

/// Install the global subscriber writing to `path`. Calling this twice is
/// harmless; the second call is ignored.
pub fn init(path: &Path, debug: bool, configured: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let directive = filter_directive(std::env::var(ENV_VAR).ok(), debug, configured);
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_FILTER));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_wins_over_flags() {
        assert_eq!(
            filter_directive(Some("trace".into()), true, "taskboard=info"),
            "trace"
        );
    }

    #[test]
    fn test_debug_flag_then_config() {
        assert_eq!(filter_directive(None, true, "warn"), "taskboard=debug");
        assert_eq!(filter_directive(Some("  ".into()), false, "warn"), "warn");
    }

    #[test]
    fn test_init_creates_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logs").join("taskboard.log");
        init(&path, false, "taskboard=info").unwrap();
        assert!(path.exists());
    }
}
