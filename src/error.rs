//! Error types shared by the board engine, the data file and the CLI.

use thiserror::Error;

/// Result type for taskboard operations
pub type Result<T> = std::result::Result<T, BoardError>;

#[derive(Error, Debug)]
pub enum BoardError {
    /// A move or edit referenced a task that is not in the collection.
    #[error("task not found: {id}")]
    TaskNotFound { id: String },

    /// A column name outside the four workflow states.
    #[error("invalid column '{name}' (expected one of: todo, in-progress, review, done)")]
    InvalidColumn { name: String },

    #[error("project not found: {identifier}")]
    ProjectNotFound { identifier: String },

    #[error("team member not found: {identifier}")]
    MemberNotFound { identifier: String },

    #[error("'{identifier}' matches more than one {kind}:\n{candidates}\nPlease use the ID instead.")]
    Ambiguous {
        kind: &'static str,
        identifier: String,
        candidates: String,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("no home directory")]
    NoHomeDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl BoardError {
    pub fn task_not_found(id: impl Into<String>) -> Self {
        Self::TaskNotFound { id: id.into() }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            format!("{}", BoardError::task_not_found("abc")),
            "task not found: abc"
        );
        assert_eq!(format!("{}", BoardError::NoHomeDir), "no home directory");
        assert!(format!(
            "{}",
            BoardError::InvalidColumn {
                name: "backlog".into()
            }
        )
        .starts_with("invalid column 'backlog'"));
    }
}
