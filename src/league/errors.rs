use thiserror::Error;

#[derive(Debug, Error)]
pub enum LeagueError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    /// Some documents of a multi-document write were committed, others were not
    #[error("Partial write: {} committed, {} failed ({reason})", committed.len(), failed.len())]
    PartialWrite {
        committed: Vec<String>,
        failed: Vec<String>,
        reason: String,
    },

    #[error("Malformed import: {0}")]
    MalformedImport(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Player {0} is linked to an administrator account")]
    AdminProtected(String),
}

impl LeagueError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LeagueError::Validation(msg.into())
    }

    pub fn persistence(msg: impl Into<String>) -> Self {
        LeagueError::Persistence(msg.into())
    }
}

impl From<serde_json::Error> for LeagueError {
    fn from(err: serde_json::Error) -> Self {
        LeagueError::Persistence(format!("document encoding: {err}"))
    }
}

impl From<sqlx::Error> for LeagueError {
    fn from(err: sqlx::Error) -> Self {
        LeagueError::Persistence(err.to_string())
    }
}
