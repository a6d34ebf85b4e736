use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{
    models::{Player, TournamentRecord},
    LeagueError,
};
use crate::account::models::Account;

/// On-disk backup document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupFile {
    #[serde(default)]
    pub timestamp: String,
    pub players: Vec<Player>,
    pub users: Vec<Account>,
    #[serde(default)]
    pub tournaments: Vec<TournamentRecord>,
}

/// Record counts reported after a restore
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub players: usize,
    pub users: usize,
    pub tournaments: usize,
}

impl BackupFile {
    pub fn new(
        players: Vec<Player>,
        users: Vec<Account>,
        tournaments: Vec<TournamentRecord>,
        taken_at: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp: taken_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            players,
            users,
            tournaments,
        }
    }

    /// Suggested download name, e.g. `fab-league-backup-2024-01-10.json`
    pub fn file_name(taken_at: DateTime<Utc>) -> String {
        format!("fab-league-backup-{}.json", taken_at.format("%Y-%m-%d"))
    }

    pub fn summary(&self) -> ImportSummary {
        ImportSummary {
            players: self.players.len(),
            users: self.users.len(),
            tournaments: self.tournaments.len(),
        }
    }
}

/// Parses and validates a backup before anything is written.
///
/// `players` and `users` must be arrays; `tournaments` may be absent or null.
pub fn parse_backup(raw: &str) -> Result<BackupFile, LeagueError> {
    let mut json: Value = serde_json::from_str(raw)
        .map_err(|e| LeagueError::MalformedImport(format!("not valid JSON: {e}")))?;

    for key in ["players", "users"] {
        if !json.get(key).is_some_and(Value::is_array) {
            return Err(LeagueError::MalformedImport(format!(
                "missing `{key}` array"
            )));
        }
    }
    if json.get("tournaments").is_some_and(Value::is_null) {
        if let Some(object) = json.as_object_mut() {
            object.remove("tournaments");
        }
    }

    serde_json::from_value(json).map_err(|e| LeagueError::MalformedImport(e.to_string()))
}
