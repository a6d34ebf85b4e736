use serde::{Deserialize, Serialize};

/// Events describing committed store writes.
///
/// Subscribers treat these as invalidation signals and re-read the stores;
/// they carry ids, not documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeagueEvent {
    /// One or more player documents were written or removed
    PlayersChanged { player_ids: Vec<String> },

    /// A tournament record was committed to history
    TournamentRecorded { tournament_id: String },

    /// Account documents changed (registration, role change, import)
    AccountsChanged,

    /// A backup was restored over the stores
    DataImported,
}

impl LeagueEvent {
    /// Short name used as the SSE event type and in logs
    pub fn event_type(&self) -> &'static str {
        match self {
            LeagueEvent::PlayersChanged { .. } => "players_changed",
            LeagueEvent::TournamentRecorded { .. } => "tournament_recorded",
            LeagueEvent::AccountsChanged => "accounts_changed",
            LeagueEvent::DataImported => "data_imported",
        }
    }
}
