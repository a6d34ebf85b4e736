use serde::{Deserialize, Serialize};

use super::models::{TournamentFormat, TournamentRecord};
use super::projection::tournament_winners;

/// Body of `POST /players` and `PUT /players/{id}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerNameRequest {
    pub name: String,
}

/// Query of `GET /stats`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub format: Option<String>,
}

/// Tournament as shown in the history list, with its winners resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub tournament: TournamentRecord,
    pub winner_ids: Vec<String>,
}

impl From<TournamentRecord> for HistoryEntry {
    fn from(tournament: TournamentRecord) -> Self {
        let winner_ids = tournament_winners(&tournament)
            .into_iter()
            .map(|r| r.player_id.clone())
            .collect();
        Self {
            tournament,
            winner_ids,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssistantContext {
    pub roster: String,
}

/// Reference data for result entry forms
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    pub heroes: &'static [&'static str],
    pub formats: Vec<TournamentFormat>,
}
