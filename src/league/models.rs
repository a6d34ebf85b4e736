use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::{Display, EnumIter, EnumString};

/// Upper bound on wins a single player can record in one tournament
pub const MAX_WINS_PER_TOURNAMENT: u32 = 10;

/// Points awarded for entering a tournament, on top of one point per win
pub const ATTENDANCE_POINTS: u32 = 1;

/// Hero names offered by pickers. Not enforced: any non-empty string is accepted.
pub const HEROES: &[&str] = &[
    "Katsu", "Dorinthea", "Rhinar", "Bravo", "Kano", "Viserai", "Dash", "Azalea", "Boltyn",
    "Levia", "Briar", "Oldhim", "Lexi", "Iyslander", "Dromai", "Fai", "Uzuri", "Riptide",
    "Teklovossen", "Maxx", "Kayo", "Betsy", "Olympia", "Victor", "Zen", "Nuu", "Enigma",
    "Aurora", "Oscilio", "Florian", "Verdance",
];

/// Tournament ruleset category
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
pub enum TournamentFormat {
    /// Classic constructed
    #[serde(rename = "CC")]
    #[strum(serialize = "CC")]
    StandardConstructed,
    #[serde(rename = "Sage")]
    #[strum(serialize = "Sage")]
    Skirmish,
    /// Sealed or draft
    #[serde(rename = "Limitado")]
    #[strum(serialize = "Limitado")]
    Limited,
}

/// Document stored in the `players` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub hero_stats: BTreeMap<String, u32>,
    #[serde(default)]
    pub tournaments_played: u32,
    #[serde(default)]
    pub total_wins: u32,
    #[serde(default)]
    pub total_points: u32,
    #[serde(default)]
    pub recent_performance: Vec<u32>,
}

impl Player {
    /// Creates a player with zeroed counters and empty history
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hero_stats: BTreeMap::new(),
            tournaments_played: 0,
            total_wins: 0,
            total_points: 0,
            recent_performance: Vec::new(),
        }
    }

    /// Folds one tournament entry into the aggregates.
    /// An empty hero still counts as participation but leaves the histogram alone.
    pub fn apply_result(&mut self, wins: u32, hero_played: &str) {
        self.tournaments_played += 1;
        self.total_wins += wins;
        self.total_points += ATTENDANCE_POINTS + wins;
        self.recent_performance.push(wins);
        if !hero_played.is_empty() {
            *self.hero_stats.entry(hero_played.to_string()).or_insert(0) += 1;
        }
    }

    /// Copy of this player with every aggregate reset, identity and name kept
    pub fn cleared(&self) -> Self {
        Self::new(self.id.clone(), self.name.clone())
    }

    /// True when points, history length and hero counts are mutually consistent
    pub fn is_consistent(&self) -> bool {
        self.total_points == self.tournaments_played + self.total_wins
            && self.recent_performance.len() == self.tournaments_played as usize
            && self.recent_performance.iter().sum::<u32>() == self.total_wins
            && self.hero_stats.values().all(|count| *count >= 1)
    }

    /// Same aggregates, ignoring identity and name
    pub fn same_aggregates(&self, other: &Player) -> bool {
        self.hero_stats == other.hero_stats
            && self.tournaments_played == other.tournaments_played
            && self.total_wins == other.total_wins
            && self.total_points == other.total_points
            && self.recent_performance == other.recent_performance
    }
}

/// One line of a committed tournament. `player_name` is a snapshot taken at write time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultEntry {
    pub player_id: String,
    pub player_name: String,
    pub hero_played: String,
    pub wins: u32,
}

/// Document stored in the `tournaments` collection; never modified once created
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentRecord {
    pub id: String,
    pub date: NaiveDate,
    pub format: TournamentFormat,
    #[serde(default)]
    pub results: Vec<ResultEntry>,
}

impl TournamentRecord {
    pub fn entry_for(&self, player_id: &str) -> Option<&ResultEntry> {
        self.results.iter().find(|r| r.player_id == player_id)
    }
}

/// Submitted result for a player already in the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentResult {
    pub player_id: String,
    pub wins: u32,
    #[serde(default)]
    pub hero_played: String,
}

/// Submitted result for a player that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPlayerSpec {
    pub name: String,
    pub initial_wins: u32,
    #[serde(default)]
    pub hero_played: String,
}

/// Full input for recording one tournament
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TournamentSubmission {
    pub date: NaiveDate,
    pub format: TournamentFormat,
    #[serde(default)]
    pub results: Vec<TournamentResult>,
    #[serde(default)]
    pub new_players: Vec<NewPlayerSpec>,
}
