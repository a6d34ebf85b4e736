//! Pure staging half of tournament recording.
//!
//! `stage_tournament` turns a submission and a snapshot of the player pool
//! into the complete set of documents to write. Nothing here touches storage;
//! `LeagueService` applies the staged writes in order.

use std::collections::{HashMap, HashSet};

use super::{
    generators::IdGenerator,
    models::{
        NewPlayerSpec, Player, ResultEntry, TournamentRecord, TournamentResult,
        TournamentSubmission, MAX_WINS_PER_TOURNAMENT,
    },
    LeagueError,
};

/// Every document a tournament submission will write, in apply order
#[derive(Debug, Clone, PartialEq)]
pub struct StagedTournament {
    /// Zeroed players to create before anything else
    pub new_players: Vec<Player>,
    pub tournament: TournamentRecord,
    /// Complete post-tournament documents for every participant
    pub updated_players: Vec<Player>,
}

/// Rejects a submission before any id is generated or any write issued
pub fn validate_submission(
    submission: &TournamentSubmission,
    pool: &[Player],
) -> Result<(), LeagueError> {
    if submission.results.is_empty() && submission.new_players.is_empty() {
        return Err(LeagueError::validation(
            "a tournament needs at least one player",
        ));
    }

    let known: HashSet<&str> = pool.iter().map(|p| p.id.as_str()).collect();
    let mut seen = HashSet::new();
    for result in &submission.results {
        if !known.contains(result.player_id.as_str()) {
            return Err(LeagueError::validation(format!(
                "unknown player {}",
                result.player_id
            )));
        }
        if !seen.insert(result.player_id.as_str()) {
            return Err(LeagueError::validation(format!(
                "player {} appears more than once",
                result.player_id
            )));
        }
        check_wins(result.wins)?;
    }

    for spec in &submission.new_players {
        if spec.name.trim().is_empty() {
            return Err(LeagueError::validation("new player name is empty"));
        }
        check_wins(spec.initial_wins)?;
    }

    Ok(())
}

fn check_wins(wins: u32) -> Result<(), LeagueError> {
    if wins > MAX_WINS_PER_TOURNAMENT {
        return Err(LeagueError::validation(format!(
            "{wins} wins exceeds the limit of {MAX_WINS_PER_TOURNAMENT}"
        )));
    }
    Ok(())
}

/// Where a participant's numbers come from
enum Entry<'a> {
    Existing(&'a TournamentResult),
    New(&'a NewPlayerSpec),
}

impl Entry<'_> {
    fn wins(&self) -> u32 {
        match self {
            Entry::Existing(result) => result.wins,
            Entry::New(spec) => spec.initial_wins,
        }
    }

    fn hero(&self) -> &str {
        match self {
            Entry::Existing(result) => &result.hero_played,
            Entry::New(spec) => &spec.hero_played,
        }
    }
}

/// Computes the write-set for one tournament.
///
/// New players receive ids from `ids` and are matched back to their spec by
/// that id, never by name, so two new players sharing a name stay distinct.
/// Result entries follow pool order: existing players first, then new ones.
pub fn stage_tournament(
    submission: &TournamentSubmission,
    pool: &[Player],
    ids: &dyn IdGenerator,
) -> Result<StagedTournament, LeagueError> {
    validate_submission(submission, pool)?;

    let created: Vec<(Player, &NewPlayerSpec)> = submission
        .new_players
        .iter()
        .map(|spec| (Player::new(ids.generate(), spec.name.trim()), spec))
        .collect();

    let by_id: HashMap<&str, &TournamentResult> = submission
        .results
        .iter()
        .map(|r| (r.player_id.as_str(), r))
        .collect();
    let new_by_id: HashMap<&str, &NewPlayerSpec> = created
        .iter()
        .map(|(player, spec)| (player.id.as_str(), *spec))
        .collect();

    let mut tournament = TournamentRecord {
        id: ids.generate(),
        date: submission.date,
        format: submission.format,
        results: Vec::new(),
    };
    let mut updated_players = Vec::new();

    let augmented = pool.iter().chain(created.iter().map(|(player, _)| player));
    for player in augmented {
        let id = player.id.as_str();
        let entry = match (by_id.get(id), new_by_id.get(id)) {
            (Some(result), _) => Entry::Existing(*result),
            (None, Some(spec)) => Entry::New(*spec),
            (None, None) => continue,
        };

        tournament.results.push(ResultEntry {
            player_id: player.id.clone(),
            player_name: player.name.clone(),
            hero_played: entry.hero().to_string(),
            wins: entry.wins(),
        });

        let mut updated = player.clone();
        updated.apply_result(entry.wins(), entry.hero());
        updated_players.push(updated);
    }

    Ok(StagedTournament {
        new_players: created.into_iter().map(|(player, _)| player).collect(),
        tournament,
        updated_players,
    })
}

/// Rebuilds a player's aggregates from tournament history.
///
/// Records are folded in date order; records sharing a date keep the order
/// they were given in.
pub fn replay_history(player: &Player, tournaments: &[TournamentRecord]) -> Player {
    let mut ordered: Vec<&TournamentRecord> = tournaments.iter().collect();
    ordered.sort_by_key(|t| t.date);

    let mut rebuilt = player.cleared();
    for tournament in ordered {
        if let Some(entry) = tournament.entry_for(&player.id) {
            rebuilt.apply_result(entry.wins, &entry.hero_played);
        }
    }
    rebuilt
}
