//! Read-side views over explicit snapshots of the player and tournament stores.
//! Nothing in here mutates or performs I/O.

use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use super::models::{Player, ResultEntry, TournamentFormat, TournamentRecord};

/// Number of entries shown in the points and participation charts
pub const DEFAULT_CHART_SIZE: usize = 5;

/// Which tournaments a stats view folds over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatFilter {
    #[default]
    All,
    Only(TournamentFormat),
}

impl FormatFilter {
    pub fn matches(&self, format: TournamentFormat) -> bool {
        match self {
            FormatFilter::All => true,
            FormatFilter::Only(selected) => *selected == format,
        }
    }
}

impl FromStr for FormatFilter {
    type Err = strum::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("ALL") {
            return Ok(FormatFilter::All);
        }
        TournamentFormat::from_str(s).map(FormatFilter::Only)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub player_id: String,
    pub name: String,
    pub total_points: u32,
    pub total_wins: u32,
    pub tournaments_played: u32,
    pub top_hero: Option<String>,
}

/// Per-player totals recomputed from a filtered slice of history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormatStats {
    pub player_id: String,
    pub name: String,
    pub total_points: u32,
    pub tournaments_played: u32,
    pub hero_stats: BTreeMap<String, u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroUsage {
    pub hero: String,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformancePoint {
    pub label: String,
    pub wins: u32,
    pub points: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerProfile {
    pub player: Player,
    pub top_hero: Option<String>,
    pub average_wins: f64,
    pub performance: Vec<PerformancePoint>,
    /// Wins in the most recent tournaments, oldest first
    pub recent_form: Vec<u32>,
}

/// Players by total points, highest first. Equal points keep input order.
pub fn rank_players(players: &[Player]) -> Vec<&Player> {
    let mut ranked: Vec<&Player> = players.iter().collect();
    ranked.sort_by_key(|p| Reverse(p.total_points));
    ranked
}

pub fn leaderboard(players: &[Player]) -> Vec<LeaderboardEntry> {
    rank_players(players)
        .into_iter()
        .enumerate()
        .map(|(index, player)| LeaderboardEntry {
            rank: index + 1,
            player_id: player.id.clone(),
            name: player.name.clone(),
            total_points: player.total_points,
            total_wins: player.total_wins,
            tournaments_played: player.tournaments_played,
            top_hero: top_hero(&player.hero_stats).map(str::to_string),
        })
        .collect()
}

/// Most played hero. Ties go to the lexically smallest name.
pub fn top_hero(hero_stats: &BTreeMap<String, u32>) -> Option<&str> {
    let mut best: Option<(&str, u32)> = None;
    for (hero, count) in hero_stats {
        if best.map_or(true, |(_, top)| *count > top) {
            best = Some((hero.as_str(), *count));
        }
    }
    best.map(|(hero, _)| hero)
}

/// Folds matching tournaments into per-player totals.
///
/// Every current player appears, even with zero matching tournaments.
/// Results for players no longer on the roster are dropped.
pub fn format_stats(
    players: &[Player],
    tournaments: &[TournamentRecord],
    filter: FormatFilter,
) -> Vec<FormatStats> {
    let mut stats: Vec<FormatStats> = players
        .iter()
        .map(|p| FormatStats {
            player_id: p.id.clone(),
            name: p.name.clone(),
            total_points: 0,
            tournaments_played: 0,
            hero_stats: BTreeMap::new(),
        })
        .collect();
    let index: HashMap<String, usize> = stats
        .iter()
        .enumerate()
        .map(|(i, s)| (s.player_id.clone(), i))
        .collect();

    for tournament in tournaments.iter().filter(|t| filter.matches(t.format)) {
        for result in &tournament.results {
            let Some(&slot) = index.get(&result.player_id) else {
                continue;
            };
            let entry = &mut stats[slot];
            entry.total_points += result.wins + 1;
            entry.tournaments_played += 1;
            if !result.hero_played.is_empty() {
                *entry
                    .hero_stats
                    .entry(result.hero_played.clone())
                    .or_insert(0) += 1;
            }
        }
    }

    stats
}

/// League-wide hero play counts, most played first, then by name
pub fn hero_distribution(stats: &[FormatStats]) -> Vec<HeroUsage> {
    let mut totals: BTreeMap<&str, u32> = BTreeMap::new();
    for player in stats {
        for (hero, count) in &player.hero_stats {
            *totals.entry(hero.as_str()).or_insert(0) += count;
        }
    }

    let mut usage: Vec<HeroUsage> = totals
        .into_iter()
        .map(|(hero, count)| HeroUsage {
            hero: hero.to_string(),
            count,
        })
        .collect();
    usage.sort_by_key(|u| Reverse(u.count));
    usage
}

pub fn top_by_points(stats: &[FormatStats], limit: usize) -> Vec<&FormatStats> {
    top_by(stats, limit, |s| s.total_points)
}

pub fn top_by_participation(stats: &[FormatStats], limit: usize) -> Vec<&FormatStats> {
    top_by(stats, limit, |s| s.tournaments_played)
}

fn top_by(
    stats: &[FormatStats],
    limit: usize,
    metric: impl Fn(&FormatStats) -> u32,
) -> Vec<&FormatStats> {
    let mut ranked: Vec<&FormatStats> = stats.iter().filter(|s| metric(*s) > 0).collect();
    ranked.sort_by_key(|s| Reverse(metric(*s)));
    ranked.truncate(limit);
    ranked
}

/// Every result tied for the most wins
pub fn tournament_winners(tournament: &TournamentRecord) -> Vec<&ResultEntry> {
    let Some(max_wins) = tournament.results.iter().map(|r| r.wins).max() else {
        return Vec::new();
    };
    tournament
        .results
        .iter()
        .filter(|r| r.wins == max_wins)
        .collect()
}

/// History sorted by date, most recent first. Same-day records keep store order.
pub fn history_newest_first(tournaments: &[TournamentRecord]) -> Vec<&TournamentRecord> {
    let mut history: Vec<&TournamentRecord> = tournaments.iter().collect();
    history.sort_by_key(|t| Reverse(t.date));
    history
}

pub fn average_wins(player: &Player) -> f64 {
    if player.tournaments_played == 0 {
        return 0.0;
    }
    f64::from(player.total_wins) / f64::from(player.tournaments_played)
}

/// The last `window` per-tournament win counts, oldest first
pub fn recent_form(player: &Player, window: usize) -> &[u32] {
    let start = player.recent_performance.len().saturating_sub(window);
    &player.recent_performance[start..]
}

pub fn player_profile(player: &Player) -> PlayerProfile {
    let performance = player
        .recent_performance
        .iter()
        .enumerate()
        .map(|(index, wins)| PerformancePoint {
            label: format!("T{}", index + 1),
            wins: *wins,
            points: wins + 1,
        })
        .collect();

    PlayerProfile {
        player: player.clone(),
        top_hero: top_hero(&player.hero_stats).map(str::to_string),
        average_wins: average_wins(player),
        performance,
        recent_form: recent_form(player, DEFAULT_CHART_SIZE).to_vec(),
    }
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    name: &'a str,
    hero: &'a str,
    points: u32,
}

/// Compact JSON roster handed to the chat assistant as league context
pub fn league_summary(players: &[Player]) -> Result<String, serde_json::Error> {
    let lines: Vec<SummaryLine> = players
        .iter()
        .map(|p| SummaryLine {
            name: &p.name,
            hero: top_hero(&p.hero_stats).unwrap_or("none"),
            points: p.total_points,
        })
        .collect();
    serde_json::to_string(&lines)
}
