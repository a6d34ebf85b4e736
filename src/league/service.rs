use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

use super::{
    aggregation::{replay_history, stage_tournament, StagedTournament},
    backup::{parse_backup, BackupFile, ImportSummary},
    generators::{IdGenerator, UuidIdGenerator},
    models::{Player, TournamentRecord, TournamentSubmission},
    projection::{self, FormatFilter, FormatStats, HeroUsage, LeaderboardEntry, PlayerProfile},
    repository::LeagueRepository,
    LeagueError,
};
use crate::event::{EventBus, LeagueEvent};

/// Outcome of a fully committed tournament submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedTournament {
    pub tournament: TournamentRecord,
    pub players: Vec<Player>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsView {
    pub players: Vec<FormatStats>,
    pub hero_distribution: Vec<HeroUsage>,
    pub top_points: Vec<FormatStats>,
    pub top_participation: Vec<FormatStats>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub checked: usize,
    /// Players whose stored aggregates disagreed with history and were rewritten
    pub repaired: Vec<String>,
}

/// Tracks which documents of a multi-document write made it to the store
#[derive(Debug, Default)]
struct WriteLog {
    committed: Vec<String>,
    failed: Vec<String>,
    reasons: Vec<String>,
}

impl WriteLog {
    fn ok(&mut self, id: &str) {
        self.committed.push(id.to_string());
    }

    fn fail(&mut self, id: &str, err: LeagueError) {
        error!(document_id = id, error = %err, "Document write failed");
        self.failed.push(id.to_string());
        self.reasons.push(err.to_string());
    }

    /// Nothing committed collapses to a plain persistence error
    fn into_error(self) -> LeagueError {
        let reason = self.reasons.join("; ");
        if self.committed.is_empty() {
            LeagueError::Persistence(reason)
        } else {
            LeagueError::PartialWrite {
                committed: self.committed,
                failed: self.failed,
                reason,
            }
        }
    }
}

/// League operations over a document store.
///
/// Writes are issued one document at a time and awaited in order. There is
/// no cross-document transaction: a failure part-way leaves earlier writes in
/// place, and `reconcile_*` rebuilds player aggregates from history.
pub struct LeagueService {
    repository: Arc<dyn LeagueRepository>,
    ids: Arc<dyn IdGenerator>,
    event_bus: EventBus,
}

impl LeagueService {
    pub fn builder(repository: Arc<dyn LeagueRepository>) -> LeagueServiceBuilder {
        LeagueServiceBuilder::new(repository)
    }

    /// Records one tournament: creates new players, writes the record, then
    /// writes every participant's updated aggregates.
    #[instrument(skip(self, submission), fields(date = %submission.date, format = %submission.format))]
    pub async fn record_tournament(
        &self,
        submission: TournamentSubmission,
    ) -> Result<RecordedTournament, LeagueError> {
        let pool = self.repository.list_players().await?;
        let staged = stage_tournament(&submission, &pool, self.ids.as_ref())?;

        info!(
            tournament_id = %staged.tournament.id,
            new_players = staged.new_players.len(),
            participants = staged.updated_players.len(),
            "Tournament staged"
        );

        self.apply(staged).await
    }

    /// Writes new players, then the record, then participant aggregates.
    /// Unlike the earlier phases, the aggregate phase does not abort on a
    /// failed write: every participant is attempted and the misses are
    /// reported together, leaving them for `reconcile_*`.
    async fn apply(&self, staged: StagedTournament) -> Result<RecordedTournament, LeagueError> {
        let StagedTournament {
            new_players,
            tournament,
            updated_players,
        } = staged;
        let mut log = WriteLog::default();

        for player in &new_players {
            match self.repository.create_player(player).await {
                Ok(()) => log.ok(&player.id),
                Err(err) => {
                    log.fail(&player.id, err);
                    self.announce_players(&log.committed);
                    return Err(log.into_error());
                }
            }
        }

        if let Err(err) = self.repository.create_tournament(&tournament).await {
            log.fail(&tournament.id, err);
            self.announce_players(&log.committed);
            return Err(log.into_error());
        }
        log.ok(&tournament.id);
        self.event_bus.emit(LeagueEvent::TournamentRecorded {
            tournament_id: tournament.id.clone(),
        });

        let mut written_players = Vec::new();
        for player in &updated_players {
            match self.repository.update_player(player).await {
                Ok(()) => {
                    log.ok(&player.id);
                    written_players.push(player.id.clone());
                }
                Err(err) => log.fail(&player.id, err),
            }
        }
        self.announce_players(&written_players);

        if !log.failed.is_empty() {
            warn!(
                tournament_id = %tournament.id,
                failed = ?log.failed,
                "Tournament recorded but some player aggregates are stale"
            );
            return Err(log.into_error());
        }

        info!(tournament_id = %tournament.id, "Tournament recorded");
        Ok(RecordedTournament {
            tournament,
            players: updated_players,
        })
    }

    fn announce_players(&self, player_ids: &[String]) {
        if !player_ids.is_empty() {
            self.event_bus.emit(LeagueEvent::PlayersChanged {
                player_ids: player_ids.to_vec(),
            });
        }
    }

    #[instrument(skip(self))]
    pub async fn create_player(&self, name: &str) -> Result<Player, LeagueError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::validation("player name is empty"));
        }

        let player = Player::new(self.ids.generate(), name);
        self.repository.create_player(&player).await?;
        info!(player_id = %player.id, "Player created");
        self.announce_players(&[player.id.clone()]);
        Ok(player)
    }

    /// Renames a player. Name snapshots in tournament history are unchanged.
    #[instrument(skip(self))]
    pub async fn rename_player(&self, player_id: &str, name: &str) -> Result<Player, LeagueError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::validation("player name is empty"));
        }

        let mut player = self.require_player(player_id).await?;
        player.name = name.to_string();
        self.repository.update_player(&player).await?;
        self.announce_players(&[player.id.clone()]);
        Ok(player)
    }

    /// Removes a player document. Refused when an administrator account
    /// links to the player. Accounts and tournament history are not touched.
    #[instrument(skip(self))]
    pub async fn delete_player(&self, player_id: &str) -> Result<(), LeagueError> {
        let accounts = self.repository.list_accounts().await?;
        let admin_linked = accounts
            .iter()
            .any(|a| a.player_id.as_deref() == Some(player_id) && a.is_admin());
        if admin_linked {
            warn!(player_id, "Refusing to delete administrator player");
            return Err(LeagueError::AdminProtected(player_id.to_string()));
        }

        if !self.repository.delete_player(player_id).await? {
            return Err(LeagueError::NotFound(format!("player {player_id}")));
        }

        info!(player_id, "Player deleted");
        self.announce_players(&[player_id.to_string()]);
        Ok(())
    }

    async fn require_player(&self, player_id: &str) -> Result<Player, LeagueError> {
        self.repository
            .get_player(player_id)
            .await?
            .ok_or_else(|| LeagueError::NotFound(format!("player {player_id}")))
    }

    pub async fn leaderboard(&self) -> Result<Vec<LeaderboardEntry>, LeagueError> {
        let players = self.repository.list_players().await?;
        Ok(projection::leaderboard(&players))
    }

    pub async fn history(&self) -> Result<Vec<TournamentRecord>, LeagueError> {
        let tournaments = self.repository.list_tournaments().await?;
        Ok(projection::history_newest_first(&tournaments)
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn stats(&self, filter: FormatFilter) -> Result<StatsView, LeagueError> {
        let players = self.repository.list_players().await?;
        let tournaments = self.repository.list_tournaments().await?;
        let stats = projection::format_stats(&players, &tournaments, filter);

        Ok(StatsView {
            hero_distribution: projection::hero_distribution(&stats),
            top_points: projection::top_by_points(&stats, projection::DEFAULT_CHART_SIZE)
                .into_iter()
                .cloned()
                .collect(),
            top_participation: projection::top_by_participation(
                &stats,
                projection::DEFAULT_CHART_SIZE,
            )
            .into_iter()
            .cloned()
            .collect(),
            players: stats,
        })
    }

    pub async fn profile(&self, player_id: &str) -> Result<PlayerProfile, LeagueError> {
        let player = self.require_player(player_id).await?;
        Ok(projection::player_profile(&player))
    }

    /// League roster context for the chat assistant
    pub async fn assistant_context(&self) -> Result<String, LeagueError> {
        let players = self.repository.list_players().await?;
        Ok(projection::league_summary(&players)?)
    }

    /// Rebuilds one player's aggregates from tournament history and writes
    /// them back when they differ from what is stored
    #[instrument(skip(self))]
    pub async fn reconcile_player(&self, player_id: &str) -> Result<Player, LeagueError> {
        let player = self.require_player(player_id).await?;
        let tournaments = self.repository.list_tournaments().await?;
        let rebuilt = replay_history(&player, &tournaments);

        if !rebuilt.same_aggregates(&player) {
            info!(player_id, "Repairing player aggregates from history");
            self.repository.update_player(&rebuilt).await?;
            self.announce_players(&[player_id.to_string()]);
        }
        Ok(rebuilt)
    }

    #[instrument(skip(self))]
    pub async fn reconcile_all(&self) -> Result<ReconcileReport, LeagueError> {
        let players = self.repository.list_players().await?;
        let tournaments = self.repository.list_tournaments().await?;
        let mut report = ReconcileReport {
            checked: players.len(),
            ..ReconcileReport::default()
        };

        for player in &players {
            let rebuilt = replay_history(player, &tournaments);
            if rebuilt.same_aggregates(player) {
                continue;
            }
            debug!(player_id = %player.id, "Player aggregates disagree with history");
            self.repository.update_player(&rebuilt).await?;
            report.repaired.push(player.id.clone());
        }

        self.announce_players(&report.repaired);
        info!(
            checked = report.checked,
            repaired = report.repaired.len(),
            "Reconciliation finished"
        );
        Ok(report)
    }

    pub async fn export_backup(&self, taken_at: DateTime<Utc>) -> Result<BackupFile, LeagueError> {
        Ok(BackupFile::new(
            self.repository.list_players().await?,
            self.repository.list_accounts().await?,
            self.repository.list_tournaments().await?,
            taken_at,
        ))
    }

    /// Validates a backup, then overwrites every record it contains.
    /// Not transactional; a failure stops the import where it is, and
    /// subscribers still hear about whatever was overwritten before it.
    #[instrument(skip(self, raw))]
    pub async fn import_backup(&self, raw: &str) -> Result<ImportSummary, LeagueError> {
        let backup = parse_backup(raw)?;
        let summary = backup.summary();
        info!(?summary, "Importing backup");

        let mut log = WriteLog::default();
        self.write_backup(&backup, &mut log).await;
        if !log.committed.is_empty() {
            self.event_bus.emit(LeagueEvent::DataImported);
        }
        if !log.failed.is_empty() {
            warn!(committed = log.committed.len(), "Backup import stopped part-way");
            return Err(log.into_error());
        }
        Ok(summary)
    }

    /// Stops at the first failed write
    async fn write_backup(&self, backup: &BackupFile, log: &mut WriteLog) {
        for player in &backup.players {
            if let Err(err) = self.repository.create_player(player).await {
                return log.fail(&player.id, err);
            }
            log.ok(&player.id);
        }
        for account in &backup.users {
            if let Err(err) = self.repository.save_account(account).await {
                return log.fail(&account.id, err);
            }
            log.ok(&account.id);
        }
        for tournament in &backup.tournaments {
            if let Err(err) = self.repository.restore_tournament(tournament).await {
                return log.fail(&tournament.id, err);
            }
            log.ok(&tournament.id);
        }
    }
}

pub struct LeagueServiceBuilder {
    repository: Arc<dyn LeagueRepository>,
    ids: Arc<dyn IdGenerator>,
    event_bus: EventBus,
}

impl LeagueServiceBuilder {
    fn new(repository: Arc<dyn LeagueRepository>) -> Self {
        Self {
            repository,
            ids: Arc::new(UuidIdGenerator::new()),
            event_bus: EventBus::default(),
        }
    }

    pub fn with_id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = ids;
        self
    }

    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = event_bus;
        self
    }

    pub fn build(self) -> LeagueService {
        LeagueService {
            repository: self.repository,
            ids: self.ids,
            event_bus: self.event_bus,
        }
    }
}
