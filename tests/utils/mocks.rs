use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use fab_league::{
    league::models::{Player, TournamentRecord},
    Account, InMemoryLeagueRepository, LeagueError, LeagueRepository,
};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// In-memory repository whose Nth `update_player` call fails, and
/// optionally every `save_account` call
pub struct FlakyRepository {
    inner: Arc<InMemoryLeagueRepository>,
    fail_update_at: Option<usize>,
    fail_account_saves: bool,
    updates: AtomicUsize,
}

impl FlakyRepository {
    pub fn new(inner: Arc<InMemoryLeagueRepository>) -> Self {
        Self {
            inner,
            fail_update_at: None,
            fail_account_saves: false,
            updates: AtomicUsize::new(0),
        }
    }

    /// 1-based index of the player update that should fail
    pub fn failing_update(mut self, nth: usize) -> Self {
        self.fail_update_at = Some(nth);
        self
    }

    pub fn failing_account_saves(mut self) -> Self {
        self.fail_account_saves = true;
        self
    }
}

#[async_trait]
impl LeagueRepository for FlakyRepository {
    async fn create_player(&self, player: &Player) -> Result<(), LeagueError> {
        self.inner.create_player(player).await
    }

    async fn update_player(&self, player: &Player) -> Result<(), LeagueError> {
        let call = self.updates.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_update_at == Some(call) {
            return Err(LeagueError::persistence("connection reset"));
        }
        self.inner.update_player(player).await
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<Player>, LeagueError> {
        self.inner.get_player(player_id).await
    }

    async fn list_players(&self) -> Result<Vec<Player>, LeagueError> {
        self.inner.list_players().await
    }

    async fn delete_player(&self, player_id: &str) -> Result<bool, LeagueError> {
        self.inner.delete_player(player_id).await
    }

    async fn create_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError> {
        self.inner.create_tournament(tournament).await
    }

    async fn restore_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError> {
        self.inner.restore_tournament(tournament).await
    }

    async fn list_tournaments(&self) -> Result<Vec<TournamentRecord>, LeagueError> {
        self.inner.list_tournaments().await
    }

    async fn save_account(&self, account: &Account) -> Result<(), LeagueError> {
        if self.fail_account_saves {
            return Err(LeagueError::persistence("account store unavailable"));
        }
        self.inner.save_account(account).await
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LeagueError> {
        self.inner.get_account(account_id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LeagueError> {
        self.inner.list_accounts().await
    }
}
