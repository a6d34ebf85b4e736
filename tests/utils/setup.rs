use chrono::NaiveDate;
use std::sync::Arc;

use fab_league::{
    league::{
        generators::SequentialIdGenerator,
        models::{NewPlayerSpec, Player, TournamentFormat, TournamentResult, TournamentSubmission},
    },
    AppState, EventBus, InMemoryIdentityProvider, InMemoryLeagueRepository, LeagueRepository,
    LeagueService, TokenConfig,
};

use super::mocks::FlakyRepository;

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

pub const TEST_SECRET: &str = "integration-secret";

pub struct TestSetup {
    pub store: Arc<InMemoryLeagueRepository>,
    pub service: LeagueService,
    pub event_bus: EventBus,
}

pub struct TestSetupBuilder {
    players: Vec<Player>,
    fail_update_at: Option<usize>,
    fail_account_saves: bool,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            players: vec![],
            fail_update_at: None,
            fail_account_saves: false,
        }
    }

    pub fn with_player(mut self, player: Player) -> Self {
        self.players.push(player);
        self
    }

    pub fn with_players(mut self, players: Vec<Player>) -> Self {
        self.players.extend(players);
        self
    }

    /// Make the Nth player update (1-based) fail
    pub fn failing_player_update(mut self, nth: usize) -> Self {
        self.fail_update_at = Some(nth);
        self
    }

    pub fn failing_account_saves(mut self) -> Self {
        self.fail_account_saves = true;
        self
    }

    pub fn build(self) -> TestSetup {
        let store = Arc::new(
            InMemoryLeagueRepository::with_players(self.players).expect("seed players"),
        );
        let mut flaky = FlakyRepository::new(store.clone());
        if let Some(nth) = self.fail_update_at {
            flaky = flaky.failing_update(nth);
        }
        if self.fail_account_saves {
            flaky = flaky.failing_account_saves();
        }
        let repository: Arc<dyn LeagueRepository> = Arc::new(flaky);

        let event_bus = EventBus::new(1000);
        let service = LeagueService::builder(repository)
            .with_id_generator(Arc::new(SequentialIdGenerator::new("gen")))
            .with_event_bus(event_bus.clone())
            .build();

        TestSetup {
            store,
            service,
            event_bus,
        }
    }

    /// Full HTTP application state over a fresh in-memory store
    pub fn build_app_state(self) -> (AppState, Arc<InMemoryLeagueRepository>) {
        let store = Arc::new(
            InMemoryLeagueRepository::with_players(self.players).expect("seed players"),
        );
        let state = AppState::new(
            store.clone(),
            Arc::new(InMemoryIdentityProvider::new(Box::new(
                SequentialIdGenerator::new("uid"),
            ))),
            Arc::new(SequentialIdGenerator::new("gen")),
            TokenConfig::with_secret(TEST_SECRET, 1),
            EventBus::new(1000),
            Some("boss@example.com".to_string()),
        );
        (state, store)
    }
}

// ============================================================================
// Builders
// ============================================================================

/// Player with the given per-tournament wins already applied
pub fn seeded_player(id: &str, name: &str, wins: &[u32], hero: &str) -> Player {
    let mut player = Player::new(id, name);
    for w in wins {
        player.apply_result(*w, hero);
    }
    player
}

pub fn result(player_id: &str, wins: u32, hero: &str) -> TournamentResult {
    TournamentResult {
        player_id: player_id.to_string(),
        wins,
        hero_played: hero.to_string(),
    }
}

pub fn submission(
    date: &str,
    format: TournamentFormat,
    results: Vec<TournamentResult>,
    new_players: Vec<NewPlayerSpec>,
) -> TournamentSubmission {
    TournamentSubmission {
        date: NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("test date"),
        format,
        results,
        new_players,
    }
}
