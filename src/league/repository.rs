use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{types::Json, PgPool, Row};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use super::{
    models::{Player, TournamentRecord},
    LeagueError,
};
use crate::account::models::Account;

pub const PLAYERS: &str = "players";
pub const TOURNAMENTS: &str = "tournaments";
pub const USERS: &str = "users";

/// Document store for the three league collections.
///
/// Every method touches exactly one document; there is no multi-document
/// transaction. `create_*` overwrites, `update_player` merges top-level keys,
/// `create_tournament` refuses to replace an existing record.
#[async_trait]
pub trait LeagueRepository: Send + Sync {
    async fn create_player(&self, player: &Player) -> Result<(), LeagueError>;
    async fn update_player(&self, player: &Player) -> Result<(), LeagueError>;
    async fn get_player(&self, player_id: &str) -> Result<Option<Player>, LeagueError>;
    async fn list_players(&self) -> Result<Vec<Player>, LeagueError>;
    async fn delete_player(&self, player_id: &str) -> Result<bool, LeagueError>;

    async fn create_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError>;
    /// Overwriting write used only by backup restore
    async fn restore_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError>;
    async fn list_tournaments(&self) -> Result<Vec<TournamentRecord>, LeagueError>;

    async fn save_account(&self, account: &Account) -> Result<(), LeagueError>;
    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LeagueError>;
    async fn list_accounts(&self) -> Result<Vec<Account>, LeagueError>;
}

/// Ordered set of JSON documents keyed by id
#[derive(Debug, Default)]
struct Collection {
    order: Vec<String>,
    docs: HashMap<String, Map<String, Value>>,
}

impl Collection {
    fn set(&mut self, id: &str, doc: Map<String, Value>) {
        if self.docs.insert(id.to_string(), doc).is_none() {
            self.order.push(id.to_string());
        }
    }

    fn merge(&mut self, id: &str, doc: Map<String, Value>) {
        match self.docs.get_mut(id) {
            Some(existing) => existing.extend(doc),
            None => self.set(id, doc),
        }
    }

    fn remove(&mut self, id: &str) -> bool {
        let removed = self.docs.remove(id).is_some();
        if removed {
            self.order.retain(|existing| existing != id);
        }
        removed
    }

    fn get<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, LeagueError> {
        self.docs
            .get(id)
            .map(|doc| serde_json::from_value(Value::Object(doc.clone())))
            .transpose()
            .map_err(LeagueError::from)
    }

    fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, LeagueError> {
        self.order
            .iter()
            .filter_map(|id| self.docs.get(id))
            .map(|doc| serde_json::from_value(Value::Object(doc.clone())).map_err(Into::into))
            .collect()
    }
}

fn to_document<T: Serialize>(value: &T) -> Result<Map<String, Value>, LeagueError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(LeagueError::persistence(format!(
            "expected a JSON object document, got {other}"
        ))),
    }
}

/// In-memory implementation of LeagueRepository for development and testing
///
/// Documents are kept as JSON objects so merge writes behave like the hosted
/// store: keys present in the update replace, keys absent are left alone.
#[derive(Debug, Default)]
pub struct InMemoryLeagueRepository {
    players: RwLock<Collection>,
    tournaments: RwLock<Collection>,
    users: RwLock<Collection>,
}

impl InMemoryLeagueRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a repository pre-populated with players, in the given order
    pub fn with_players(players: Vec<Player>) -> Result<Self, LeagueError> {
        let mut collection = Collection::default();
        for player in &players {
            collection.set(&player.id, to_document(player)?);
        }
        Ok(Self {
            players: RwLock::new(collection),
            ..Self::default()
        })
    }

    pub async fn player_count(&self) -> usize {
        self.players.read().await.order.len()
    }

    pub async fn tournament_count(&self) -> usize {
        self.tournaments.read().await.order.len()
    }
}

#[async_trait]
impl LeagueRepository for InMemoryLeagueRepository {
    #[instrument(skip(self, player), fields(player_id = %player.id))]
    async fn create_player(&self, player: &Player) -> Result<(), LeagueError> {
        debug!("Writing player document in memory");
        let doc = to_document(player)?;
        self.players.write().await.set(&player.id, doc);
        Ok(())
    }

    #[instrument(skip(self, player), fields(player_id = %player.id))]
    async fn update_player(&self, player: &Player) -> Result<(), LeagueError> {
        debug!("Merging player document in memory");
        let doc = to_document(player)?;
        self.players.write().await.merge(&player.id, doc);
        Ok(())
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<Player>, LeagueError> {
        self.players.read().await.get(player_id)
    }

    async fn list_players(&self) -> Result<Vec<Player>, LeagueError> {
        self.players.read().await.list()
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<bool, LeagueError> {
        let removed = self.players.write().await.remove(player_id);
        if !removed {
            warn!(player_id, "Player not found for deletion in memory");
        }
        Ok(removed)
    }

    #[instrument(skip(self, tournament), fields(tournament_id = %tournament.id))]
    async fn create_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError> {
        let doc = to_document(tournament)?;
        let mut tournaments = self.tournaments.write().await;
        if tournaments.docs.contains_key(&tournament.id) {
            warn!("Tournament already exists in memory");
            return Err(LeagueError::persistence(format!(
                "tournament {} already exists",
                tournament.id
            )));
        }
        tournaments.set(&tournament.id, doc);
        debug!("Tournament record created in memory");
        Ok(())
    }

    async fn restore_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError> {
        let doc = to_document(tournament)?;
        self.tournaments.write().await.set(&tournament.id, doc);
        Ok(())
    }

    async fn list_tournaments(&self) -> Result<Vec<TournamentRecord>, LeagueError> {
        self.tournaments.read().await.list()
    }

    async fn save_account(&self, account: &Account) -> Result<(), LeagueError> {
        let doc = to_document(account)?;
        self.users.write().await.set(&account.id, doc);
        Ok(())
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LeagueError> {
        self.users.read().await.get(account_id)
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LeagueError> {
        self.users.read().await.list()
    }
}

/// How a document write treats an existing document with the same id
#[derive(Debug, Clone, Copy)]
enum WriteMode {
    Set,
    Merge,
    CreateOnly,
}

/// PostgreSQL implementation storing each collection as JSONB documents
pub struct PostgresLeagueRepository {
    pool: PgPool,
}

impl PostgresLeagueRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Creates the documents table when missing
    pub async fn ensure_schema(&self) -> Result<(), LeagueError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS league_documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                body JSONB NOT NULL,
                seq BIGSERIAL,
                PRIMARY KEY (collection, id)
            )",
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self, doc))]
    async fn write<T: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
        mode: WriteMode,
    ) -> Result<(), LeagueError> {
        let statement = match mode {
            WriteMode::Set => {
                "INSERT INTO league_documents (collection, id, body) VALUES ($1, $2, $3)
                 ON CONFLICT (collection, id) DO UPDATE SET body = EXCLUDED.body"
            }
            WriteMode::Merge => {
                "INSERT INTO league_documents (collection, id, body) VALUES ($1, $2, $3)
                 ON CONFLICT (collection, id) DO UPDATE SET body = league_documents.body || EXCLUDED.body"
            }
            WriteMode::CreateOnly => {
                "INSERT INTO league_documents (collection, id, body) VALUES ($1, $2, $3)
                 ON CONFLICT (collection, id) DO NOTHING"
            }
        };

        let result = sqlx::query(statement)
            .bind(collection)
            .bind(id)
            .bind(Json(doc))
            .execute(&self.pool)
            .await
            .map_err(|e| {
                warn!(error = %e, "Failed to write document");
                LeagueError::from(e)
            })?;

        if matches!(mode, WriteMode::CreateOnly) && result.rows_affected() == 0 {
            return Err(LeagueError::persistence(format!(
                "{collection}/{id} already exists"
            )));
        }

        debug!("Document written to database");
        Ok(())
    }

    async fn read<T: DeserializeOwned + Send + Unpin + 'static>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, LeagueError> {
        let row = sqlx::query("SELECT body FROM league_documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|row| row.try_get::<Json<T>, _>("body").map(|body| body.0))
            .transpose()
            .map_err(LeagueError::from)
    }

    async fn read_all<T: DeserializeOwned + Send + Unpin + 'static>(
        &self,
        collection: &str,
    ) -> Result<Vec<T>, LeagueError> {
        let rows =
            sqlx::query("SELECT body FROM league_documents WHERE collection = $1 ORDER BY seq")
                .bind(collection)
                .fetch_all(&self.pool)
                .await?;

        rows.iter()
            .map(|row| {
                row.try_get::<Json<T>, _>("body")
                    .map(|body| body.0)
                    .map_err(LeagueError::from)
            })
            .collect()
    }
}

#[async_trait]
impl LeagueRepository for PostgresLeagueRepository {
    async fn create_player(&self, player: &Player) -> Result<(), LeagueError> {
        self.write(PLAYERS, &player.id, player, WriteMode::Set).await
    }

    async fn update_player(&self, player: &Player) -> Result<(), LeagueError> {
        self.write(PLAYERS, &player.id, player, WriteMode::Merge)
            .await
    }

    async fn get_player(&self, player_id: &str) -> Result<Option<Player>, LeagueError> {
        self.read(PLAYERS, player_id).await
    }

    async fn list_players(&self) -> Result<Vec<Player>, LeagueError> {
        self.read_all(PLAYERS).await
    }

    #[instrument(skip(self))]
    async fn delete_player(&self, player_id: &str) -> Result<bool, LeagueError> {
        let result = sqlx::query("DELETE FROM league_documents WHERE collection = $1 AND id = $2")
            .bind(PLAYERS)
            .bind(player_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn create_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError> {
        self.write(TOURNAMENTS, &tournament.id, tournament, WriteMode::CreateOnly)
            .await
    }

    async fn restore_tournament(&self, tournament: &TournamentRecord) -> Result<(), LeagueError> {
        self.write(TOURNAMENTS, &tournament.id, tournament, WriteMode::Set)
            .await
    }

    async fn list_tournaments(&self) -> Result<Vec<TournamentRecord>, LeagueError> {
        self.read_all(TOURNAMENTS).await
    }

    async fn save_account(&self, account: &Account) -> Result<(), LeagueError> {
        self.write(USERS, &account.id, account, WriteMode::Set).await
    }

    async fn get_account(&self, account_id: &str) -> Result<Option<Account>, LeagueError> {
        self.read(USERS, account_id).await
    }

    async fn list_accounts(&self) -> Result<Vec<Account>, LeagueError> {
        self.read_all(USERS).await
    }
}
