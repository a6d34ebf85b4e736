use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::{
    identity::IdentityProvider,
    models::{Account, Role},
    types::LinkAccountRequest,
};
use crate::event::{EventBus, LeagueEvent};
use crate::league::{models::Player, repository::LeagueRepository, LeagueError};
use crate::session::SessionClaims;

/// Account lookups, role checks and the account side of player lifecycle
pub struct AccountService {
    repository: Arc<dyn LeagueRepository>,
    identity: Arc<dyn IdentityProvider>,
    event_bus: EventBus,
    bootstrap_admin_email: Option<String>,
}

impl AccountService {
    pub fn new(
        repository: Arc<dyn LeagueRepository>,
        identity: Arc<dyn IdentityProvider>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            repository,
            identity,
            event_bus,
            bootstrap_admin_email: None,
        }
    }

    /// Accounts registering with this email start as ADMIN
    pub fn with_bootstrap_admin(mut self, email: Option<String>) -> Self {
        self.bootstrap_admin_email = email;
        self
    }

    fn is_bootstrap_admin(&self, email: &str) -> bool {
        self.bootstrap_admin_email
            .as_deref()
            .is_some_and(|admin| admin.eq_ignore_ascii_case(email))
    }

    pub async fn current_account(&self, claims: &SessionClaims) -> Result<Account, LeagueError> {
        self.repository
            .get_account(&claims.sub)
            .await?
            .ok_or_else(|| LeagueError::Unauthorized("no account for this identity".to_string()))
    }

    /// Resolves the caller's account and fails unless it is an administrator
    #[instrument(skip(self, claims), fields(subject = %claims.sub))]
    pub async fn require_admin(&self, claims: &SessionClaims) -> Result<Account, LeagueError> {
        let account = self.current_account(claims).await?;
        if !account.is_admin() {
            warn!("Administrator operation refused");
            return Err(LeagueError::Forbidden(
                "administrator role required".to_string(),
            ));
        }
        Ok(account)
    }

    /// Sign-up for an authenticated identity: an account plus a player
    /// document sharing the subject id. A player already stored under that
    /// id is linked as-is. Registering twice returns the existing account.
    #[instrument(skip(self, claims), fields(subject = %claims.sub))]
    pub async fn register(&self, claims: &SessionClaims, name: &str) -> Result<Account, LeagueError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LeagueError::validation("player name is empty"));
        }
        if let Some(existing) = self.repository.get_account(&claims.sub).await? {
            return Ok(existing);
        }

        let (player, created) = match self.repository.get_player(&claims.sub).await? {
            Some(existing) => {
                debug!(player_id = %existing.id, "Linking registration to existing player");
                (existing, false)
            }
            None => {
                let player = Player::new(claims.sub.clone(), name);
                self.repository.create_player(&player).await?;
                (player, true)
            }
        };

        let role = if self.is_bootstrap_admin(&claims.email) {
            Role::Admin
        } else {
            Role::Player
        };
        let account = Account::new(claims.sub.clone(), claims.email.clone(), role)
            .linked_to(player.id.clone());
        self.repository.save_account(&account).await?;

        info!(player_id = %player.id, "Account registered");
        if created {
            self.event_bus.emit(LeagueEvent::PlayersChanged {
                player_ids: vec![player.id],
            });
        }
        self.event_bus.emit(LeagueEvent::AccountsChanged);
        Ok(account)
    }

    /// Sets email and role on the account linked to a player, creating the
    /// identity and account when the player has none
    #[instrument(skip(self, request), fields(email = %request.email, is_admin = request.is_admin))]
    pub async fn link_account(
        &self,
        player_id: &str,
        request: LinkAccountRequest,
    ) -> Result<Account, LeagueError> {
        let email = request.email.trim();
        if email.is_empty() {
            return Err(LeagueError::validation("email is empty"));
        }
        if self.repository.get_player(player_id).await?.is_none() {
            return Err(LeagueError::NotFound(format!("player {player_id}")));
        }
        let role = if request.is_admin {
            Role::Admin
        } else {
            Role::Player
        };

        let accounts = self.repository.list_accounts().await?;
        let account = match accounts
            .into_iter()
            .find(|a| a.player_id.as_deref() == Some(player_id))
        {
            Some(mut account) => {
                account.email = email.to_string();
                account.role = role;
                account
            }
            None => {
                let credential = request.credential.as_deref().ok_or_else(|| {
                    LeagueError::validation("a credential is required to create a new account")
                })?;
                let subject = self.identity.create_user(email, credential).await?;
                Account::new(subject, email, role).linked_to(player_id)
            }
        };

        self.repository.save_account(&account).await?;
        info!(account_id = %account.id, role = %account.role, "Account linked");
        self.event_bus.emit(LeagueEvent::AccountsChanged);
        Ok(account)
    }

    /// Promotes the account with `email` to ADMIN, if it exists
    #[instrument(skip(self))]
    pub async fn bootstrap_admin(&self, email: &str) -> Result<Option<Account>, LeagueError> {
        let accounts = self.repository.list_accounts().await?;
        let Some(mut account) = accounts
            .into_iter()
            .find(|a| a.email.eq_ignore_ascii_case(email))
        else {
            warn!("Bootstrap administrator has no account yet");
            return Ok(None);
        };

        if !account.is_admin() {
            account.role = Role::Admin;
            self.repository.save_account(&account).await?;
            info!(account_id = %account.id, "Bootstrap administrator promoted");
        }
        Ok(Some(account))
    }
}
