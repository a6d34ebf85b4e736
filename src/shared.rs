use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::account::{AccountService, IdentityProvider};
use crate::event::EventBus;
use crate::league::{
    generators::IdGenerator, repository::LeagueRepository, service::LeagueService, LeagueError,
};
use crate::session::TokenConfig;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub league: Arc<LeagueService>,
    pub accounts: Arc<AccountService>,
    pub token_config: TokenConfig,
    pub event_bus: EventBus,
}

impl AppState {
    pub fn new(
        repository: Arc<dyn LeagueRepository>,
        identity: Arc<dyn IdentityProvider>,
        ids: Arc<dyn IdGenerator>,
        token_config: TokenConfig,
        event_bus: EventBus,
        bootstrap_admin_email: Option<String>,
    ) -> Self {
        let league = LeagueService::builder(Arc::clone(&repository))
            .with_id_generator(ids)
            .with_event_bus(event_bus.clone())
            .build();
        let accounts = AccountService::new(repository, identity, event_bus.clone())
            .with_bootstrap_admin(bootstrap_admin_email);

        Self {
            league: Arc::new(league),
            accounts: Arc::new(accounts),
            token_config,
            event_bus,
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl From<LeagueError> for AppError {
    fn from(err: LeagueError) -> Self {
        match err {
            LeagueError::Validation(_) | LeagueError::MalformedImport(_) => {
                AppError::BadRequest(err.to_string())
            }
            LeagueError::Unauthorized(msg) => AppError::Unauthorized(msg),
            LeagueError::Forbidden(msg) => AppError::Forbidden(msg),
            LeagueError::AdminProtected(_) => AppError::Forbidden(err.to_string()),
            LeagueError::NotFound(msg) => AppError::NotFound(msg),
            LeagueError::Persistence(_) | LeagueError::PartialWrite { .. } => {
                error!(error = %err, "League write failed");
                AppError::DatabaseError(err.to_string())
            }
        }
    }
}

/// Malformed or incomplete request bodies are validation failures
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::DatabaseError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", msg),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
