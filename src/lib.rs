// Library crate for the league server
// This file exposes the public API for the binary and integration tests

pub mod account;
pub mod config;
pub mod event;
pub mod league;
pub mod session;
pub mod shared;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

// Re-export commonly used types for easier access in tests
pub use account::{Account, AccountService, IdentityProvider, InMemoryIdentityProvider, Role};
pub use config::LeagueConfig;
pub use event::{EventBus, LeagueEvent};
pub use league::{
    repository::{InMemoryLeagueRepository, LeagueRepository, PostgresLeagueRepository},
    LeagueError, LeagueService,
};
pub use session::{SessionClaims, TokenConfig};
pub use shared::{AppError, AppState};

/// Builds the HTTP router. Reads are public; writes require a bearer token
/// and, except for registration, an ADMIN account.
pub fn build_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(league::health))
        .route("/catalog", get(league::catalog))
        .route("/leaderboard", get(league::leaderboard))
        .route("/stats", get(league::stats))
        .route("/tournaments", get(league::history))
        .route("/players/:id", get(league::player_profile))
        .route("/assistant/context", get(league::assistant_context))
        .route("/events", get(league::events));

    let authenticated = Router::new()
        .route("/accounts/register", post(account::register))
        .route("/tournaments", post(league::record_tournament))
        .route("/players", post(league::create_player))
        .route(
            "/players/:id",
            put(league::rename_player).delete(league::delete_player),
        )
        .route("/players/:id/account", put(account::link_account))
        .route("/players/:id/reconcile", post(league::reconcile_player))
        .route("/reconcile", post(league::reconcile_all))
        .route(
            "/backup",
            get(league::export_backup).post(league::import_backup),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            session::jwt_auth,
        ));

    public
        .merge(authenticated)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
