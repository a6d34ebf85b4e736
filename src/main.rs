use fab_league::{
    build_router, league::generators::UuidIdGenerator, AppState, EventBus,
    InMemoryIdentityProvider, InMemoryLeagueRepository, LeagueConfig, LeagueRepository,
    PostgresLeagueRepository, TokenConfig,
};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fab_league=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting league server");
    let config = LeagueConfig::from_env()?;

    let repository: Arc<dyn LeagueRepository> = match &config.database_url {
        Some(database_url) => {
            let pool = sqlx::PgPool::connect(database_url).await?;
            let repository = PostgresLeagueRepository::new(pool);
            repository.ensure_schema().await?;
            info!("Using PostgreSQL document store");
            Arc::new(repository)
        }
        None => {
            warn!("DATABASE_URL not set, league data lives in memory only");
            Arc::new(InMemoryLeagueRepository::new())
        }
    };

    let app_state = AppState::new(
        repository,
        Arc::new(InMemoryIdentityProvider::new(Box::new(UuidIdGenerator::new()))),
        Arc::new(UuidIdGenerator::new()),
        TokenConfig::new(),
        EventBus::default(),
        config.bootstrap_admin_email.clone(),
    );

    if let Some(email) = &config.bootstrap_admin_email {
        app_state.accounts.bootstrap_admin(email).await?;
    }

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Server running on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;
    Ok(())
}
