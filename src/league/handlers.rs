use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Extension, Json,
};
use chrono::Utc;
use futures::stream::{self, Stream};
use std::str::FromStr;
use strum::IntoEnumIterator;
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, instrument, warn};

use super::{
    backup::{BackupFile, ImportSummary},
    models::{Player, TournamentFormat, TournamentSubmission, HEROES},
    projection::{FormatFilter, LeaderboardEntry, PlayerProfile},
    service::{ReconcileReport, RecordedTournament, StatsView},
    types::{AssistantContext, Catalog, HistoryEntry, PlayerNameRequest, StatsQuery},
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};

pub async fn health() -> &'static str {
    "ok"
}

/// GET /catalog
pub async fn catalog() -> Json<Catalog> {
    Json(Catalog {
        heroes: HEROES,
        formats: TournamentFormat::iter().collect(),
    })
}

/// GET /leaderboard
pub async fn leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    Ok(Json(state.league.leaderboard().await?))
}

/// GET /stats?format=ALL|CC|Sage|Limitado
#[instrument(skip(state))]
pub async fn stats(
    State(state): State<AppState>,
    Query(query): Query<StatsQuery>,
) -> Result<Json<StatsView>, AppError> {
    let filter = match query.format.as_deref() {
        None => FormatFilter::All,
        Some(raw) => FormatFilter::from_str(raw)
            .map_err(|_| AppError::BadRequest(format!("unknown format `{raw}`")))?,
    };
    Ok(Json(state.league.stats(filter).await?))
}

/// GET /tournaments
pub async fn history(State(state): State<AppState>) -> Result<Json<Vec<HistoryEntry>>, AppError> {
    let history = state.league.history().await?;
    Ok(Json(history.into_iter().map(HistoryEntry::from).collect()))
}

/// GET /players/{id}
pub async fn player_profile(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Result<Json<PlayerProfile>, AppError> {
    Ok(Json(state.league.profile(&player_id).await?))
}

/// GET /assistant/context
pub async fn assistant_context(
    State(state): State<AppState>,
) -> Result<Json<AssistantContext>, AppError> {
    let roster = state.league.assistant_context().await?;
    Ok(Json(AssistantContext { roster }))
}

/// GET /events
/// Server-sent stream of committed-write notifications
pub async fn events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, axum::Error>>> {
    let receiver = state.event_bus.subscribe();
    info!("Live event subscriber connected");

    let stream = stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    let sse = Event::default().event(event.event_type()).json_data(&event);
                    return Some((sse, receiver));
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Live event subscriber lagged");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// POST /tournaments (admin)
#[instrument(skip(state, claims, payload), fields(subject = %claims.sub))]
pub async fn record_tournament(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    payload: Result<Json<TournamentSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<RecordedTournament>), AppError> {
    state.accounts.require_admin(&claims).await?;
    let Json(submission) = payload?;
    let recorded = state.league.record_tournament(submission).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// POST /players (admin)
pub async fn create_player(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    payload: Result<Json<PlayerNameRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Player>), AppError> {
    state.accounts.require_admin(&claims).await?;
    let Json(request) = payload?;
    let player = state.league.create_player(&request.name).await?;
    Ok((StatusCode::CREATED, Json(player)))
}

/// PUT /players/{id} (admin)
pub async fn rename_player(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(player_id): Path<String>,
    payload: Result<Json<PlayerNameRequest>, JsonRejection>,
) -> Result<Json<Player>, AppError> {
    state.accounts.require_admin(&claims).await?;
    let Json(request) = payload?;
    Ok(Json(
        state.league.rename_player(&player_id, &request.name).await?,
    ))
}

/// DELETE /players/{id} (admin)
pub async fn delete_player(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(player_id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.accounts.require_admin(&claims).await?;
    state.league.delete_player(&player_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /players/{id}/reconcile (admin)
pub async fn reconcile_player(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(player_id): Path<String>,
) -> Result<Json<Player>, AppError> {
    state.accounts.require_admin(&claims).await?;
    Ok(Json(state.league.reconcile_player(&player_id).await?))
}

/// POST /reconcile (admin)
pub async fn reconcile_all(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<Json<ReconcileReport>, AppError> {
    state.accounts.require_admin(&claims).await?;
    Ok(Json(state.league.reconcile_all().await?))
}

/// GET /backup (admin)
#[instrument(skip(state, claims), fields(subject = %claims.sub))]
pub async fn export_backup(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
) -> Result<impl IntoResponse, AppError> {
    state.accounts.require_admin(&claims).await?;
    let now = Utc::now();
    let backup = state.league.export_backup(now).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        BackupFile::file_name(now)
    );
    Ok(([(header::CONTENT_DISPOSITION, disposition)], Json(backup)))
}

/// POST /backup (admin)
/// Body is the raw backup document; it is validated before anything is written
#[instrument(skip(state, claims, body), fields(subject = %claims.sub, bytes = body.len()))]
pub async fn import_backup(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    body: String,
) -> Result<Json<ImportSummary>, AppError> {
    state.accounts.require_admin(&claims).await?;
    Ok(Json(state.league.import_backup(&body).await?))
}
