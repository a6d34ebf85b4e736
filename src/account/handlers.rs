use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::{info, instrument};

use super::{
    models::Account,
    types::{LinkAccountRequest, RegisterRequest},
};
use crate::session::SessionClaims;
use crate::shared::{AppError, AppState};

/// POST /accounts/register
/// Creates a PLAYER account and its player for the signed-in identity
#[instrument(name = "register_account", skip(state, claims, payload), fields(subject = %claims.sub))]
pub async fn register(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Account>), AppError> {
    let Json(request) = payload?;
    let account = state.accounts.register(&claims, &request.name).await?;
    info!(account_id = %account.id, "Registration complete");
    Ok((StatusCode::CREATED, Json(account)))
}

/// PUT /players/{id}/account (admin)
#[instrument(name = "link_account", skip(state, claims, payload))]
pub async fn link_account(
    State(state): State<AppState>,
    Extension(claims): Extension<SessionClaims>,
    Path(player_id): Path<String>,
    payload: Result<Json<LinkAccountRequest>, JsonRejection>,
) -> Result<Json<Account>, AppError> {
    state.accounts.require_admin(&claims).await?;
    let Json(request) = payload?;
    let account = state.accounts.link_account(&player_id, request).await?;
    Ok(Json(account))
}
