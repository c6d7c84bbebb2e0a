//! Token refresh: single-use rotation of the long-lived credential.

use axum::Json;
use axum::extract::State;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use meridian_auth::{AccessClaims, PrincipalRecord, RefreshToken};

use crate::app::AppState;
use crate::errors::ApiError;

const INVALID_REFRESH: &str = "Invalid refresh token";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    refresh_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    access_token: String,
    refresh_token: String,
    expires_in_secs: i64,
}

/// Exchange a refresh token for a fresh access token.
///
/// The record is consumed before any other check, so a failed exchange
/// still burns the token: no replay, no sliding window.
pub async fn refresh(
    State(state): State<AppState>,
    Json(body): Json<RefreshRequest>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let now = Utc::now();

    let record = state
        .stores
        .consume_refresh_token(&body.refresh_token)
        .await?
        .ok_or(ApiError::Unauthenticated(INVALID_REFRESH))?;

    if record.is_expired(now) {
        return Err(ApiError::Unauthenticated(INVALID_REFRESH));
    }

    let principal = state
        .stores
        .find_principal(record.user_id)
        .await?
        .and_then(PrincipalRecord::resolve)
        .ok_or(ApiError::Unauthenticated(INVALID_REFRESH))?;

    let claims = AccessClaims::new(principal.id, now, state.config.access_token_ttl);
    let access_token = state
        .codec
        .issue(&claims)
        .map_err(|e| ApiError::Internal(e.into()))?;

    let rotated = RefreshToken::issue(principal.id, state.config.refresh_token_ttl, now);
    state.stores.insert_refresh_token(&rotated).await?;

    tracing::debug!(principal = %principal.id, "refresh token rotated");

    Ok(Json(RefreshResponse {
        access_token,
        refresh_token: rotated.token,
        expires_in_secs: state.config.access_token_ttl.num_seconds(),
    }))
}
