use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request, header};
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;

use meridian_auth::PrincipalRecord;

use crate::app::AppState;
use crate::context::PrincipalContext;
use crate::errors::ApiError;

pub(crate) const NO_TOKEN: &str = "No token provided";
pub(crate) const INVALID_TOKEN: &str = "Invalid token";

/// Authenticate the request and attach the resolved principal.
///
/// Every rejection is a 401 with one of two terse bodies; forged, expired,
/// unknown-subject, and deactivated-account failures are deliberately
/// indistinguishable from each other.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer(req.headers())?;

    let claims = state
        .codec
        .verify(token, Utc::now())
        .map_err(|_| ApiError::Unauthenticated(INVALID_TOKEN))?;

    // Fresh lookup on every request: role changes and deactivations take
    // effect immediately, not at token expiry.
    let principal = state
        .stores
        .find_principal(claims.sub)
        .await?
        .and_then(PrincipalRecord::resolve)
        .ok_or(ApiError::Unauthenticated(INVALID_TOKEN))?;

    req.extensions_mut().insert(PrincipalContext::new(principal));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(header::AUTHORIZATION)
        .ok_or(ApiError::Unauthenticated(NO_TOKEN))?;

    let header = header
        .to_str()
        .map_err(|_| ApiError::Unauthenticated(INVALID_TOKEN))?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthenticated(INVALID_TOKEN))?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ApiError::Unauthenticated(INVALID_TOKEN));
    }

    Ok(token)
}
