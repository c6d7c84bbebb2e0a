//! Route-level gates: role allow-list first, then row-level ownership.
//!
//! The role gate answers "can this role ever do this kind of thing"; the
//! ownership gate answers "can this specific principal touch this specific
//! row". Both run, in that order, before any handler.

use axum::Extension;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use meridian_auth::{OwnershipError, evaluate_ownership};
use meridian_core::ResourceId;

use crate::app::AppState;
use crate::context::PrincipalContext;
use crate::errors::ApiError;
use crate::policy::ResourcePolicy;

/// State for [`role_gate`].
#[derive(Clone)]
pub struct RoleGate {
    pub policy: &'static ResourcePolicy,
    /// Whether the gated routes are item routes (`/:id`).
    pub item_route: bool,
}

/// Reject requests whose role is not in the route's allow-list.
pub async fn role_gate(
    State(gate): State<RoleGate>,
    Extension(ctx): Extension<PrincipalContext>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = ctx.principal();
    let allowed = gate.policy.allowed(req.method(), gate.item_route);

    if !allowed.contains(&principal.role) {
        tracing::debug!(
            principal = %principal.id,
            role = %principal.role,
            kind = %gate.policy.kind,
            method = %req.method(),
            "role gate denied",
        );
        return Err(ApiError::Forbidden("Insufficient role"));
    }

    Ok(next.run(req).await)
}

/// State for [`ownership_gate`].
#[derive(Clone)]
pub struct OwnershipGate {
    pub app: AppState,
    pub policy: &'static ResourcePolicy,
}

/// Row-level gate for item routes.
///
/// Elevated roles pass before the id is even parsed; everyone else costs
/// one partial-row read. The handler behind this gate still performs its
/// own full read and must not assume this one loaded anything for it.
pub async fn ownership_gate(
    State(gate): State<OwnershipGate>,
    Extension(ctx): Extension<PrincipalContext>,
    path_id: Option<Path<String>>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let principal = ctx.principal();

    if principal.role.is_elevated() {
        return Ok(next.run(req).await);
    }

    let Some(Path(raw_id)) = path_id else {
        return Err(ApiError::BadRequest("Resource id required"));
    };
    let id: ResourceId = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid resource id"))?;

    let projection = gate
        .app
        .stores
        .ownership_projection(gate.policy.kind, id)
        .await?;

    match evaluate_ownership(principal, projection.as_ref()) {
        Ok(grant) => {
            tracing::debug!(
                principal = %principal.id,
                kind = %gate.policy.kind,
                id = %id,
                grant = ?grant,
                "ownership gate allowed",
            );
            Ok(next.run(req).await)
        }
        Err(OwnershipError::NotFound) => Err(ApiError::NotFound("Resource not found")),
        Err(OwnershipError::NoAccess) => {
            tracing::debug!(
                principal = %principal.id,
                role = %principal.role,
                kind = %gate.policy.kind,
                id = %id,
                "ownership gate denied",
            );
            Err(ApiError::Forbidden("No access to this resource"))
        }
    }
}
