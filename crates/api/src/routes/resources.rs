//! Generic CRUD surface over opaque, ownership-checked records.
//!
//! Every resource kind shares these handlers; what differs per kind is
//! data: the policy row and the storage collection behind it.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Extension, Json, Router};
use chrono::Utc;
use serde::Deserialize;

use meridian_auth::ListScope;
use meridian_core::{ClientId, ResourceId};
use meridian_infra::ResourceRecord;

use crate::app::AppState;
use crate::authz::{self, OwnershipGate, RoleGate};
use crate::context::PrincipalContext;
use crate::errors::ApiError;
use crate::policy::ResourcePolicy;

/// Build the router for one resource surface.
///
/// Routes are declared with absolute paths and merged, so `/leads` and
/// `/leads/:id` match exactly as written. Gate order per route:
/// authentication (applied once in `app`), role allow-list, then row-level
/// ownership on item routes.
pub fn resource_router(policy: &'static ResourcePolicy, state: &AppState) -> Router<AppState> {
    let item_path = format!("{}/:id", policy.base_path);

    let collection = Router::new()
        .route(policy.base_path, get(list_resources).post(create_resource))
        .route_layer(from_fn_with_state(
            RoleGate {
                policy,
                item_route: false,
            },
            authz::role_gate,
        ));

    let item = Router::new()
        .route(
            &item_path,
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route_layer(from_fn_with_state(
            OwnershipGate {
                app: state.clone(),
                policy,
            },
            authz::ownership_gate,
        ))
        .route_layer(from_fn_with_state(
            RoleGate {
                policy,
                item_route: true,
            },
            authz::role_gate,
        ));

    collection.merge(item).layer(Extension(policy))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateResourceRequest {
    client_id: Option<ClientId>,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct UpdateResourceRequest {
    #[serde(default)]
    data: serde_json::Value,
}

async fn list_resources(
    State(state): State<AppState>,
    Extension(policy): Extension<&'static ResourcePolicy>,
    Extension(ctx): Extension<PrincipalContext>,
) -> Result<Response, ApiError> {
    let scope = ListScope::for_principal(ctx.principal());
    let records = state.stores.list_resources(policy.kind, scope).await?;
    Ok(Json(records).into_response())
}

async fn create_resource(
    State(state): State<AppState>,
    Extension(policy): Extension<&'static ResourcePolicy>,
    Extension(ctx): Extension<PrincipalContext>,
    Json(body): Json<CreateResourceRequest>,
) -> Result<Response, ApiError> {
    let principal = ctx.principal();

    let record = ResourceRecord {
        id: ResourceId::new(),
        owner_id: Some(principal.id),
        client_id: body.client_id.or(principal.client_id),
        created_at: Utc::now(),
        data: body.data,
    };
    state.stores.insert_resource(policy.kind, &record).await?;

    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn get_resource(
    State(state): State<AppState>,
    Extension(policy): Extension<&'static ResourcePolicy>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    // Deliberately a second, fuller read: the ownership gate only saw the
    // id and ownership scalars.
    let record = state
        .stores
        .fetch_resource(policy.kind, id)
        .await?
        .ok_or(ApiError::NotFound("Resource not found"))?;

    Ok(Json(record).into_response())
}

async fn update_resource(
    State(state): State<AppState>,
    Extension(policy): Extension<&'static ResourcePolicy>,
    Path(id): Path<String>,
    Json(body): Json<UpdateResourceRequest>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    let record = state
        .stores
        .update_resource(policy.kind, id, body.data)
        .await?
        .ok_or(ApiError::NotFound("Resource not found"))?;

    Ok(Json(record).into_response())
}

async fn delete_resource(
    State(state): State<AppState>,
    Extension(policy): Extension<&'static ResourcePolicy>,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    let id = parse_id(&id)?;

    if state.stores.delete_resource(policy.kind, id).await? {
        Ok(StatusCode::NO_CONTENT.into_response())
    } else {
        Err(ApiError::NotFound("Resource not found"))
    }
}

fn parse_id(raw: &str) -> Result<ResourceId, ApiError> {
    raw.parse()
        .map_err(|_| ApiError::BadRequest("Invalid resource id"))
}
