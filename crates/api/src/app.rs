//! Router assembly and backend wiring.

use std::sync::Arc;

use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use tower::ServiceBuilder;

use meridian_auth::Hs256TokenCodec;
use meridian_infra::Stores;

use crate::config::ApiConfig;
use crate::context::PrincipalContext;
use crate::{middleware, policy, routes};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ApiConfig>,
    pub codec: Arc<Hs256TokenCodec>,
    pub stores: Stores,
}

/// Select the storage backend the way the environment asks.
pub async fn build_stores(config: &ApiConfig) -> anyhow::Result<Stores> {
    if config.use_persistent_stores {
        #[cfg(feature = "postgres")]
        {
            use anyhow::Context as _;

            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set when USE_PERSISTENT_STORES=true")?;
            let pool = sqlx::PgPool::connect(url)
                .await
                .context("failed to connect to Postgres")?;
            return Ok(Stores::Postgres(meridian_infra::PgStores::new(pool)));
        }
        #[cfg(not(feature = "postgres"))]
        tracing::warn!(
            "USE_PERSISTENT_STORES=true but the postgres feature is not enabled; \
             falling back to in-memory stores"
        );
    }

    Ok(Stores::in_memory())
}

/// Assemble the application router.
///
/// Public surface: health and token refresh. Everything else sits behind
/// the bearer-auth middleware.
pub fn build_app(config: ApiConfig, stores: Stores) -> Router {
    let codec = Arc::new(Hs256TokenCodec::new(config.jwt_secret.as_bytes()));
    let state = AppState {
        config: Arc::new(config),
        codec,
        stores,
    };

    let mut protected = Router::new().route("/me", get(me));
    for policy in policy::POLICIES {
        protected = protected.merge(routes::resources::resource_router(policy, &state));
    }
    let protected = protected.layer(
        ServiceBuilder::new()
            .layer(from_fn_with_state(state.clone(), middleware::auth_middleware)),
    );

    Router::new()
        .route("/health", get(health))
        .route("/auth/refresh", post(routes::auth::refresh))
        .merge(protected)
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo the resolved principal: the context-attachment guarantee made
/// observable (and testable end to end).
async fn me(Extension(ctx): Extension<PrincipalContext>) -> impl IntoResponse {
    let principal = ctx.principal();
    Json(serde_json::json!({
        "id": principal.id.to_string(),
        "email": principal.email,
        "name": principal.display_name(),
        "role": principal.role.as_str(),
        "clientId": principal.client_id.map(|c| c.to_string()),
    }))
}
