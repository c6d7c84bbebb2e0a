use meridian_api::app::{build_app, build_stores};
use meridian_api::config::ApiConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    meridian_observability::init();

    let config = ApiConfig::from_env()?;
    let stores = build_stores(&config).await?;

    let bind_addr = config.bind_addr;
    let app = build_app(config, stores);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
