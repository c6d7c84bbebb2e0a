//! Process configuration, sourced from the environment.

use std::net::SocketAddr;

use anyhow::Context;
use chrono::Duration;

/// Runtime configuration.
///
/// A missing `JWT_SECRET` is a startup failure, never a per-request error.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub use_persistent_stores: bool,
    pub database_url: Option<String>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt_secret = std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let bind_addr = std::env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .context("BIND_ADDR must be host:port")?;

        let access_token_ttl = env_secs("ACCESS_TOKEN_TTL_SECS", 900)?;
        let refresh_token_ttl = env_secs("REFRESH_TOKEN_TTL_SECS", 14 * 24 * 3600)?;

        let use_persistent_stores = std::env::var("USE_PERSISTENT_STORES")
            .map(|v| v.parse().unwrap_or(false))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            jwt_secret,
            access_token_ttl,
            refresh_token_ttl,
            use_persistent_stores,
            database_url: std::env::var("DATABASE_URL").ok(),
        })
    }

    /// Fixed configuration for tests: ephemeral bind, in-memory stores.
    pub fn for_tests(jwt_secret: &str) -> Self {
        Self {
            bind_addr: "127.0.0.1:0".parse().expect("static test addr"),
            jwt_secret: jwt_secret.to_string(),
            access_token_ttl: Duration::minutes(10),
            refresh_token_ttl: Duration::days(1),
            use_persistent_stores: false,
            database_url: None,
        }
    }
}

fn env_secs(key: &str, default: i64) -> anyhow::Result<Duration> {
    match std::env::var(key) {
        Ok(value) => {
            let secs: i64 = value
                .parse()
                .with_context(|| format!("{key} must be an integer number of seconds"))?;
            Ok(Duration::seconds(secs))
        }
        Err(_) => Ok(Duration::seconds(default)),
    }
}
