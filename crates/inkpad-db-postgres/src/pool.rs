//! Pool construction for [`PostgresStorage`](crate::PostgresStorage).

use std::{str::FromStr, time::Duration};

use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgConnectOptions, PgPool, Postgres};
use tracing::info;

use crate::config::PostgresConfig;
use crate::error::Result;

/// Reported to the server in `pg_stat_activity`.
const APPLICATION_NAME: &str = "inkpad-server";

/// Used when `max_lifetime_secs` is unset.
const DEFAULT_MAX_LIFETIME: Duration = Duration::from_secs(30 * 60);

/// Connects a pool sized and timed by `config`.
pub async fn create_pool(config: &PostgresConfig) -> Result<PgPool> {
    let pool = pool_options(config)
        .connect_with(connect_options(config)?)
        .await?;

    info!(
        url = %redacted_url(&config.url),
        max_connections = config.pool_size,
        "connected to PostgreSQL"
    );
    Ok(pool)
}

fn connect_options(config: &PostgresConfig) -> Result<PgConnectOptions> {
    Ok(PgConnectOptions::from_str(&config.url)?.application_name(APPLICATION_NAME))
}

/// At least one idle connection is kept, never more than the pool holds.
fn pool_options(config: &PostgresConfig) -> PoolOptions<Postgres> {
    let max = config.pool_size.max(1);
    let min = config.min_connections.unwrap_or(max / 4).clamp(1, max);

    PoolOptions::new()
        .max_connections(max)
        .min_connections(min)
        .acquire_timeout(Duration::from_millis(config.connect_timeout_ms))
        .idle_timeout(config.idle_timeout_ms.map(Duration::from_millis))
        .max_lifetime(
            config
                .max_lifetime_secs
                .map_or(DEFAULT_MAX_LIFETIME, Duration::from_secs),
        )
}

/// The URL with any password replaced, for logs.
pub(crate) fn redacted_url(raw: &str) -> String {
    match url::Url::parse(raw) {
        Ok(mut parsed) => {
            if parsed.password().is_some() {
                let _ = parsed.set_password(Some("****"));
            }
            parsed.to_string()
        }
        Err(_) => "<invalid url>".to_string(),
    }
}
