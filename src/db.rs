//! Database pool lifecycle.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

const RETRY_DELAY: Duration = Duration::from_secs(5);

/// Connects to Postgres, retrying indefinitely with a fixed delay until the
/// database is reachable.
pub async fn connect_with_retry(url: &str) -> PgPool {
    loop {
        match PgPoolOptions::new().max_connections(10).connect(url).await {
            Ok(pool) => {
                tracing::info!("connected to database");
                return pool;
            }
            Err(err) => {
                tracing::error!(%err, "database connection failed, retrying in 5s");
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
    }
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
