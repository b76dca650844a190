//! Database collaborator.
//!
//! The core never queries the database itself; it only needs to know whether
//! the database answers, for the readiness check.

use std::time::Duration;

use anyhow::Context;
use futures::FutureExt;
use futures::future::BoxFuture;
use sales_config::DatabaseConfig;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

/// Anything the readiness check can ping.
pub trait HealthCheck: Send + Sync {
    fn ping(&self) -> BoxFuture<'_, anyhow::Result<()>>;
}

impl HealthCheck for PgPool {
    fn ping(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        async move {
            sqlx::query("SELECT true")
                .execute(self)
                .await
                .context("pinging database")?;
            Ok(())
        }
        .boxed()
    }
}

/// Builds a PostgreSQL pool without connecting; connections are opened on
/// first use so the service can start before the database is up.
pub fn init_db_pool(config: &DatabaseConfig) -> anyhow::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(3))
        .connect_lazy(&config.url())
        .context("creating database pool")
}
