//! Create the products schema in the configured database.
//!
//! Reads `DATABASE_URI` / `DATABASE_MAX_CONNECTIONS` and exits non-zero on failure.

use anyhow::Context;

use storefront_infra::{PostgresProductStore, StoreConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    storefront_observability::init();

    let config = StoreConfig::from_env().context("invalid store configuration")?;
    let store = PostgresProductStore::connect(&config)
        .await
        .context("failed to connect to Postgres")?;
    store
        .init_db()
        .await
        .context("failed to create products schema")?;

    tracing::info!("database initialized");
    Ok(())
}
