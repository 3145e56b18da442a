//! Database maintenance commands. All of them read `DATABASE_URL` and the
//! pool settings from the environment.

use std::path::Path;

use sqlx::PgPool;
use storefront_core::AppConfig;

async fn connect() -> anyhow::Result<(AppConfig, PgPool)> {
    let config = storefront_core::load_app_config()?;
    let pool = storefront_db::connect_pool(
        &config.database_url,
        storefront_db::PoolConfig::from_app_config(&config),
    )
    .await?;
    Ok((config, pool))
}

pub(crate) async fn run_ping() -> anyhow::Result<()> {
    let (_, pool) = connect().await?;
    storefront_db::health_check(&pool).await?;
    println!("database ok");
    Ok(())
}

pub(crate) async fn run_migrate() -> anyhow::Result<()> {
    let (_, pool) = connect().await?;
    let applied = storefront_db::run_migrations(&pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Upserts every product in `file` in one transaction. The file's `tenant`
/// wins over the configured one.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or if the upsert
/// fails (in which case nothing is written).
pub(crate) async fn run_seed(file: &Path) -> anyhow::Result<()> {
    let catalog = storefront_core::load_catalog_file(file)?;
    let (config, pool) = connect().await?;
    let tenant = catalog.tenant.as_deref().unwrap_or(&config.tenant);

    let count = storefront_db::seed_products(&pool, tenant, &catalog.products).await?;
    tracing::info!(tenant, count, file = %file.display(), "catalog seeded");
    println!("seeded {count} product(s) into tenant '{tenant}'");
    Ok(())
}
