mod api;
mod middleware;
mod session;
mod storage;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use storefront_core::AppConfig;
use storefront_payments::StripeClient;
use tracing_subscriber::EnvFilter;

use crate::{
    api::{build_app, default_rate_limit_state, AppState},
    middleware::AuthState,
    storage::StorageClient,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Arc::new(storefront_core::load_app_config()?);
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let pool_config = storefront_db::PoolConfig::from_app_config(&config);
    let pool = storefront_db::connect_pool(&config.database_url, pool_config).await?;
    let applied = storefront_db::run_migrations(&pool).await?;
    tracing::info!(applied, "migrations up to date");

    let payments = payments_client(&config)?;
    let storage = storage_client(&config)?;
    tracing::info!(
        env = %config.env,
        tenant = %config.tenant,
        payments = payments.is_some(),
        storage = storage.is_some(),
        "starting storefront server"
    );

    let auth = AuthState::from_env(matches!(
        config.env,
        storefront_core::Environment::Development
    ))?;
    let state = AppState {
        pool,
        config: Arc::clone(&config),
        payments,
        storage,
    };
    let app = build_app(state, auth, default_rate_limit_state());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "listening");
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

fn payments_client(config: &AppConfig) -> anyhow::Result<Option<StripeClient>> {
    let Some(secret) = config
        .stripe_secret_key
        .as_deref()
        .filter(|_| config.payments_enabled())
    else {
        tracing::warn!("payment secrets not set; checkout and webhooks disabled");
        return Ok(None);
    };

    let client = StripeClient::with_base_url(
        secret,
        config.payments_timeout_secs,
        config.payments_max_retries,
        &config.stripe_api_base,
    )?;
    Ok(Some(client))
}

fn storage_client(config: &AppConfig) -> anyhow::Result<Option<StorageClient>> {
    let (Some(url), Some(key)) = (
        config.storage_url.as_deref(),
        config.storage_service_key.as_deref(),
    ) else {
        tracing::warn!("storage not configured; image uploads disabled");
        return Ok(None);
    };

    let client = StorageClient::new(url, key, &config.storage_bucket, Duration::from_secs(30))?;
    Ok(Some(client))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to listen for ctrl-c");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("received shutdown signal, starting graceful shutdown");
}
