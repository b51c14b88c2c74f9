//! country_server: REST server for the country ledger.
//!
//! Reads config from env vars (a `.env` file is honoured):
//!   PORT              listen port (required)
//!   DATABASE_URL      Postgres connection string (required)
//!   CACHE_IMAGE_PATH  where the summary image is written (required)
//!   COUNTRIES_API_URL, RATES_API_URL, EXTERNAL_FETCH_TIMEOUT_SECS,
//!   DATABASE_POOL_SIZE (optional)

use std::sync::Arc;

use anyhow::Context;
use country_ledger::api::{create_country_router, AppState};
use country_ledger::database::{DatabaseConfig, DatabaseManager};
use country_ledger::{
    AppConfig, CountryStore, ExternalDataGateway, RefreshService, SummaryReporter,
    SvgSummaryRenderer,
};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,country_ledger=debug,tower_http=debug".into()),
        )
        .init();

    let config = AppConfig::from_env().context("invalid configuration")?;

    let db = DatabaseManager::new(DatabaseConfig::new(
        config.database_url.clone(),
        config.database_pool_size,
    ))
    .await
    .context("failed to connect to database")?;
    db.ensure_schema()
        .await
        .context("failed to create database schema")?;

    let store: Arc<dyn CountryStore> = Arc::new(db.country_store());
    let gateway = ExternalDataGateway::from_config(&config.external)?;
    let reporter = SummaryReporter::new(
        Arc::new(SvgSummaryRenderer),
        config.cache_image_path.clone(),
    );
    let refresher = Arc::new(RefreshService::new(gateway, Arc::clone(&store), reporter));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_country_router(AppState::new(store, refresher))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind to {bind_addr}"))?;
    tracing::info!(
        image = %config.cache_image_path.display(),
        "country_server listening on {bind_addr}"
    );

    axum::serve(listener, app).await.context("server error")?;

    db.close().await;
    Ok(())
}
