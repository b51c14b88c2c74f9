//! Database connection and management module
//!
//! This module provides connection pooling, schema bootstrap and the
//! Postgres-backed country store.

use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::{info, warn};

pub mod country_store;

pub use country_store::PgCountryStore;

/// Tables and the case-insensitive natural key constraint.
///
/// `countries_name_lower_key` guarantees one row per case-folded name even if
/// a writer bypasses the reconciler.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS countries (
        id                UUID PRIMARY KEY,
        name              TEXT NOT NULL,
        capital           TEXT,
        region            TEXT,
        population        BIGINT NOT NULL DEFAULT 0 CHECK (population >= 0),
        currency_code     VARCHAR(10),
        exchange_rate     DOUBLE PRECISION,
        estimated_gdp     DOUBLE PRECISION,
        flag_url          TEXT,
        last_refreshed_at TIMESTAMPTZ NOT NULL
    )
    "#,
    r#"CREATE UNIQUE INDEX IF NOT EXISTS countries_name_lower_key ON countries (LOWER(name))"#,
    r#"CREATE INDEX IF NOT EXISTS countries_region_idx ON countries (region)"#,
    r#"CREATE INDEX IF NOT EXISTS countries_currency_idx ON countries (currency_code)"#,
    r#"
    CREATE TABLE IF NOT EXISTS metadata (
        key   TEXT PRIMARY KEY,
        value TEXT
    )
    "#,
];

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub connection_timeout: Duration,
    pub idle_timeout: Option<Duration>,
    pub max_lifetime: Option<Duration>,
}

impl DatabaseConfig {
    pub fn new(database_url: impl Into<String>, max_connections: u32) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections,
            connection_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)), // 10 minutes
            max_lifetime: Some(Duration::from_secs(1800)), // 30 minutes
        }
    }
}

/// Database connection manager
pub struct DatabaseManager {
    pool: PgPool,
}

impl DatabaseManager {
    /// Create a new database manager with the given configuration
    pub async fn new(config: DatabaseConfig) -> Result<Self, sqlx::Error> {
        info!(
            "Connecting to database: {}",
            mask_database_url(&config.database_url)
        );

        let mut pool_options = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout);

        if let Some(idle_timeout) = config.idle_timeout {
            pool_options = pool_options.idle_timeout(idle_timeout);
        }

        if let Some(max_lifetime) = config.max_lifetime {
            pool_options = pool_options.max_lifetime(max_lifetime);
        }

        let pool = pool_options
            .connect(&config.database_url)
            .await
            .map_err(|e| {
                warn!("Failed to connect to database: {}", e);
                e
            })?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Country store over this pool
    pub fn country_store(&self) -> PgCountryStore {
        PgCountryStore::new(self.pool.clone())
    }

    /// Create missing tables and indexes
    pub async fn ensure_schema(&self) -> Result<(), sqlx::Error> {
        ensure_schema(&self.pool).await
    }

    /// Close the database connection pool
    pub async fn close(self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }
}

pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    for statement in SCHEMA {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("Database schema ready");
    Ok(())
}

/// Mask sensitive information in database URL for logging
fn mask_database_url(url: &str) -> String {
    if let Ok(parsed) = url::Url::parse(url) {
        let mut masked = parsed.clone();
        if parsed.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        masked.to_string()
    } else {
        // Unparsable input may still embed credentials anywhere
        "***".to_string()
    }
}
