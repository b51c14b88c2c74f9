//! Postgres implementation of the country store ports.
//!
//! All SQL is runtime-checked (sqlx::query, not sqlx::query!) to avoid a
//! compile-time DB requirement.

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{CountryQuery, CountryRecord, GdpSort, StatusSnapshot, StoredCountry};
use crate::ports::{CountryStore, RefreshTransaction, Result};

const MARKER_KEY: &str = "last_refreshed_at";

/// 10 binds per row keeps each statement well under the 65535 parameter limit
const INSERT_CHUNK_ROWS: usize = 1000;

const SELECT_COUNTRY: &str = r#"
    SELECT id, name, capital, region, population, currency_code,
           exchange_rate, estimated_gdp, flag_url, last_refreshed_at
    FROM countries
"#;

// ── PgCountryStore ───────────────────────────────────────────

#[derive(Clone)]
pub struct PgCountryStore {
    pool: PgPool,
}

impl PgCountryStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl CountryStore for PgCountryStore {
    async fn begin_refresh(&self) -> Result<Box<dyn RefreshTransaction>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgRefreshTransaction { tx }))
    }

    async fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_COUNTRY);
        qb.push(" WHERE TRUE");

        if let Some(region) = &query.region {
            qb.push(" AND region = ").push_bind(region.clone());
        }
        if let Some(currency) = &query.currency {
            qb.push(" AND currency_code = ").push_bind(currency.clone());
        }

        qb.push(match query.sort {
            Some(GdpSort::Desc) => " ORDER BY estimated_gdp DESC NULLS LAST, name",
            Some(GdpSort::Asc) => " ORDER BY estimated_gdp ASC NULLS FIRST, name",
            None => " ORDER BY name",
        });

        let rows = qb
            .build_query_as::<StoredCountry>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>> {
        let sql = format!("{} WHERE LOWER(name) = LOWER($1)", SELECT_COUNTRY);
        let row = sqlx::query_as::<_, StoredCountry>(&sql)
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM countries WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn status(&self) -> Result<StatusSnapshot> {
        let total_countries: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM countries")
            .fetch_one(&self.pool)
            .await?;

        let marker: Option<Option<String>> =
            sqlx::query_scalar("SELECT value FROM metadata WHERE key = $1")
                .bind(MARKER_KEY)
                .fetch_optional(&self.pool)
                .await?;

        let last_refreshed_at = match marker.flatten() {
            Some(raw) => Some(
                DateTime::parse_from_rfc3339(&raw)
                    .map_err(|_| StoreError::Corrupt {
                        field: MARKER_KEY,
                        value: raw.clone(),
                    })?
                    .with_timezone(&Utc),
            ),
            None => None,
        };

        Ok(StatusSnapshot {
            total_countries,
            last_refreshed_at,
        })
    }
}

// ── PgRefreshTransaction ─────────────────────────────────────

/// Dropping without commit rolls back (sqlx `Transaction` semantics)
pub struct PgRefreshTransaction {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl RefreshTransaction for PgRefreshTransaction {
    async fn existing_names(&mut self) -> Result<Vec<(Uuid, String)>> {
        let rows = sqlx::query_as::<_, (Uuid, String)>("SELECT id, name FROM countries")
            .fetch_all(&mut *self.tx)
            .await?;
        Ok(rows)
    }

    async fn insert_countries(&mut self, records: &[CountryRecord]) -> Result<u64> {
        let mut inserted = 0;
        for chunk in records.chunks(INSERT_CHUNK_ROWS) {
            let mut qb = QueryBuilder::<Postgres>::new(
                "INSERT INTO countries (id, name, capital, region, population, currency_code, \
                 exchange_rate, estimated_gdp, flag_url, last_refreshed_at) ",
            );
            qb.push_values(chunk, |mut row, record| {
                row.push_bind(Uuid::new_v4())
                    .push_bind(record.name.clone())
                    .push_bind(record.capital.clone())
                    .push_bind(record.region.clone())
                    .push_bind(record.population)
                    .push_bind(record.currency_code.clone())
                    .push_bind(record.exchange_rate)
                    .push_bind(record.estimated_gdp)
                    .push_bind(record.flag_url.clone())
                    .push_bind(record.last_refreshed_at);
            });

            let result = qb.build().execute(&mut *self.tx).await?;
            inserted += result.rows_affected();
        }
        Ok(inserted)
    }

    async fn update_country(&mut self, id: Uuid, record: &CountryRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE countries
            SET name = $2, capital = $3, region = $4, population = $5,
                currency_code = $6, exchange_rate = $7, estimated_gdp = $8,
                flag_url = $9, last_refreshed_at = $10
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(&record.name)
        .bind(&record.capital)
        .bind(&record.region)
        .bind(record.population)
        .bind(&record.currency_code)
        .bind(record.exchange_rate)
        .bind(record.estimated_gdp)
        .bind(&record.flag_url)
        .bind(record.last_refreshed_at)
        .execute(&mut *self.tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Backend(anyhow!(
                "country {} vanished during refresh",
                id
            )));
        }
        Ok(())
    }

    async fn upsert_marker(&mut self, refreshed_at: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO metadata (key, value) VALUES ($1, $2)
            ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value
            "#,
        )
        .bind(MARKER_KEY)
        .bind(refreshed_at.to_rfc3339_opts(SecondsFormat::Millis, true))
        .execute(&mut *self.tx)
        .await?;
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let PgRefreshTransaction { tx } = *self;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        let PgRefreshTransaction { tx } = *self;
        tx.rollback().await?;
        Ok(())
    }
}
