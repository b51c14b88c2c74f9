//! Persistence ports
//!
//! The refresh pipeline only talks to storage through these traits. Postgres
//! (`database::PgCountryStore`) and the in-process store
//! (`memory::MemoryCountryStore`) both implement them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{CountryQuery, CountryRecord, StatusSnapshot, StoredCountry};

pub type Result<T> = std::result::Result<T, StoreError>;

/// Read side plus the entry point of the refresh unit of work
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Open the all-or-nothing unit of work used by one refresh
    async fn begin_refresh(&self) -> Result<Box<dyn RefreshTransaction>>;

    async fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>>;

    /// Case-insensitive exact-name lookup
    async fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>>;

    /// Case-insensitive exact-name delete; `false` when nothing matched
    async fn delete_by_name(&self, name: &str) -> Result<bool>;

    /// Row count plus the last refresh marker
    async fn status(&self) -> Result<StatusSnapshot>;
}

/// Writes of a single refresh attempt.
///
/// Nothing written through a transaction is observable by other readers until
/// [`commit`](RefreshTransaction::commit) succeeds; dropping it or calling
/// [`rollback`](RefreshTransaction::rollback) discards every write.
#[async_trait]
pub trait RefreshTransaction: Send {
    /// Ids and names of every persisted country, read inside the transaction
    async fn existing_names(&mut self) -> Result<Vec<(Uuid, String)>>;

    /// Insert new rows in one batch, generating their ids
    async fn insert_countries(&mut self, records: &[CountryRecord]) -> Result<u64>;

    /// Overwrite every mutable field of the row with this id
    async fn update_country(&mut self, id: Uuid, record: &CountryRecord) -> Result<()>;

    /// Upsert the `last_refreshed_at` marker
    async fn upsert_marker(&mut self, refreshed_at: DateTime<Utc>) -> Result<()>;

    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}
