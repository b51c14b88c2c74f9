//! In-process country store
//!
//! Same contract as the Postgres store: one row per case-folded name, refresh
//! writes staged in a private copy and published atomically on commit. Commit
//! replays only the writes of the transaction onto the current state, so rows
//! deleted while a refresh was in flight stay deleted and an update of such a
//! row fails the refresh. Used by tests and local runs without a database;
//! fault switches let tests break a write partway through a refresh.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    fold_name, CountryQuery, CountryRecord, GdpSort, StatusSnapshot, StoredCountry,
};
use crate::ports::{CountryStore, RefreshTransaction, Result};

#[derive(Debug, Clone, Default)]
struct MemoryState {
    rows: Vec<StoredCountry>,
    marker: Option<DateTime<Utc>>,
}

impl MemoryState {
    fn position_of(&self, name: &str) -> Option<usize> {
        let folded = fold_name(name);
        self.rows
            .iter()
            .position(|row| row.record.folded_name() == folded)
    }

    fn check_unique_names(&self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.rows.len());
        for row in &self.rows {
            if !seen.insert(row.record.folded_name()) {
                return Err(StoreError::DuplicateName(row.record.name.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Faults {
    /// Index within an insert batch at which the write fails (usize::MAX = never)
    insert_at: AtomicUsize,
    marker: AtomicBool,
}

impl Default for Faults {
    fn default() -> Self {
        Self {
            insert_at: AtomicUsize::new(usize::MAX),
            marker: AtomicBool::new(false),
        }
    }
}

#[derive(Clone, Default)]
pub struct MemoryCountryStore {
    state: Arc<RwLock<MemoryState>>,
    faults: Arc<Faults>,
}

impl MemoryCountryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next insert batches fail when they reach row `index`
    pub fn fail_insert_at(&self, index: usize) {
        self.faults.insert_at.store(index, Ordering::SeqCst);
    }

    /// Make marker upserts fail
    pub fn fail_marker_upsert(&self) {
        self.faults.marker.store(true, Ordering::SeqCst);
    }

    pub fn clear_faults(&self) {
        self.faults.insert_at.store(usize::MAX, Ordering::SeqCst);
        self.faults.marker.store(false, Ordering::SeqCst);
    }

    /// Snapshot of every committed row in storage order
    pub async fn rows(&self) -> Vec<StoredCountry> {
        self.state.read().await.rows.clone()
    }
}

#[async_trait]
impl CountryStore for MemoryCountryStore {
    async fn begin_refresh(&self) -> Result<Box<dyn RefreshTransaction>> {
        let staged = self.state.read().await.clone();
        Ok(Box::new(MemoryRefreshTransaction {
            shared: Arc::clone(&self.state),
            faults: Arc::clone(&self.faults),
            staged,
            journal: Vec::new(),
        }))
    }

    async fn list(&self, query: &CountryQuery) -> Result<Vec<StoredCountry>> {
        let state = self.state.read().await;
        let mut rows: Vec<StoredCountry> = state
            .rows
            .iter()
            .filter(|row| match &query.region {
                Some(region) => row.record.region.as_ref() == Some(region),
                None => true,
            })
            .filter(|row| match &query.currency {
                Some(code) => row.record.currency_code.as_ref() == Some(code),
                None => true,
            })
            .cloned()
            .collect();

        match query.sort {
            Some(GdpSort::Desc) => rows.sort_by(|a, b| {
                compare_gdp(b.record.estimated_gdp, a.record.estimated_gdp)
            }),
            Some(GdpSort::Asc) => rows.sort_by(|a, b| {
                compare_gdp(a.record.estimated_gdp, b.record.estimated_gdp)
            }),
            None => rows.sort_by(|a, b| a.record.name.cmp(&b.record.name)),
        }
        Ok(rows)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<StoredCountry>> {
        let state = self.state.read().await;
        Ok(state.position_of(name).map(|idx| state.rows[idx].clone()))
    }

    async fn delete_by_name(&self, name: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        match state.position_of(name) {
            Some(idx) => {
                state.rows.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn status(&self) -> Result<StatusSnapshot> {
        let state = self.state.read().await;
        Ok(StatusSnapshot {
            total_countries: state.rows.len() as i64,
            last_refreshed_at: state.marker,
        })
    }
}

/// NULL sorts below every value, matching `ASC NULLS FIRST` / `DESC NULLS LAST`
fn compare_gdp(a: Option<f64>, b: Option<f64>) -> CmpOrdering {
    match (a, b) {
        (Some(x), Some(y)) => x.total_cmp(&y),
        (None, Some(_)) => CmpOrdering::Less,
        (Some(_), None) => CmpOrdering::Greater,
        (None, None) => CmpOrdering::Equal,
    }
}

/// A write recorded by a transaction, replayed on commit
#[derive(Debug)]
enum StagedWrite {
    Insert(StoredCountry),
    Update(Uuid, CountryRecord),
    Marker(DateTime<Utc>),
}

impl StagedWrite {
    fn apply(self, state: &mut MemoryState) -> Result<()> {
        match self {
            StagedWrite::Insert(row) => state.rows.push(row),
            StagedWrite::Update(id, record) => {
                let row = state
                    .rows
                    .iter_mut()
                    .find(|row| row.id == id)
                    .ok_or_else(|| vanished(id))?;
                row.record = record;
            }
            StagedWrite::Marker(at) => state.marker = Some(at),
        }
        Ok(())
    }
}

fn vanished(id: Uuid) -> StoreError {
    StoreError::Backend(anyhow!("country {} vanished during refresh", id))
}

struct MemoryRefreshTransaction {
    shared: Arc<RwLock<MemoryState>>,
    faults: Arc<Faults>,
    /// Snapshot at begin plus this transaction's own writes
    staged: MemoryState,
    journal: Vec<StagedWrite>,
}

#[async_trait]
impl RefreshTransaction for MemoryRefreshTransaction {
    async fn existing_names(&mut self) -> Result<Vec<(Uuid, String)>> {
        Ok(self
            .staged
            .rows
            .iter()
            .map(|row| (row.id, row.record.name.clone()))
            .collect())
    }

    async fn insert_countries(&mut self, records: &[CountryRecord]) -> Result<u64> {
        let fail_at = self.faults.insert_at.load(Ordering::SeqCst);
        for (idx, record) in records.iter().enumerate() {
            if idx == fail_at {
                return Err(StoreError::Backend(anyhow!(
                    "injected insert failure at row {} ({})",
                    idx,
                    record.name
                )));
            }
            if self.staged.position_of(&record.name).is_some() {
                return Err(StoreError::DuplicateName(record.name.clone()));
            }
            let row = StoredCountry {
                id: Uuid::new_v4(),
                record: record.clone(),
            };
            self.staged.rows.push(row.clone());
            self.journal.push(StagedWrite::Insert(row));
        }
        Ok(records.len() as u64)
    }

    async fn update_country(&mut self, id: Uuid, record: &CountryRecord) -> Result<()> {
        // A row deleted by another writer after begin counts as gone
        if !self.shared.read().await.rows.iter().any(|row| row.id == id) {
            return Err(vanished(id));
        }
        let row = self
            .staged
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| vanished(id))?;
        row.record = record.clone();
        self.journal.push(StagedWrite::Update(id, record.clone()));
        Ok(())
    }

    async fn upsert_marker(&mut self, refreshed_at: DateTime<Utc>) -> Result<()> {
        if self.faults.marker.load(Ordering::SeqCst) {
            return Err(StoreError::Backend(anyhow!("injected marker failure")));
        }
        self.staged.marker = Some(refreshed_at);
        self.journal.push(StagedWrite::Marker(refreshed_at));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryRefreshTransaction {
            shared, journal, ..
        } = *self;

        let mut current = shared.write().await;
        let mut next = (*current).clone();
        for write in journal {
            write.apply(&mut next)?;
        }
        next.check_unique_names()?;
        *current = next;
        Ok(())
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
