//! Reconciliation of derived records against persisted rows
//!
//! Rows are matched by case-folded name. Inserts, updates and the refresh
//! marker are written in one transaction; any failure rolls all of them back.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{fold_name, CountryRecord};
use crate::ports::{CountryStore, RefreshTransaction};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub inserted: usize,
    pub updated: usize,
}

/// Split of a batch into new rows and rows that already exist
#[derive(Debug, Default)]
pub struct ReconcilePlan<'a> {
    pub to_insert: Vec<&'a CountryRecord>,
    pub to_update: Vec<(Uuid, &'a CountryRecord)>,
}

/// Collapse records sharing a case-folded name.
///
/// The last record in input order wins and takes the slot of the first
/// occurrence, so the output order is still deterministic.
pub fn dedupe_by_name(records: &[CountryRecord]) -> Vec<&CountryRecord> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(records.len());
    let mut unique: Vec<&CountryRecord> = Vec::with_capacity(records.len());

    for record in records {
        match slots.get(&record.folded_name()) {
            Some(&slot) => unique[slot] = record,
            None => {
                slots.insert(record.folded_name(), unique.len());
                unique.push(record);
            }
        }
    }
    unique
}

/// Partition deduplicated records against `(id, name)` pairs already stored
pub fn plan<'a>(records: &[&'a CountryRecord], existing: &[(Uuid, String)]) -> ReconcilePlan<'a> {
    let by_name: HashMap<String, Uuid> = existing
        .iter()
        .map(|(id, name)| (fold_name(name), *id))
        .collect();

    let mut plan = ReconcilePlan::default();
    for record in records {
        match by_name.get(&record.folded_name()) {
            Some(id) => plan.to_update.push((*id, record)),
            None => plan.to_insert.push(record),
        }
    }
    plan
}

/// Apply `records` atomically and move the refresh marker to `refreshed_at`
pub async fn reconcile(
    store: &dyn CountryStore,
    records: &[CountryRecord],
    refreshed_at: DateTime<Utc>,
) -> Result<ReconcileStats, StoreError> {
    let mut tx = store.begin_refresh().await?;

    match apply(tx.as_mut(), records, refreshed_at).await {
        Ok(stats) => {
            tx.commit().await?;
            tracing::info!(
                inserted = stats.inserted,
                updated = stats.updated,
                "Reconciliation committed"
            );
            Ok(stats)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Reconciliation failed, rolling back");
            if let Err(rollback_err) = tx.rollback().await {
                tracing::error!(error = %rollback_err, "Rollback failed");
            }
            Err(e)
        }
    }
}

async fn apply(
    tx: &mut dyn RefreshTransaction,
    records: &[CountryRecord],
    refreshed_at: DateTime<Utc>,
) -> Result<ReconcileStats, StoreError> {
    let existing = tx.existing_names().await?;
    let unique = dedupe_by_name(records);
    if unique.len() < records.len() {
        tracing::warn!(
            duplicates = records.len() - unique.len(),
            "Batch contains case-insensitive duplicate names, keeping the last of each"
        );
    }

    let plan = plan(&unique, &existing);

    if !plan.to_insert.is_empty() {
        let batch: Vec<CountryRecord> = plan.to_insert.iter().map(|r| (*r).clone()).collect();
        tx.insert_countries(&batch).await?;
    }

    for (id, record) in &plan.to_update {
        tx.update_country(*id, record).await?;
    }

    tx.upsert_marker(refreshed_at).await?;

    Ok(ReconcileStats {
        inserted: plan.to_insert.len(),
        updated: plan.to_update.len(),
    })
}
