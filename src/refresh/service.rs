//! Refresh orchestration
//!
//! A refresh has two phases. The data phase (fetch, derive, reconcile) either
//! commits completely or fails with a [`RefreshError`]. The artifact phase runs
//! only after the commit and reports its outcome as a value, so a rendering
//! problem can never turn a committed refresh into a failure.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SubsecRound, Utc};

use super::derive::{derive, MultiplierSource, RandomMultiplier};
use super::reconcile::{reconcile, ReconcileStats};
use super::summary::summarize;
use crate::error::RefreshError;
use crate::gateway::ExternalDataGateway;
use crate::models::{CountryRecord, RefreshResult};
use crate::ports::CountryStore;
use crate::render::SummaryReporter;

/// Outcome of the best-effort summary image phase
#[derive(Debug, Clone, PartialEq)]
pub enum ArtifactOutcome {
    Written(PathBuf),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct RefreshReport {
    pub result: RefreshResult,
    pub stats: ReconcileStats,
    pub artifact: ArtifactOutcome,
}

impl RefreshReport {
    /// Warning for the caller when the data committed but the image did not
    pub fn artifact_warning(&self) -> Option<String> {
        match &self.artifact {
            ArtifactOutcome::Written(_) => None,
            ArtifactOutcome::Failed(reason) => {
                Some(format!("Summary image was not updated: {}", reason))
            }
        }
    }
}

pub struct RefreshService {
    gateway: ExternalDataGateway,
    store: Arc<dyn CountryStore>,
    reporter: SummaryReporter,
    multiplier: Arc<dyn MultiplierSource>,
}

impl RefreshService {
    pub fn new(
        gateway: ExternalDataGateway,
        store: Arc<dyn CountryStore>,
        reporter: SummaryReporter,
    ) -> Self {
        Self {
            gateway,
            store,
            reporter,
            multiplier: Arc::new(RandomMultiplier),
        }
    }

    /// Replace the GDP multiplier source
    pub fn with_multiplier(mut self, multiplier: Arc<dyn MultiplierSource>) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn reporter(&self) -> &SummaryReporter {
        &self.reporter
    }

    /// Run one full refresh.
    ///
    /// No retries: a failed refresh leaves storage untouched and must be
    /// re-invoked by the caller.
    #[tracing::instrument(level = "info", skip_all)]
    pub async fn refresh(&self) -> Result<RefreshReport, RefreshError> {
        let started = Instant::now();

        let data = self.gateway.fetch_external_data().await?;
        tracing::info!(
            countries = data.countries.len(),
            rates = data.rates.len(),
            "External data fetched"
        );

        // Millisecond precision survives every store round-trip unchanged
        let now = Utc::now().trunc_subsecs(3);
        let records = derive(&data.countries, &data.rates, now, self.multiplier.as_ref());

        let stats = reconcile(self.store.as_ref(), &records, now).await?;

        let result = RefreshResult {
            total: records.len(),
            last_refreshed_at: now,
        };

        let artifact = self.publish_summary(&records, now).await;

        tracing::info!(
            total = result.total,
            inserted = stats.inserted,
            updated = stats.updated,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refresh complete"
        );

        Ok(RefreshReport {
            result,
            stats,
            artifact,
        })
    }

    async fn publish_summary(&self, records: &[CountryRecord], now: DateTime<Utc>) -> ArtifactOutcome {
        let summary = summarize(records, now);
        match self.reporter.publish(&summary).await {
            Ok(path) => ArtifactOutcome::Written(path),
            Err(e) => {
                tracing::warn!(error = %e, "Summary image generation failed");
                ArtifactOutcome::Failed(e.to_string())
            }
        }
    }
}
