//! Upstream provider capabilities and the concurrent gateway over them

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::ExternalApiConfig;
use crate::error::{RefreshError, SourceError};
use crate::models::{RateTable, RawCountry};

use super::client::{ExchangeRateClient, RestCountriesClient};

#[async_trait]
pub trait CountriesProvider: Send + Sync {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError>;
}

#[async_trait]
pub trait RatesProvider: Send + Sync {
    async fn fetch_rates(&self) -> Result<RateTable, SourceError>;
}

/// Which upstream a failure is attributed to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamSource {
    Countries,
    ExchangeRates,
    /// Origin cannot be pinned to a single source
    External,
}

impl fmt::Display for UpstreamSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UpstreamSource::Countries => write!(f, "Countries API"),
            UpstreamSource::ExchangeRates => write!(f, "Exchange rates API"),
            UpstreamSource::External => write!(f, "external API"),
        }
    }
}

/// Both datasets of one refresh
#[derive(Debug, Clone)]
pub struct ExternalData {
    pub countries: Vec<RawCountry>,
    pub rates: RateTable,
}

#[derive(Clone)]
pub struct ExternalDataGateway {
    countries: Arc<dyn CountriesProvider>,
    rates: Arc<dyn RatesProvider>,
}

impl ExternalDataGateway {
    pub fn new(countries: Arc<dyn CountriesProvider>, rates: Arc<dyn RatesProvider>) -> Self {
        Self { countries, rates }
    }

    /// Gateway over the real HTTP APIs
    pub fn from_config(config: &ExternalApiConfig) -> anyhow::Result<Self> {
        let countries = RestCountriesClient::new(config.countries_url.clone(), config.timeout)?;
        let rates = ExchangeRateClient::new(config.rates_url.clone(), config.timeout)?;
        Ok(Self::new(Arc::new(countries), Arc::new(rates)))
    }

    /// Fetch both datasets concurrently.
    ///
    /// Both requests always run to completion (or to their own deadline);
    /// any failure fails the whole fetch. A lone failure is attributed to its
    /// source, a double failure to the generic external source.
    pub async fn fetch_external_data(&self) -> Result<ExternalData, RefreshError> {
        let (countries, rates) =
            tokio::join!(self.countries.fetch_countries(), self.rates.fetch_rates());

        match (countries, rates) {
            (Ok(countries), Ok(rates)) => Ok(ExternalData { countries, rates }),
            (Err(e), Ok(_)) => Err(external_failure(UpstreamSource::Countries, e.to_string())),
            (Ok(_), Err(e)) => Err(external_failure(
                UpstreamSource::ExchangeRates,
                e.to_string(),
            )),
            (Err(countries_err), Err(rates_err)) => Err(external_failure(
                UpstreamSource::External,
                format!("{}; {}", countries_err, rates_err),
            )),
        }
    }
}

fn external_failure(origin: UpstreamSource, detail: String) -> RefreshError {
    tracing::warn!(source = %origin, detail = %detail, "External data fetch failed");
    RefreshError::ExternalSource { origin, detail }
}
