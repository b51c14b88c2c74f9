//! Shared fixtures for the integration tests
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use country_ledger::error::SourceError;
use country_ledger::gateway::{CountriesProvider, RatesProvider};
use country_ledger::models::{RawCurrency, RateTable, RawCountry};
use country_ledger::refresh::FixedMultiplier;
use country_ledger::{
    ExternalDataGateway, MemoryCountryStore, RefreshService, SummaryReporter, SvgSummaryRenderer,
};

/// Countries provider whose payload can be swapped between refreshes.
/// `None` makes the next fetch time out.
#[derive(Default)]
pub struct ScriptedCountries {
    payload: Mutex<Option<Vec<RawCountry>>>,
}

impl ScriptedCountries {
    pub fn new(countries: Vec<RawCountry>) -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new(Some(countries)),
        })
    }

    pub fn set(&self, countries: Option<Vec<RawCountry>>) {
        *self.payload.lock().unwrap() = countries;
    }
}

#[async_trait]
impl CountriesProvider for ScriptedCountries {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        self.payload
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::Timeout {
                url: "http://countries.test/v2/all".into(),
            })
    }
}

#[derive(Default)]
pub struct ScriptedRates {
    payload: Mutex<Option<RateTable>>,
}

impl ScriptedRates {
    pub fn new(rates: RateTable) -> Arc<Self> {
        Arc::new(Self {
            payload: Mutex::new(Some(rates)),
        })
    }

    pub fn set(&self, rates: Option<RateTable>) {
        *self.payload.lock().unwrap() = rates;
    }
}

#[async_trait]
impl RatesProvider for ScriptedRates {
    async fn fetch_rates(&self) -> Result<RateTable, SourceError> {
        self.payload
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(|| SourceError::Timeout {
                url: "http://rates.test/latest/USD".into(),
            })
    }
}

pub fn country(name: &str, population: i64, currency: Option<&str>) -> RawCountry {
    RawCountry {
        name: name.to_string(),
        capital: Some(format!("{name} City")),
        region: Some("Africa".to_string()),
        population: Some(population),
        flag: Some(format!("https://flags.test/{}.svg", name.to_lowercase())),
        currencies: currency.map(|code| {
            vec![RawCurrency {
                code: Some(code.to_string()),
                name: None,
                symbol: None,
            }]
        }),
    }
}

pub fn rates(pairs: &[(&str, f64)]) -> RateTable {
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

pub struct Harness {
    pub store: MemoryCountryStore,
    pub countries: Arc<ScriptedCountries>,
    pub rates: Arc<ScriptedRates>,
    pub service: Arc<RefreshService>,
}

/// Refresh service over the memory store with a fixed multiplier of 1000
pub fn harness(
    countries: Vec<RawCountry>,
    rate_table: RateTable,
    image_path: impl AsRef<Path>,
) -> Harness {
    let store = MemoryCountryStore::new();
    let countries = ScriptedCountries::new(countries);
    let rates = ScriptedRates::new(rate_table);
    let gateway = ExternalDataGateway::new(countries.clone(), rates.clone());
    let reporter = SummaryReporter::new(
        Arc::new(SvgSummaryRenderer),
        image_path.as_ref().to_path_buf(),
    );
    let service = Arc::new(
        RefreshService::new(gateway, Arc::new(store.clone()), reporter)
            .with_multiplier(Arc::new(FixedMultiplier(1000))),
    );
    Harness {
        store,
        countries,
        rates,
        service,
    }
}
