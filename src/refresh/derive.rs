//! Record derivation: raw catalog entries + rate table -> country records
//!
//! GDP rules per country:
//! - no currency            -> rate NULL, GDP 0
//! - currency with a rate   -> GDP = population * multiplier / rate
//! - currency without rate  -> rate NULL, GDP NULL

use std::ops::RangeInclusive;

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::models::{CountryRecord, RateTable, RawCountry};

pub const MULTIPLIER_RANGE: RangeInclusive<u32> = 1000..=2000;

/// Source of the per-country GDP multiplier
pub trait MultiplierSource: Send + Sync {
    fn draw(&self) -> u32;
}

/// Uniform draw from [`MULTIPLIER_RANGE`], independent per call
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomMultiplier;

impl MultiplierSource for RandomMultiplier {
    fn draw(&self) -> u32 {
        rand::thread_rng().gen_range(MULTIPLIER_RANGE)
    }
}

/// Always the same multiplier
#[derive(Debug, Clone, Copy)]
pub struct FixedMultiplier(pub u32);

impl MultiplierSource for FixedMultiplier {
    fn draw(&self) -> u32 {
        self.0
    }
}

/// One record per raw country, in input order, all stamped with `now`
pub fn derive(
    raw: &[RawCountry],
    rates: &RateTable,
    now: DateTime<Utc>,
    multiplier: &dyn MultiplierSource,
) -> Vec<CountryRecord> {
    raw.iter()
        .map(|country| derive_one(country, rates, now, multiplier))
        .collect()
}

fn derive_one(
    country: &RawCountry,
    rates: &RateTable,
    now: DateTime<Utc>,
    multiplier: &dyn MultiplierSource,
) -> CountryRecord {
    let population = country.population.unwrap_or(0).max(0);

    // Only the first listed currency counts
    let currency_code = country
        .currencies
        .as_ref()
        .and_then(|list| list.first())
        .and_then(|currency| currency.code.clone());

    let (exchange_rate, estimated_gdp) = match &currency_code {
        None => (None, Some(0.0)),
        Some(code) => match rates.get(code).copied().filter(|r| usable_rate(*r)) {
            Some(rate) => {
                let gdp = population as f64 * f64::from(multiplier.draw()) / rate;
                (Some(rate), Some(gdp))
            }
            None => (None, None),
        },
    };

    CountryRecord {
        name: country.name.clone(),
        capital: country.capital.clone(),
        region: country.region.clone(),
        population,
        currency_code,
        exchange_rate,
        estimated_gdp,
        flag_url: country.flag.clone(),
        last_refreshed_at: now,
    }
}

/// Zero, negative or non-finite rates cannot divide a population
fn usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}
