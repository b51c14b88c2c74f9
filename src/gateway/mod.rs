//! External data gateway
//!
//! This module provides:
//! - Provider traits for the countries catalog and the exchange-rate feed
//! - reqwest-backed clients for both upstream APIs
//! - The gateway that fetches both concurrently and classifies failures by origin

pub mod client;
pub mod providers;
pub mod types;

pub use client::{ExchangeRateClient, RestCountriesClient};
pub use providers::{
    CountriesProvider, ExternalData, ExternalDataGateway, RatesProvider, UpstreamSource,
};
pub use types::RatesResponse;
