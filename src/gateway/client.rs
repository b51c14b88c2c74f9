//! Upstream API clients
//!
//! One reqwest client per upstream, each with its own request deadline so a
//! slow source never shortens the other's budget.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;

use super::providers::{CountriesProvider, RatesProvider};
use super::types::RatesResponse;
use crate::error::SourceError;
use crate::models::{RateTable, RawCountry};

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// GET `url` and decode a JSON body, mapping every failure to a `SourceError`
async fn get_json<T: DeserializeOwned>(client: &Client, url: &str) -> Result<T, SourceError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| SourceError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(SourceError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    let text = response
        .text()
        .await
        .map_err(|e| SourceError::from_reqwest(url, e))?;

    serde_json::from_str(&text).map_err(|e| SourceError::Decode {
        url: url.to_string(),
        message: format!("line {} col {}: {}", e.line(), e.column(), e),
    })
}

/// Countries catalog client (restcountries v2 shape)
pub struct RestCountriesClient {
    client: Client,
    url: String,
}

impl RestCountriesClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl CountriesProvider for RestCountriesClient {
    async fn fetch_countries(&self) -> Result<Vec<RawCountry>, SourceError> {
        let countries: Vec<RawCountry> = get_json(&self.client, &self.url).await?;
        tracing::debug!(url = %self.url, count = countries.len(), "Fetched countries catalog");
        Ok(countries)
    }
}

/// USD exchange-rate feed client (open.er-api shape)
pub struct ExchangeRateClient {
    client: Client,
    url: String,
}

impl ExchangeRateClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl RatesProvider for ExchangeRateClient {
    async fn fetch_rates(&self) -> Result<RateTable, SourceError> {
        let response: RatesResponse = get_json(&self.client, &self.url).await?;
        if response.is_error() {
            return Err(SourceError::Upstream {
                url: self.url.clone(),
                message: response
                    .error_type
                    .unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        tracing::debug!(url = %self.url, count = response.rates.len(), "Fetched exchange rates");
        Ok(response.rates)
    }
}
