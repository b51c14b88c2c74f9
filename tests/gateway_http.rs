//! Upstream clients against local stub servers
//!
//! Run with: cargo test --test gateway_http

#![cfg(feature = "server")]

use std::sync::Arc;
use std::time::Duration;

use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use country_ledger::error::SourceError;
use country_ledger::gateway::{
    CountriesProvider, ExchangeRateClient, RatesProvider, RestCountriesClient,
};
use country_ledger::{ExternalDataGateway, RefreshError, UpstreamSource};
use serde_json::json;
use tokio::net::TcpListener;

const TIMEOUT: Duration = Duration::from_millis(300);

async fn stub_server() -> String {
    let app = Router::new()
        .route(
            "/countries",
            get(|| async {
                Json(json!([
                    {
                        "name": "Nigeria",
                        "capital": "Abuja",
                        "region": "Africa",
                        "population": 206139587,
                        "flag": "https://flagcdn.com/ng.svg",
                        "currencies": [{"code": "NGN", "name": "Nigerian naira", "symbol": "₦"}],
                        "independent": true
                    },
                    {"name": "Bouvet Island", "region": "Antarctic", "population": 0}
                ]))
            }),
        )
        .route(
            "/rates",
            get(|| async {
                Json(json!({
                    "result": "success",
                    "base_code": "USD",
                    "rates": {"USD": 1, "NGN": 1600.25}
                }))
            }),
        )
        .route(
            "/rates-error",
            get(|| async { Json(json!({"result": "error", "error-type": "unsupported-code"})) }),
        )
        .route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(3)).await;
                Json(json!([]))
            }),
        )
        .route("/broken", get(|| async { StatusCode::BAD_GATEWAY }))
        .route("/garbage", get(|| async { "<html>maintenance</html>" }));

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn countries_client_decodes_catalog() {
    let base = stub_server().await;
    let client = RestCountriesClient::new(format!("{base}/countries"), TIMEOUT).unwrap();

    let countries = client.fetch_countries().await.unwrap();
    assert_eq!(countries.len(), 2);
    assert_eq!(countries[0].name, "Nigeria");
    assert_eq!(
        countries[0].currencies.as_ref().unwrap()[0].code.as_deref(),
        Some("NGN")
    );
    assert_eq!(countries[1].capital, None);
    assert_eq!(countries[1].currencies, None);
}

#[tokio::test]
async fn rates_client_returns_table() {
    let base = stub_server().await;
    let client = ExchangeRateClient::new(format!("{base}/rates"), TIMEOUT).unwrap();

    let rates = client.fetch_rates().await.unwrap();
    assert_eq!(rates.get("NGN"), Some(&1600.25));
    assert_eq!(rates.get("USD"), Some(&1.0));
}

#[tokio::test]
async fn rates_error_body_is_a_failure() {
    let base = stub_server().await;
    let client = ExchangeRateClient::new(format!("{base}/rates-error"), TIMEOUT).unwrap();

    match client.fetch_rates().await.unwrap_err() {
        SourceError::Upstream { message, .. } => assert_eq!(message, "unsupported-code"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let base = stub_server().await;
    let client = RestCountriesClient::new(format!("{base}/slow"), TIMEOUT).unwrap();

    let err = client.fetch_countries().await.unwrap_err();
    assert!(matches!(err, SourceError::Timeout { .. }), "got {err}");
}

#[tokio::test]
async fn non_success_status_is_a_failure() {
    let base = stub_server().await;
    let client = RestCountriesClient::new(format!("{base}/broken"), TIMEOUT).unwrap();

    match client.fetch_countries().await.unwrap_err() {
        SourceError::Status { status, .. } => assert_eq!(status, 502),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unparsable_body_is_a_failure() {
    let base = stub_server().await;
    let client = RestCountriesClient::new(format!("{base}/garbage"), TIMEOUT).unwrap();

    let err = client.fetch_countries().await.unwrap_err();
    assert!(matches!(err, SourceError::Decode { .. }), "got {err}");
}

#[tokio::test]
async fn gateway_names_the_rate_source_on_timeout() {
    let base = stub_server().await;
    let gateway = ExternalDataGateway::new(
        Arc::new(RestCountriesClient::new(format!("{base}/countries"), TIMEOUT).unwrap()),
        Arc::new(ExchangeRateClient::new(format!("{base}/slow"), TIMEOUT).unwrap()),
    );

    let err = gateway.fetch_external_data().await.unwrap_err();
    assert_eq!(
        err.public_details().as_deref(),
        Some("Could not fetch data from Exchange rates API")
    );
    match err {
        RefreshError::ExternalSource { origin, .. } => {
            assert_eq!(origin, UpstreamSource::ExchangeRates)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn unreachable_upstream_is_a_failure() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = RestCountriesClient::new(format!("http://{addr}/countries"), TIMEOUT).unwrap();
    let err = client.fetch_countries().await.unwrap_err();
    assert!(
        matches!(err, SourceError::Transport { .. } | SourceError::Timeout { .. }),
        "got {err}"
    );
}
