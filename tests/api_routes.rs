//! HTTP boundary tests, driven through the router without a socket
//!
//! Run with: cargo test --test api_routes

#![cfg(feature = "server")]

mod common;

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use common::{country, harness, rates, Harness};
use country_ledger::api::{create_country_router, AppState};
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    router: Router,
    harness: Harness,
    _dir: TempDir,
}

fn app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let mut japan = country("Japan", 125_000_000, Some("JPY"));
    japan.region = Some("Asia".into());
    let harness = harness(
        vec![
            japan,
            country("Nigeria", 1_000_000, Some("NGN")),
            country("Ghana", 2_000_000, Some("GHS")),
            country("Eritrea", 3_000_000, Some("ERN")),
        ],
        rates(&[("JPY", 150.0), ("NGN", 1600.0), ("GHS", 10.0)]),
        dir.path().join("summary.svg"),
    );
    let state = AppState::new(Arc::new(harness.store.clone()), Arc::clone(&harness.service));
    TestApp {
        router: create_country_router(state),
        harness,
        _dir: dir,
    }
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Vec<u8>) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, bytes.to_vec())
}

async fn send_json(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let (status, bytes) = send(router, method, uri).await;
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn names(body: &Value) -> Vec<&str> {
    body.as_array()
        .unwrap()
        .iter()
        .map(|row| row["name"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn refresh_reports_totals() {
    let app = app();
    let (status, body) = send_json(&app.router, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Refresh successful");
    assert_eq!(body["total_countries"], 4);
    assert!(body["last_refreshed_at"].as_str().unwrap().ends_with('Z'));
    assert!(body.get("warning").is_none());

    let (status, _) = send_json(&app.router, "POST", "/refresh").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn lookup_ignores_case() {
    let app = app();
    send(&app.router, "POST", "/countries/refresh").await;

    let (status, body) = send_json(&app.router, "GET", "/countries/japan").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Japan");
    assert_eq!(body["region"], "Asia");
    assert_eq!(body["currency_code"], "JPY");
    assert!(body["id"].is_string());

    let (status, body) = send_json(&app.router, "GET", "/countries/Atlantis").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Country not found");
}

#[tokio::test]
async fn listing_filters_and_sorts() {
    let app = app();
    send(&app.router, "POST", "/countries/refresh").await;

    let (status, body) = send_json(&app.router, "GET", "/countries?region=Africa").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(names(&body), vec!["Eritrea", "Ghana", "Nigeria"]);

    let (_, body) = send_json(&app.router, "GET", "/countries?currency=NGN").await;
    assert_eq!(names(&body), vec!["Nigeria"]);

    // Eritrea has no rate, so its GDP is null: last when descending, first when ascending
    let (_, body) = send_json(&app.router, "GET", "/countries?sort=gdp_desc").await;
    assert_eq!(names(&body), vec!["Japan", "Ghana", "Nigeria", "Eritrea"]);

    let (_, body) = send_json(&app.router, "GET", "/countries?sort=gdp_asc&region=").await;
    assert_eq!(names(&body), vec!["Eritrea", "Nigeria", "Ghana", "Japan"]);
}

#[tokio::test]
async fn unknown_sort_is_rejected() {
    let app = app();
    let (status, body) = send_json(&app.router, "GET", "/countries?sort=population").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Validation failed");
    assert!(body["details"]["sort"].as_str().unwrap().contains("population"));
}

#[tokio::test]
async fn delete_then_missing() {
    let app = app();
    send(&app.router, "POST", "/countries/refresh").await;

    let (status, bytes) = send(&app.router, "DELETE", "/countries/GHANA").await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(bytes.is_empty());

    let (status, body) = send_json(&app.router, "DELETE", "/countries/ghana").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Country not found");

    let (_, body) = send_json(&app.router, "GET", "/status").await;
    assert_eq!(body["total_countries"], 3);
}

#[tokio::test]
async fn status_before_and_after_refresh() {
    let app = app();
    let (status, body) = send_json(&app.router, "GET", "/status").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_countries"], 0);
    assert!(body["last_refreshed_at"].is_null());

    let (_, refreshed) = send_json(&app.router, "POST", "/countries/refresh").await;
    let (_, body) = send_json(&app.router, "GET", "/status").await;
    assert_eq!(body["total_countries"], 4);
    assert_eq!(body["last_refreshed_at"], refreshed["last_refreshed_at"]);
}

#[tokio::test]
async fn summary_image_served_after_refresh() {
    let app = app();
    let (status, body) = send_json(&app.router, "GET", "/countries/image").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Summary image not found");

    send(&app.router, "POST", "/countries/refresh").await;

    let request = Request::builder()
        .uri("/countries/image")
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "image/svg+xml"
    );
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let svg = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(svg.contains("Total countries: 4"));
}

#[tokio::test]
async fn upstream_failure_is_503() {
    let app = app();
    app.harness.countries.set(None);

    let (status, body) = send_json(&app.router, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "External data source unavailable");
    assert_eq!(body["details"], "Could not fetch data from Countries API");

    let (_, body) = send_json(&app.router, "GET", "/status").await;
    assert_eq!(body["total_countries"], 0);
}

#[tokio::test]
async fn storage_failure_is_generic_500() {
    let app = app();
    app.harness.store.fail_marker_upsert();

    let (status, body) = send_json(&app.router, "POST", "/countries/refresh").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Internal server error");
    assert!(body.get("details").is_none());

    let (_, body) = send_json(&app.router, "GET", "/status").await;
    assert_eq!(body["total_countries"], 0);
}
