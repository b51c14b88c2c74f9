//! Country API endpoints
//!
//! ## Endpoints
//!
//! - `POST   /countries/refresh` - Fetch upstream data and reconcile (alias: `POST /refresh`)
//! - `GET    /countries` - List countries (`region`, `currency`, `sort=gdp_desc|gdp_asc`)
//! - `GET    /countries/image` - Latest summary image
//! - `GET    /countries/:name` - Case-insensitive lookup
//! - `DELETE /countries/:name` - Case-insensitive delete
//! - `GET    /status` - Row count and last refresh time

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::error::ApiError;
use super::AppState;
use crate::models::{CountryQuery, GdpSort, StoredCountry};

// ============================================================================
// Request/Response Types
// ============================================================================

/// Query params for country listing; blank values are ignored
#[derive(Debug, Default, Deserialize)]
pub struct ListCountriesParams {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<String>,
}

impl ListCountriesParams {
    fn into_query(self) -> Result<CountryQuery, ApiError> {
        let sort = match non_blank(self.sort) {
            Some(raw) => Some(raw.parse::<GdpSort>().map_err(|reason| {
                ApiError::Validation(serde_json::json!({ "sort": reason }))
            })?),
            None => None,
        };
        Ok(CountryQuery {
            region: non_blank(self.region),
            currency: non_blank(self.currency),
            sort,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub message: String,
    pub total_countries: usize,
    pub last_refreshed_at: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub total_countries: i64,
    pub last_refreshed_at: Option<String>,
}

fn iso_millis(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /countries/refresh
async fn refresh_countries(
    State(state): State<AppState>,
) -> Result<Json<RefreshResponse>, ApiError> {
    let report = state.refresher.refresh().await?;
    Ok(Json(RefreshResponse {
        message: "Refresh successful".to_string(),
        total_countries: report.result.total,
        last_refreshed_at: iso_millis(report.result.last_refreshed_at),
        warning: report.artifact_warning(),
    }))
}

/// GET /countries
async fn list_countries(
    State(state): State<AppState>,
    Query(params): Query<ListCountriesParams>,
) -> Result<Json<Vec<StoredCountry>>, ApiError> {
    let query = params.into_query()?;
    let countries = state.store.list(&query).await?;
    Ok(Json(countries))
}

/// GET /countries/:name
async fn get_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<StoredCountry>, ApiError> {
    state
        .store
        .find_by_name(&name)
        .await?
        .map(Json)
        .ok_or(ApiError::CountryNotFound)
}

/// DELETE /countries/:name
async fn delete_country(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.delete_by_name(&name).await? {
        tracing::info!(name = %name, "Country deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::CountryNotFound)
    }
}

/// GET /status
async fn get_status(State(state): State<AppState>) -> Result<Json<StatusResponse>, ApiError> {
    let status = state.store.status().await?;
    Ok(Json(StatusResponse {
        total_countries: status.total_countries,
        last_refreshed_at: status.last_refreshed_at.map(iso_millis),
    }))
}

/// GET /countries/image
async fn get_summary_image(State(state): State<AppState>) -> Result<Response, ApiError> {
    let reporter = state.refresher.reporter();
    let bytes = reporter
        .load()
        .await
        .map_err(|e| ApiError::Internal(e.into()))?
        .ok_or(ApiError::ImageNotFound)?;

    Ok(([(header::CONTENT_TYPE, reporter.content_type())], bytes).into_response())
}

// ============================================================================
// Router Factory
// ============================================================================

/// Create the country router with all endpoints
pub fn create_country_router(state: AppState) -> Router {
    Router::new()
        .route("/refresh", post(refresh_countries))
        .route("/countries/refresh", post(refresh_countries))
        .route("/countries", get(list_countries))
        .route("/countries/image", get(get_summary_image))
        .route("/countries/:name", get(get_country).delete(delete_country))
        .route("/status", get(get_status))
        .with_state(state)
}
