//! HTTP error mapping
//!
//! Only upstream failures and lookups explain themselves to the caller;
//! everything else is logged and answered with a generic 500.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::error::{RefreshError, StoreError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("External data source unavailable")]
    ExternalSource { details: String },

    #[error("Country not found")]
    CountryNotFound,

    #[error("Summary image not found")]
    ImageNotFound,

    #[error("Validation failed")]
    Validation(serde_json::Value),

    #[error("Internal server error")]
    Internal(#[source] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::ExternalSource { .. } => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::CountryNotFound | ApiError::ImageNotFound => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RefreshError> for ApiError {
    fn from(err: RefreshError) -> Self {
        match err.public_details() {
            Some(details) => ApiError::ExternalSource { details },
            None => ApiError::Internal(err.into()),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        ApiError::Internal(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.status_code();
        let details = match &self {
            ApiError::ExternalSource { details } => Some(serde_json::Value::from(details.clone())),
            ApiError::Validation(details) => Some(details.clone()),
            ApiError::Internal(source) => {
                tracing::error!(error = ?source, "Request failed");
                None
            }
            ApiError::CountryNotFound | ApiError::ImageNotFound => None,
        };
        let body = ErrorBody {
            error: self.to_string(),
            details,
        };
        (code, Json(body)).into_response()
    }
}
