//! Exchange-rate feed response types
//!
//! Reference: https://open.er-api.com/v6/latest/USD

use serde::Deserialize;

use crate::models::RateTable;

/// Top-level response of the rate feed
#[derive(Debug, Clone, Deserialize)]
pub struct RatesResponse {
    /// "success" or "error"
    #[serde(default)]
    pub result: Option<String>,
    #[serde(default)]
    pub base_code: Option<String>,
    #[serde(rename = "error-type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub rates: RateTable,
}

impl RatesResponse {
    pub fn is_error(&self) -> bool {
        self.result.as_deref() == Some("error")
    }
}
