//! Country record types shared by the gateway, the refresh pipeline and the stores

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

// ============================================================================
// Upstream wire types
// ============================================================================

/// One entry of the countries catalog (`/v2/all?fields=...`)
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawCountry {
    pub name: String,
    #[serde(default, deserialize_with = "non_empty")]
    pub capital: Option<String>,
    #[serde(default, deserialize_with = "non_empty")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_count")]
    pub population: Option<i64>,
    #[serde(default, deserialize_with = "non_empty")]
    pub flag: Option<String>,
    #[serde(default)]
    pub currencies: Option<Vec<RawCurrency>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RawCurrency {
    #[serde(default, deserialize_with = "non_empty")]
    pub code: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

/// Currency code -> units per USD
pub type RateTable = HashMap<String, f64>;

/// Blank strings from the catalog mean "absent"
fn non_empty<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

/// Any JSON number (or numeric string), truncated toward zero; other values
/// are absent
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    let as_float = match value {
        Some(serde_json::Value::Number(n)) => match n.as_i64() {
            Some(int) => return Ok(Some(int)),
            None => n.as_f64(),
        },
        Some(serde_json::Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(as_float.filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

// ============================================================================
// Records
// ============================================================================

/// A country computed from upstream data, before it is matched against storage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct CountryRecord {
    pub name: String,
    pub capital: Option<String>,
    pub region: Option<String>,
    pub population: i64,
    pub currency_code: Option<String>,
    pub exchange_rate: Option<f64>,
    pub estimated_gdp: Option<f64>,
    pub flag_url: Option<String>,
    pub last_refreshed_at: DateTime<Utc>,
}

impl CountryRecord {
    /// Reconciliation key
    pub fn folded_name(&self) -> String {
        fold_name(&self.name)
    }
}

/// A persisted country row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "database", derive(sqlx::FromRow))]
pub struct StoredCountry {
    pub id: Uuid,
    #[serde(flatten)]
    #[cfg_attr(feature = "database", sqlx(flatten))]
    pub record: CountryRecord,
}

/// Case-folding used for the natural key everywhere (memory store, Postgres
/// `LOWER(name)` index, HTTP lookups)
pub fn fold_name(name: &str) -> String {
    name.to_lowercase()
}

/// Returned to the caller of a successful refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshResult {
    pub total: usize,
    pub last_refreshed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusSnapshot {
    pub total_countries: i64,
    pub last_refreshed_at: Option<DateTime<Utc>>,
}

// ============================================================================
// Listing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdpSort {
    Desc,
    Asc,
}

impl FromStr for GdpSort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gdp_desc" => Ok(GdpSort::Desc),
            "gdp_asc" => Ok(GdpSort::Asc),
            other => Err(format!(
                "unsupported sort '{}', expected gdp_desc or gdp_asc",
                other
            )),
        }
    }
}

impl fmt::Display for GdpSort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GdpSort::Desc => write!(f, "gdp_desc"),
            GdpSort::Asc => write!(f, "gdp_asc"),
        }
    }
}

/// Filters for `GET /countries`; region and currency match exactly
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CountryQuery {
    pub region: Option<String>,
    pub currency: Option<String>,
    pub sort: Option<GdpSort>,
}
