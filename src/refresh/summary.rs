//! Aggregates published with every refresh

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::CountryRecord;

pub const TOP_N: usize = 5;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GdpRank {
    pub name: String,
    pub estimated_gdp: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    /// Size of the derived batch, not of the table
    pub total: usize,
    pub top5: Vec<GdpRank>,
    pub refreshed_at: DateTime<Utc>,
}

/// Count the batch and rank the countries with a usable, non-zero GDP
pub fn summarize(records: &[CountryRecord], now: DateTime<Utc>) -> Summary {
    let mut ranked: Vec<GdpRank> = records
        .iter()
        .filter_map(|r| match r.estimated_gdp {
            Some(gdp) if gdp != 0.0 && !gdp.is_nan() => Some(GdpRank {
                name: r.name.clone(),
                estimated_gdp: gdp,
            }),
            _ => None,
        })
        .collect();

    ranked.sort_by(|a, b| b.estimated_gdp.total_cmp(&a.estimated_gdp));
    ranked.truncate(TOP_N);

    Summary {
        total: records.len(),
        top5: ranked,
        refreshed_at: now,
    }
}
