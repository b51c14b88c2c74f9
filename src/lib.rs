//! Country ledger
//!
//! Mirrors country records from two external providers (a countries catalog
//! and a USD exchange-rate feed) into a relational store and publishes a
//! summary image after every refresh.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  HTTP boundary (axum, feature = "server")                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  RefreshService                                                 │
//! │  gateway -> derive -> reconcile (tx) -> summary (best effort)   │
//! └─────────────────────────────────────────────────────────────────┘
//!           │                   │                      │
//!           ▼                   ▼                      ▼
//!   CountriesProvider     CountryStore           SummaryRenderer
//!   RatesProvider         (Postgres / memory)    (SVG card on disk)
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod memory;
pub mod models;
pub mod ports;
pub mod refresh;
pub mod render;

#[cfg(feature = "database")]
pub mod database;

#[cfg(feature = "server")]
pub mod api;

pub use config::AppConfig;
pub use error::{ConfigError, RefreshError, RenderError, SourceError, StoreError};
pub use gateway::{ExternalDataGateway, UpstreamSource};
pub use memory::MemoryCountryStore;
pub use models::{CountryRecord, RawCountry, RateTable, RefreshResult, StoredCountry};
pub use ports::{CountryStore, RefreshTransaction};
pub use refresh::{ArtifactOutcome, RefreshReport, RefreshService};
pub use render::{SummaryReporter, SummaryRenderer, SvgSummaryRenderer};
