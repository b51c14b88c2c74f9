//! REST API for the country ledger

pub mod country_routes;
pub mod error;

use std::sync::Arc;

use crate::ports::CountryStore;
use crate::refresh::RefreshService;

pub use country_routes::create_country_router;
pub use error::{ApiError, ErrorBody};

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn CountryStore>,
    pub refresher: Arc<RefreshService>,
}

impl AppState {
    pub fn new(store: Arc<dyn CountryStore>, refresher: Arc<RefreshService>) -> Self {
        Self { store, refresher }
    }
}
