//! Error types for the refresh pipeline and its I/O boundaries
//!
//! Derivation is pure and never fails; only fetching, persisting and rendering
//! can. Each boundary gets its own `thiserror` enum and the orchestrator folds
//! the fatal ones into [`RefreshError`].

use thiserror::Error;

use crate::gateway::UpstreamSource;

/// Failure of a single upstream request
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("{url} reported an error: {message}")]
    Upstream { url: String, message: String },
}

impl SourceError {
    /// Classify a reqwest failure for the given endpoint
    pub fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            SourceError::Timeout { url }
        } else if let Some(status) = err.status() {
            SourceError::Status {
                url,
                status: status.as_u16(),
            }
        } else if err.is_decode() {
            SourceError::Decode {
                url,
                message: err.to_string(),
            }
        } else {
            SourceError::Transport {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Storage-layer failure
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate country name (case-insensitive): {0}")]
    DuplicateName(String),

    #[error("invalid stored value for {field}: {value}")]
    Corrupt { field: &'static str, value: String },

    #[error("storage backend: {0}")]
    Backend(#[from] anyhow::Error),
}

#[cfg(feature = "database")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        // 23505 = unique_violation
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.code().as_deref() == Some("23505") {
                return StoreError::DuplicateName(db_err.message().to_string());
            }
        }
        StoreError::Backend(anyhow::anyhow!(err))
    }
}

/// Failure while producing or writing the summary artifact
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("summary formatting failed: {0}")]
    Format(#[from] std::fmt::Error),

    #[error("could not write summary image to {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Fatal refresh outcomes
#[derive(Error, Debug)]
pub enum RefreshError {
    /// One or both upstream sources failed; nothing was written
    #[error("External data source unavailable: could not fetch data from {origin}")]
    ExternalSource {
        origin: UpstreamSource,
        detail: String,
    },

    /// Reconciliation failed and every write of the attempt was rolled back
    #[error("persistence failure: {0}")]
    Persistence(#[from] StoreError),
}

impl RefreshError {
    /// User-facing sentence naming the failed source, `None` for internal failures
    pub fn public_details(&self) -> Option<String> {
        match self {
            RefreshError::ExternalSource { origin, .. } => {
                Some(format!("Could not fetch data from {}", origin))
            }
            RefreshError::Persistence(_) => None,
        }
    }
}

/// Startup configuration problems
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} was not found")]
    Missing(&'static str),

    #[error("{var} has invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}
