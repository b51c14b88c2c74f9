//! Refresh pipeline
//!
//! fetch -> derive -> reconcile (transactional) -> summary image (best effort)

pub mod derive;
pub mod reconcile;
pub mod service;
pub mod summary;

pub use derive::{derive, FixedMultiplier, MultiplierSource, RandomMultiplier, MULTIPLIER_RANGE};
pub use reconcile::{reconcile, ReconcileStats};
pub use service::{ArtifactOutcome, RefreshReport, RefreshService};
pub use summary::{summarize, GdpRank, Summary};
