//! Scoring Module - Explainable default-risk pipeline
//!
//! RecordStore -> Preprocessor -> ScoringEngine -> AttributionEngine,
//! orchestrated by `ScoringService`. All artifacts are loaded once and
//! shared read-only between requests.

pub mod artifacts;
pub mod error;
pub mod explain;
pub mod model;
pub mod preprocess;
pub mod record_store;
pub mod service;

#[cfg(test)]
pub(crate) mod fixtures;

// Re-export common types
pub use artifacts::{ArtifactFingerprints, ArtifactPaths};
pub use error::ScoringError;
pub use record_store::DuplicatePolicy;
pub use service::{ScoringResult, ScoringService};
