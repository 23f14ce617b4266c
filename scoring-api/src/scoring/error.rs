//! Scoring pipeline errors
//!
//! Every stage of the pipeline fails with one of these kinds. None of them
//! is transient, so callers never retry.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    /// No stored record for the identifier
    #[error("no client record with SK_ID_CURR {0}")]
    NotFound(i64),

    /// Identifier appears more than once and the store rejects duplicates
    #[error("SK_ID_CURR {id} matches {count} records")]
    AmbiguousRecord { id: i64, count: usize },

    /// Columns at inference time differ from the fitted schema
    #[error("feature schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Model (or another artifact) is missing or corrupt
    #[error("model not loaded: {0}")]
    ModelNotLoaded(String),

    /// Attribution method cannot explain this model
    #[error("attribution failed: {0}")]
    Explainer(String),

    /// An output the pipeline guarantees could not be produced
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
}

impl ScoringError {
    /// Stable snake_case tag used in HTTP error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::AmbiguousRecord { .. } => "ambiguous_record",
            Self::SchemaMismatch(_) => "schema_mismatch",
            Self::ModelNotLoaded(_) => "model_not_loaded",
            Self::Explainer(_) => "explainer",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ScoringError::NotFound(1).kind(), "not_found");
        assert_eq!(
            ScoringError::AmbiguousRecord { id: 1, count: 2 }.kind(),
            "ambiguous_record"
        );
        assert_eq!(ScoringError::SchemaMismatch(String::new()).kind(), "schema_mismatch");
    }

    #[test]
    fn test_display_names_identifier() {
        let err = ScoringError::NotFound(100002);
        assert_eq!(err.to_string(), "no client record with SK_ID_CURR 100002");
    }
}
