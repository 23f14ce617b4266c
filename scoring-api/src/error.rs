//! Error handling

use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
    Json,
};
use serde_json::json;

use crate::scoring::ScoringError;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub enum AppError {
    // Request errors
    ValidationError(String),

    // Pipeline errors
    Scoring(ScoringError),

    // Generic errors
    InternalError(String),
}

impl AppError {
    fn kind(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "invalid_request",
            AppError::Scoring(err) => err.kind(),
            AppError::InternalError(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();
        let (status, error_message) = match &self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Scoring(err @ ScoringError::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()),
            AppError::Scoring(err @ ScoringError::AmbiguousRecord { .. }) => (StatusCode::CONFLICT, err.to_string()),
            AppError::Scoring(err @ ScoringError::ModelNotLoaded(_)) => {
                tracing::error!("Model unavailable: {}", err);
                (StatusCode::SERVICE_UNAVAILABLE, "Model not loaded".to_string())
            }
            AppError::Scoring(err @ ScoringError::SchemaMismatch(_)) => {
                tracing::error!("Schema drift: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
            }
            AppError::Scoring(err @ ScoringError::Explainer(_)) => {
                tracing::error!("Explainer error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Attribution could not be computed".to_string())
            }
            AppError::Scoring(err @ ScoringError::InvariantViolation(_)) => {
                tracing::error!("Invariant violation: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Scoring produced an invalid result".to_string())
            }
            AppError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
            "kind": kind,
            "status": status.as_u16()
        }));

        (status, body).into_response()
    }
}

impl From<ScoringError> for AppError {
    fn from(err: ScoringError) -> Self {
        AppError::Scoring(err)
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::InternalError(format!("scoring task failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (AppError::ValidationError("bad".into()), StatusCode::BAD_REQUEST),
            (ScoringError::NotFound(1).into(), StatusCode::NOT_FOUND),
            (ScoringError::AmbiguousRecord { id: 1, count: 2 }.into(), StatusCode::CONFLICT),
            (ScoringError::ModelNotLoaded("x".into()).into(), StatusCode::SERVICE_UNAVAILABLE),
            (ScoringError::SchemaMismatch("x".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (ScoringError::Explainer("x".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
            (ScoringError::InvariantViolation("x".into()).into(), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }
}
