//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;
use crate::scoring::ArtifactFingerprints;
use crate::scoring::model::ModelMetadata;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    environment: String,
    timestamp: i64,
    model: Option<ModelMetadata>,
    records: usize,
    artifacts: ArtifactFingerprints,
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    let model = state.service.model_metadata();

    Json(HealthResponse {
        status: if model.is_some() { "healthy" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        environment: state.config.environment.clone(),
        timestamp: chrono::Utc::now().timestamp(),
        model,
        records: state.service.store().len(),
        artifacts: state.fingerprints.as_ref().clone(),
    })
}
