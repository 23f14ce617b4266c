//! Prediction handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};

use crate::{AppState, AppError, AppResult};
use crate::models::{PredictRequest, PredictResponse};

/// Score one client: probability plus SHAP values
pub async fn predict(
    State(state): State<AppState>,
    payload: Result<Json<PredictRequest>, JsonRejection>,
) -> AppResult<Json<PredictResponse>> {
    let Json(req) = payload.map_err(|e| AppError::ValidationError(e.body_text()))?;

    let id = req.sk_id_curr;
    let request_id = uuid::Uuid::new_v4();
    let service = state.service.clone();

    // Inference is CPU-bound; keep it off the async workers
    let result = tokio::task::spawn_blocking(move || service.score(id)).await?;

    match result {
        Ok(scored) => {
            tracing::info!(%request_id, sk_id_curr = id, probability = scored.probability, "Client scored");
            Ok(Json(scored.into()))
        }
        Err(e) => {
            tracing::warn!(%request_id, sk_id_curr = id, kind = e.kind(), "Scoring failed: {}", e);
            Err(e.into())
        }
    }
}
