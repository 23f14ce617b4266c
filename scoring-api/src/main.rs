//! Credit Scoring API Server
//!
//! Scores a loan applicant's default risk from the stored feature record and
//! explains the score with per-feature SHAP values.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     SCORING API                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  POST /predict {"SK_ID_CURR": id}                           │
//! │        │                                                    │
//! │        ▼                                                    │
//! │  RecordStore ─► Preprocessor ─► ScoringEngine               │
//! │                                      │                      │
//! │                                      ▼                      │
//! │                              AttributionEngine (SHAP)       │
//! │                                      │                      │
//! │        {probability, shap_values, feature_names,            │
//! │         feature_values}  ◄───────────┘                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod models;
mod handlers;
mod scoring;
mod error;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    // Initialize logging
    let production = config.is_production();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "scoring_api=debug,tower_http=debug".into()))
        .with(production.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!production).then(|| tracing_subscriber::fmt::layer()))
        .init();

    tracing::info!("Credit Scoring API starting...");

    // Load artifacts; the service never runs half-loaded
    let paths = config.artifact_paths();
    let (service, fingerprints) = scoring::artifacts::load(&paths, config.duplicate_policy)
        .context("Failed to load scoring artifacts")?;

    tracing::info!("Artifacts: model={} scaler={} dataset={}",
        &fingerprints.model[..12], &fingerprints.scaler[..12], &fingerprints.dataset[..12]);

    if let Err(e) = service.schema_check() {
        tracing::warn!("Dataset does not match the fitted schema, requests will fail: {}", e);
    }
    if let Err(e) = service.attribution().check_supported() {
        tracing::warn!("Model cannot be explained, requests will fail: {}", e);
    }

    // Build application state
    let state = AppState {
        service: Arc::new(service),
        fingerprints: Arc::new(fingerprints),
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await
        .context("Server error")?;

    Ok(())
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<scoring::ScoringService>,
    pub fingerprints: Arc<scoring::ArtifactFingerprints>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/predict", post(handlers::predict::predict))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
