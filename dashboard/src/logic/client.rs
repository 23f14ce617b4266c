//! Scoring API Client
//!
//! HTTP client for the scoring service. Responses are checked against the
//! payload schema before anything downstream sees them.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

use super::error::DashboardError;

/// Scoring API configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub server_url: String,
    pub timeout_seconds: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        use crate::constants;

        Self {
            server_url: constants::get_scoring_api_url(),
            timeout_seconds: constants::get_timeout_secs(),
        }
    }
}

// Request/Response types

#[derive(Debug, Serialize)]
pub struct PredictRequest {
    #[serde(rename = "SK_ID_CURR")]
    pub sk_id_curr: i64,
}

/// Wire shape of a successful `/predict` answer
#[derive(Debug, Deserialize)]
pub struct PredictResponse {
    pub probability: f64,
    pub shap_values: Vec<f64>,
    pub feature_names: Vec<String>,
    pub feature_values: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: i64,
    pub model: Option<ModelSummary>,
    pub records: usize,
}

#[derive(Debug, Deserialize)]
pub struct ModelSummary {
    pub kind: String,
    pub feature_count: usize,
    pub tree_count: usize,
}

/// One feature of a scored client
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureAttribution {
    pub name: String,
    pub attribution: f64,
    pub value: Option<f64>,
}

/// Validated scoring answer, features in model column order
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    pub probability: f64,
    pub features: Vec<FeatureAttribution>,
}

impl PredictResponse {
    /// Check the payload schema and zip the parallel arrays.
    pub fn into_result(self) -> Result<ScoringResult, DashboardError> {
        let n = self.feature_names.len();
        if n == 0 {
            return Err(DashboardError::InvalidPayload("no features in response".to_string()));
        }
        if self.shap_values.len() != n || self.feature_values.len() != n {
            return Err(DashboardError::InvalidPayload(format!(
                "{} feature names, {} attribution values, {} feature values",
                n,
                self.shap_values.len(),
                self.feature_values.len()
            )));
        }
        if !self.probability.is_finite() || !(0.0..=100.0).contains(&self.probability) {
            return Err(DashboardError::InvalidPayload(format!(
                "probability {} outside [0, 100]",
                self.probability
            )));
        }
        if let Some(i) = self.shap_values.iter().position(|v| !v.is_finite()) {
            return Err(DashboardError::InvalidPayload(format!(
                "non-finite attribution for {}",
                self.feature_names[i]
            )));
        }
        if let Some(i) = self.feature_values.iter().position(|v| v.is_some_and(|x| !x.is_finite())) {
            return Err(DashboardError::InvalidPayload(format!(
                "non-finite value for {}",
                self.feature_names[i]
            )));
        }

        let features = self.feature_names.into_iter()
            .zip(self.shap_values)
            .zip(self.feature_values)
            .map(|((name, attribution), value)| FeatureAttribution { name, attribution, value })
            .collect();

        Ok(ScoringResult {
            probability: self.probability,
            features,
        })
    }
}

/// Anything that can score one client identifier
pub trait ScoringTransport {
    fn fetch(&self, id: i64) -> impl Future<Output = Result<ScoringResult, DashboardError>>;
}

/// Scoring API client
pub struct ScoringClient {
    config: ClientConfig,
    http_client: reqwest::Client,
}

impl ScoringClient {
    /// Create new scoring client
    pub fn new(config: ClientConfig) -> Result<Self, DashboardError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self { config, http_client })
    }

    pub fn server_url(&self) -> &str {
        &self.config.server_url
    }

    /// Check server health
    pub async fn health_check(&self) -> Result<HealthResponse, DashboardError> {
        let url = format!("{}/health", self.config.server_url);

        let response = self.http_client
            .get(&url)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            response.json().await
                .map_err(|e| DashboardError::InvalidPayload(e.to_string()))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DashboardError::from_response(status.as_u16(), &body))
        }
    }

    /// Score one client
    pub async fn predict(&self, id: i64) -> Result<ScoringResult, DashboardError> {
        let url = format!("{}/predict", self.config.server_url);

        log::debug!("POST {} SK_ID_CURR={}", url, id);
        let response = self.http_client
            .post(&url)
            .json(&PredictRequest { sk_id_curr: id })
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let payload: PredictResponse = response.json().await
                .map_err(|e| DashboardError::InvalidPayload(e.to_string()))?;
            payload.into_result()
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(DashboardError::from_response(status.as_u16(), &body))
        }
    }
}

impl ScoringTransport for ScoringClient {
    fn fetch(&self, id: i64) -> impl Future<Output = Result<ScoringResult, DashboardError>> {
        self.predict(id)
    }
}
