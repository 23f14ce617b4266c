//! Prediction request/response schema

use serde::{Deserialize, Serialize};

use crate::scoring::ScoringResult;

/// Any integer; absent identifiers are answered by the record store
#[derive(Debug, Deserialize)]
pub struct PredictRequest {
    #[serde(rename = "SK_ID_CURR")]
    pub sk_id_curr: i64,
}

/// Four index-aligned arrays, one entry per model feature
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictResponse {
    /// Default probability in percent
    pub probability: f64,
    pub shap_values: Vec<f64>,
    pub feature_names: Vec<String>,
    pub feature_values: Vec<Option<f64>>,
}

impl From<ScoringResult> for PredictResponse {
    fn from(result: ScoringResult) -> Self {
        let n = result.features.len();
        let mut response = PredictResponse {
            probability: result.probability,
            shap_values: Vec::with_capacity(n),
            feature_names: Vec::with_capacity(n),
            feature_values: Vec::with_capacity(n),
        };

        for feature in result.features {
            response.shap_values.push(feature.attribution);
            response.feature_names.push(feature.name);
            response.feature_values.push(feature.value);
        }

        response
    }
}
