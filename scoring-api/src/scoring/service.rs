//! Scoring Service - lookup, scale, predict, explain
//!
//! Stages run one after another on the calling thread. The first failing
//! stage aborts the request and its error is returned unchanged.

use std::time::Instant;

use serde::Serialize;

use super::error::ScoringError;
use super::explain::AttributionEngine;
use super::model::{ModelMetadata, ScoringEngine};
use super::preprocess::Preprocessor;
use super::record_store::RecordStore;

/// Relative tolerance for SHAP additivity
const ADDITIVITY_TOLERANCE: f64 = 1e-6;

/// One feature of a scored record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureAttribution {
    pub name: String,
    /// Signed contribution to the log-odds of default
    pub attribution: f64,
    /// Raw (unscaled) stored value
    pub value: Option<f64>,
}

/// Probability in percent plus per-feature attribution, in model column order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoringResult {
    pub probability: f64,
    pub features: Vec<FeatureAttribution>,
}

pub struct ScoringService {
    store: RecordStore,
    preprocessor: Preprocessor,
    engine: ScoringEngine,
    attribution: AttributionEngine,
}

impl ScoringService {
    /// Model and scaler must agree on the feature schema.
    pub fn new(store: RecordStore, preprocessor: Preprocessor, engine: ScoringEngine) -> Result<Self, ScoringError> {
        let model = engine.model()?.clone();

        if model.feature_names() != preprocessor.feature_names() {
            return Err(ScoringError::ModelNotLoaded(format!(
                "model has {} features, scaler was fitted on {} with different names or order",
                model.feature_names().len(),
                preprocessor.feature_names().len()
            )));
        }

        Ok(Self {
            store,
            preprocessor,
            engine,
            attribution: AttributionEngine::new(model),
        })
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn attribution(&self) -> &AttributionEngine {
        &self.attribution
    }

    pub fn model_metadata(&self) -> Option<ModelMetadata> {
        self.engine.metadata()
    }

    /// Dataset columns disagreeing with the fitted scaler, if any
    pub fn schema_check(&self) -> Result<(), ScoringError> {
        self.preprocessor.check_schema(self.store.feature_names())
    }

    pub fn score(&self, id: i64) -> Result<ScoringResult, ScoringError> {
        let _span = tracing::debug_span!("score", sk_id_curr = id).entered();
        let start = Instant::now();

        let record = self.store.lookup(id)?;
        let vector = self.preprocessor.transform(record)?;
        let probability = self.engine.predict(&vector)?;
        tracing::debug!("Inference done in {:?}", start.elapsed());

        let explanation = self.attribution.explain(vector.as_slice())?;
        tracing::debug!("Attribution done in {:?}", start.elapsed());

        let raw = self.engine.raw_output(&vector)?;
        let reconstructed = explanation.reconstructed_output();
        if (reconstructed - raw).abs() > ADDITIVITY_TOLERANCE * raw.abs().max(1.0) {
            return Err(ScoringError::InvariantViolation(format!(
                "attribution sums to {} but model output is {}",
                reconstructed, raw
            )));
        }

        let probability = probability * 100.0;
        if !(0.0..=100.0).contains(&probability) {
            return Err(ScoringError::InvariantViolation(format!(
                "probability {} outside [0, 100]",
                probability
            )));
        }

        let features = record.feature_names().iter()
            .zip(&explanation.values)
            .zip(&record.values)
            .map(|((name, attribution), value)| FeatureAttribution {
                name: name.clone(),
                attribution: *attribution,
                value: *value,
            })
            .collect();

        Ok(ScoringResult { probability, features })
    }
}
