//! Preprocessor - Fitted scaler applied to stored client records
//!
//! The scaler is fitted offline; this module only replays its transform.
//! Missing values stay missing (NaN) after scaling, the way scikit-learn
//! scalers treat them, so the model decides how to route them.

use serde::Deserialize;

use super::error::ScoringError;
use super::record_store::ClientRecord;

/// Fitted scaler artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FittedScaler {
    /// `(x - mean) / scale`
    Standard {
        feature_names: Vec<String>,
        mean: Vec<f64>,
        scale: Vec<f64>,
    },
    /// `x * scale + min`
    MinMax {
        feature_names: Vec<String>,
        min: Vec<f64>,
        scale: Vec<f64>,
    },
}

impl FittedScaler {
    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::Standard { feature_names, .. } | Self::MinMax { feature_names, .. } => feature_names,
        }
    }

    fn validate(&self) -> Result<(), ScoringError> {
        let (n, offsets, scale) = match self {
            Self::Standard { feature_names, mean, scale } => (feature_names.len(), mean, scale),
            Self::MinMax { feature_names, min, scale } => (feature_names.len(), min, scale),
        };

        if n == 0 {
            return Err(corrupt("no features".to_string()));
        }
        if offsets.len() != n || scale.len() != n {
            return Err(corrupt(format!(
                "{} features but {} offsets and {} scales",
                n, offsets.len(), scale.len()
            )));
        }
        if let Some(i) = offsets.iter().position(|v| !v.is_finite()) {
            return Err(corrupt(format!("non-finite offset for {}", self.feature_names()[i])));
        }
        if let Some(i) = scale.iter().position(|s| !s.is_finite() || *s == 0.0) {
            return Err(corrupt(format!("invalid scale for {}", self.feature_names()[i])));
        }
        Ok(())
    }

    #[inline]
    fn apply(&self, i: usize, x: f64) -> f64 {
        match self {
            Self::Standard { mean, scale, .. } => (x - mean[i]) / scale[i],
            Self::MinMax { min, scale, .. } => x * scale[i] + min[i],
        }
    }
}

/// Model-ready features in fitted column order; NaN marks a missing value
#[derive(Debug, Clone, PartialEq)]
pub struct ScaledFeatureVector(Vec<f64>);

impl ScaledFeatureVector {
    pub fn new(values: Vec<f64>) -> Self {
        Self(values)
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

pub struct Preprocessor {
    scaler: FittedScaler,
}

impl Preprocessor {
    pub fn new(scaler: FittedScaler) -> Result<Self, ScoringError> {
        scaler.validate()?;
        Ok(Self { scaler })
    }

    /// Columns the scaler was fitted on, in fit order
    pub fn feature_names(&self) -> &[String] {
        self.scaler.feature_names()
    }

    /// Columns must match the fitted schema exactly: same names, same order.
    pub fn check_schema(&self, columns: &[String]) -> Result<(), ScoringError> {
        let fitted = self.feature_names();
        if columns == fitted {
            return Ok(());
        }

        for (pos, expected) in fitted.iter().enumerate() {
            match columns.get(pos) {
                Some(found) if found == expected => continue,
                _ => {}
            }
            let detail = match columns.iter().position(|c| c == expected) {
                None => format!("missing column {}", expected),
                Some(at) => format!("column {} at position {}, fitted at {}", expected, at, pos),
            };
            return Err(ScoringError::SchemaMismatch(detail));
        }

        // Every fitted column is in place, so the rest are extras
        let extra = columns.iter()
            .find(|c| !fitted.contains(c))
            .or_else(|| columns.get(fitted.len()))
            .map(String::as_str)
            .unwrap_or("?");
        Err(ScoringError::SchemaMismatch(format!("unexpected column {}", extra)))
    }

    pub fn transform(&self, record: &ClientRecord) -> Result<ScaledFeatureVector, ScoringError> {
        self.check_schema(record.feature_names())?;

        if record.values.len() != self.feature_names().len() {
            return Err(ScoringError::SchemaMismatch(format!(
                "record {} has {} values for {} columns",
                record.id, record.values.len(), self.feature_names().len()
            )));
        }

        let scaled = record.values.iter()
            .enumerate()
            .map(|(i, v)| match v {
                Some(x) => self.scaler.apply(i, *x),
                None => f64::NAN,
            })
            .collect();

        Ok(ScaledFeatureVector::new(scaled))
    }
}

fn corrupt(msg: String) -> ScoringError {
    ScoringError::ModelNotLoaded(format!("scaler: {}", msg))
}
