//! Scoring Engine - Binary default-risk classifier
//!
//! Two artifact kinds are understood:
//! - `tree_ensemble`: gradient-boosted trees, raw output in log-odds
//! - `logistic`: linear model on the scaled features
//!
//! Both produce a raw margin that goes through the logistic link to give
//! the class-1 (default) probability.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::ScoringError;
use super::preprocess::ScaledFeatureVector;

// ============================================================================
// TREES
// ============================================================================

/// One node of a decision tree. Children always have a larger index than
/// their parent, so walking a tree always terminates.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
        /// Branch taken by a missing value
        #[serde(default)]
        missing_left: bool,
        /// Training samples that reached this node
        #[serde(default)]
        cover: Option<f64>,
    },
    Leaf {
        value: f64,
        #[serde(default)]
        cover: Option<f64>,
    },
}

impl TreeNode {
    pub fn cover(&self) -> Option<f64> {
        match self {
            Self::Split { cover, .. } | Self::Leaf { cover, .. } => *cover,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Child followed by `x` at a split node
    #[inline]
    pub fn route(x: f64, threshold: f64, left: usize, right: usize, missing_left: bool) -> usize {
        if x.is_nan() {
            if missing_left { left } else { right }
        } else if x <= threshold {
            left
        } else {
            right
        }
    }

    pub fn predict(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value, .. } => return *value,
                TreeNode::Split { feature, threshold, left, right, missing_left, .. } => {
                    idx = Self::route(x[*feature], *threshold, *left, *right, *missing_left);
                }
            }
        }
    }

    pub fn has_covers(&self) -> bool {
        self.nodes.iter().all(|n| n.cover().is_some_and(|c| c > 0.0 && c.is_finite()))
    }

    fn validate(&self, n_features: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("empty tree".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split { feature, threshold, left, right, .. } => {
                    if *feature >= n_features {
                        return Err(format!("node {} splits on feature {} of {}", idx, feature, n_features));
                    }
                    if threshold.is_nan() {
                        return Err(format!("node {} has NaN threshold", idx));
                    }
                    if left == right {
                        return Err(format!("node {} has identical children", idx));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("node {} has invalid child {}", idx, child));
                        }
                    }
                }
                TreeNode::Leaf { value, .. } => {
                    if !value.is_finite() {
                        return Err(format!("node {} has non-finite leaf value", idx));
                    }
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// CLASSIFIER
// ============================================================================

/// Trained classifier artifact
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Classifier {
    TreeEnsemble {
        feature_names: Vec<String>,
        /// Initial log-odds before any tree
        #[serde(default)]
        base_score: f64,
        trees: Vec<DecisionTree>,
    },
    Logistic {
        feature_names: Vec<String>,
        intercept: f64,
        coefficients: Vec<f64>,
        /// Background means of the scaled training features
        #[serde(default)]
        feature_means: Option<Vec<f64>>,
    },
}

impl Classifier {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TreeEnsemble { .. } => "tree_ensemble",
            Self::Logistic { .. } => "logistic",
        }
    }

    pub fn feature_names(&self) -> &[String] {
        match self {
            Self::TreeEnsemble { feature_names, .. } | Self::Logistic { feature_names, .. } => feature_names,
        }
    }

    pub fn tree_count(&self) -> usize {
        match self {
            Self::TreeEnsemble { trees, .. } => trees.len(),
            Self::Logistic { .. } => 0,
        }
    }

    pub fn validate(&self) -> Result<(), ScoringError> {
        let n = self.feature_names().len();
        if n == 0 {
            return Err(corrupt("no features".to_string()));
        }

        match self {
            Self::TreeEnsemble { base_score, trees, .. } => {
                if !base_score.is_finite() {
                    return Err(corrupt("non-finite base_score".to_string()));
                }
                if trees.is_empty() {
                    return Err(corrupt("ensemble has no trees".to_string()));
                }
                for (t, tree) in trees.iter().enumerate() {
                    tree.validate(n).map_err(|e| corrupt(format!("tree {}: {}", t, e)))?;
                }
            }
            Self::Logistic { intercept, coefficients, feature_means, .. } => {
                if coefficients.len() != n {
                    return Err(corrupt(format!("{} coefficients for {} features", coefficients.len(), n)));
                }
                if !intercept.is_finite() || coefficients.iter().any(|c| !c.is_finite()) {
                    return Err(corrupt("non-finite weights".to_string()));
                }
                if let Some(means) = feature_means {
                    if means.len() != n {
                        return Err(corrupt(format!("{} feature means for {} features", means.len(), n)));
                    }
                }
            }
        }
        Ok(())
    }

    /// Raw margin (log-odds of default)
    pub fn raw_output(&self, x: &[f64]) -> f64 {
        match self {
            Self::TreeEnsemble { base_score, trees, .. } => {
                base_score + trees.iter().map(|t| t.predict(x)).sum::<f64>()
            }
            Self::Logistic { intercept, coefficients, .. } => {
                intercept + coefficients.iter().zip(x).map(|(c, v)| c * v).sum::<f64>()
            }
        }
    }
}

/// Numerically stable logistic link
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

fn corrupt(msg: String) -> ScoringError {
    ScoringError::ModelNotLoaded(format!("model: {}", msg))
}

// ============================================================================
// ENGINE
// ============================================================================

/// Model summary for health checks and logs
#[derive(Debug, Clone, Serialize)]
pub struct ModelMetadata {
    pub kind: String,
    pub feature_count: usize,
    pub tree_count: usize,
    pub loaded_at: chrono::DateTime<chrono::Utc>,
}

/// Holds the classifier once loaded; read-only afterwards.
pub struct ScoringEngine {
    model: Option<Arc<Classifier>>,
    loaded_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl ScoringEngine {
    pub fn unloaded() -> Self {
        Self { model: None, loaded_at: None }
    }

    pub fn new(model: Classifier) -> Result<Self, ScoringError> {
        let mut engine = Self::unloaded();
        engine.load(model)?;
        Ok(engine)
    }

    pub fn load(&mut self, model: Classifier) -> Result<(), ScoringError> {
        model.validate()?;
        tracing::info!(
            "Model loaded: {} with {} features, {} trees",
            model.kind(), model.feature_names().len(), model.tree_count()
        );
        self.model = Some(Arc::new(model));
        self.loaded_at = Some(chrono::Utc::now());
        Ok(())
    }

    /// Shared handle to the loaded classifier
    pub fn model(&self) -> Result<&Arc<Classifier>, ScoringError> {
        self.model.as_ref()
            .ok_or_else(|| ScoringError::ModelNotLoaded("no model artifact loaded".to_string()))
    }

    pub fn metadata(&self) -> Option<ModelMetadata> {
        let model = self.model.as_ref()?;
        Some(ModelMetadata {
            kind: model.kind().to_string(),
            feature_count: model.feature_names().len(),
            tree_count: model.tree_count(),
            loaded_at: self.loaded_at?,
        })
    }

    pub fn raw_output(&self, vector: &ScaledFeatureVector) -> Result<f64, ScoringError> {
        let model = self.model()?;
        let expected = model.feature_names().len();
        if vector.len() != expected {
            return Err(ScoringError::SchemaMismatch(format!(
                "model expects {} features, got {}",
                expected, vector.len()
            )));
        }
        Ok(model.raw_output(vector.as_slice()))
    }

    /// Class-1 probability in [0, 1]
    pub fn predict(&self, vector: &ScaledFeatureVector) -> Result<f64, ScoringError> {
        let raw = self.raw_output(vector)?;
        if !raw.is_finite() {
            return Err(ScoringError::InvariantViolation(format!("non-finite model output {}", raw)));
        }
        let probability = sigmoid(raw);
        if !(0.0..=1.0).contains(&probability) {
            return Err(ScoringError::InvariantViolation(format!("probability {} outside [0, 1]", probability)));
        }
        Ok(probability)
    }
}
