//! Attribution Engine - Per-record SHAP values
//!
//! Explains the raw (log-odds) output of the classifier for one scaled
//! record. Values always come back as a flat sequence in model feature
//! order together with the baseline, and satisfy
//! `expected_value + sum(values) == raw_output`.
//!
//! - Tree ensembles: exact path-dependent TreeSHAP, weighted by node covers.
//! - Logistic models: exact linear SHAP against the background feature means.

use std::sync::Arc;

use super::error::ScoringError;
use super::model::{Classifier, DecisionTree, TreeNode};

/// SHAP values for one record
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub values: Vec<f64>,
    /// Model output with no feature known
    pub expected_value: f64,
}

impl Explanation {
    /// Baseline plus all contributions; equals the model's raw output
    pub fn reconstructed_output(&self) -> f64 {
        self.expected_value + self.values.iter().sum::<f64>()
    }
}

/// A local attribution method bound to one model
pub trait Explainer {
    fn expected_value(&self) -> f64;
    fn explain(&self, x: &[f64]) -> Result<Explanation, ScoringError>;
}

// ============================================================================
// ENGINE
// ============================================================================

pub struct AttributionEngine {
    model: Arc<Classifier>,
}

impl AttributionEngine {
    pub fn new(model: Arc<Classifier>) -> Self {
        Self { model }
    }

    /// Explainer suited to the model kind
    pub fn explainer(&self) -> Result<Box<dyn Explainer + '_>, ScoringError> {
        match self.model.as_ref() {
            Classifier::TreeEnsemble { feature_names, base_score, trees } => {
                Ok(Box::new(TreeExplainer::new(trees, *base_score, feature_names.len())?))
            }
            Classifier::Logistic { intercept, coefficients, feature_means, .. } => {
                let means = feature_means.as_deref().ok_or_else(|| {
                    ScoringError::Explainer("logistic model has no background feature means".to_string())
                })?;
                Ok(Box::new(LinearExplainer::new(*intercept, coefficients, means)))
            }
        }
    }

    /// Whether this model can be explained at all
    pub fn check_supported(&self) -> Result<(), ScoringError> {
        self.explainer().map(|_| ())
    }

    pub fn explain(&self, x: &[f64]) -> Result<Explanation, ScoringError> {
        let explainer = self.explainer()?;
        let explanation = explainer.explain(x)?;

        if explanation.values.len() != x.len() {
            return Err(ScoringError::InvariantViolation(format!(
                "{} attribution values for {} features",
                explanation.values.len(), x.len()
            )));
        }
        Ok(explanation)
    }
}

// ============================================================================
// LINEAR SHAP
// ============================================================================

pub struct LinearExplainer<'a> {
    intercept: f64,
    coefficients: &'a [f64],
    means: &'a [f64],
}

impl<'a> LinearExplainer<'a> {
    pub fn new(intercept: f64, coefficients: &'a [f64], means: &'a [f64]) -> Self {
        Self { intercept, coefficients, means }
    }
}

impl Explainer for LinearExplainer<'_> {
    fn expected_value(&self) -> f64 {
        self.intercept + self.coefficients.iter().zip(self.means).map(|(c, m)| c * m).sum::<f64>()
    }

    fn explain(&self, x: &[f64]) -> Result<Explanation, ScoringError> {
        if let Some(i) = x.iter().position(|v| v.is_nan()) {
            return Err(ScoringError::Explainer(format!("linear attribution undefined for missing feature {}", i)));
        }
        let values = self.coefficients.iter()
            .zip(self.means)
            .zip(x)
            .map(|((c, m), v)| c * (v - m))
            .collect();

        Ok(Explanation { values, expected_value: self.expected_value() })
    }
}

// ============================================================================
// TREE SHAP
// ============================================================================

pub struct TreeExplainer<'a> {
    trees: &'a [DecisionTree],
    n_features: usize,
    expected_value: f64,
}

impl<'a> TreeExplainer<'a> {
    pub fn new(trees: &'a [DecisionTree], base_score: f64, n_features: usize) -> Result<Self, ScoringError> {
        if let Some(t) = trees.iter().position(|t| !t.has_covers()) {
            return Err(ScoringError::Explainer(format!(
                "tree {} lacks node covers required by TreeSHAP",
                t
            )));
        }

        let expected_value = base_score + trees.iter().map(|t| node_expectation(t, 0)).sum::<f64>();
        Ok(Self { trees, n_features, expected_value })
    }
}

impl Explainer for TreeExplainer<'_> {
    fn expected_value(&self) -> f64 {
        self.expected_value
    }

    fn explain(&self, x: &[f64]) -> Result<Explanation, ScoringError> {
        if x.len() != self.n_features {
            return Err(ScoringError::SchemaMismatch(format!(
                "explainer expects {} features, got {}",
                self.n_features, x.len()
            )));
        }

        let mut phi = vec![0.0; self.n_features];
        for tree in self.trees {
            let walk = TreeWalk { tree, x };
            walk.recurse(0, &mut phi, Vec::with_capacity(16), 1.0, 1.0, None);
        }

        Ok(Explanation { values: phi, expected_value: self.expected_value })
    }
}

/// Cover-weighted mean leaf value under `idx`
fn node_expectation(tree: &DecisionTree, idx: usize) -> f64 {
    match &tree.nodes[idx] {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split { left, right, cover, .. } => {
            let total = cover.unwrap_or(1.0);
            let lc = tree.nodes[*left].cover().unwrap_or(0.0);
            let rc = tree.nodes[*right].cover().unwrap_or(0.0);
            (lc * node_expectation(tree, *left) + rc * node_expectation(tree, *right)) / total
        }
    }
}

/// One element of the unique feature path from the root
#[derive(Debug, Clone, Copy)]
struct PathElement {
    feature: Option<usize>,
    zero_fraction: f64,
    one_fraction: f64,
    weight: f64,
}

struct TreeWalk<'a> {
    tree: &'a DecisionTree,
    x: &'a [f64],
}

impl TreeWalk<'_> {
    fn recurse(
        &self,
        idx: usize,
        phi: &mut [f64],
        mut path: Vec<PathElement>,
        zero_fraction: f64,
        one_fraction: f64,
        feature: Option<usize>,
    ) {
        extend_path(&mut path, zero_fraction, one_fraction, feature);

        match &self.tree.nodes[idx] {
            TreeNode::Leaf { value, .. } => {
                for i in 1..path.len() {
                    let el = path[i];
                    if let Some(f) = el.feature {
                        let w = unwound_path_sum(&path, i);
                        phi[f] += w * (el.one_fraction - el.zero_fraction) * value;
                    }
                }
            }
            TreeNode::Split { feature: f, threshold, left, right, missing_left, cover } => {
                let hot = DecisionTree::route(self.x[*f], *threshold, *left, *right, *missing_left);
                let cold = if hot == *left { *right } else { *left };

                let mut incoming_zero = 1.0;
                let mut incoming_one = 1.0;

                // A feature seen earlier on the path is merged, not duplicated
                if let Some(k) = path.iter().skip(1).position(|p| p.feature == Some(*f)).map(|k| k + 1) {
                    incoming_zero = path[k].zero_fraction;
                    incoming_one = path[k].one_fraction;
                    unwind_path(&mut path, k);
                }

                let total = cover.unwrap_or(1.0);
                let hot_cover = self.tree.nodes[hot].cover().unwrap_or(0.0);
                let cold_cover = self.tree.nodes[cold].cover().unwrap_or(0.0);

                self.recurse(hot, phi, path.clone(), incoming_zero * hot_cover / total, incoming_one, Some(*f));
                self.recurse(cold, phi, path, incoming_zero * cold_cover / total, 0.0, Some(*f));
            }
        }
    }
}

fn extend_path(path: &mut Vec<PathElement>, zero_fraction: f64, one_fraction: f64, feature: Option<usize>) {
    let l = path.len();
    path.push(PathElement {
        feature,
        zero_fraction,
        one_fraction,
        weight: if l == 0 { 1.0 } else { 0.0 },
    });

    let denom = (l + 1) as f64;
    for i in (0..l).rev() {
        path[i + 1].weight += one_fraction * path[i].weight * (i + 1) as f64 / denom;
        path[i].weight = zero_fraction * path[i].weight * (l - i) as f64 / denom;
    }
}

fn unwind_path(path: &mut Vec<PathElement>, index: usize) {
    let l = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (l + 1) as f64;
    let mut next = path[l].weight;

    for j in (0..l).rev() {
        if one != 0.0 {
            let tmp = path[j].weight;
            path[j].weight = next * denom / ((j + 1) as f64 * one);
            next = tmp - path[j].weight * zero * (l - j) as f64 / denom;
        } else {
            path[j].weight = path[j].weight * denom / (zero * (l - j) as f64);
        }
    }

    for j in index..l {
        path[j].feature = path[j + 1].feature;
        path[j].zero_fraction = path[j + 1].zero_fraction;
        path[j].one_fraction = path[j + 1].one_fraction;
    }
    path.pop();
}

/// Total permutation weight of the path with element `index` removed
fn unwound_path_sum(path: &[PathElement], index: usize) -> f64 {
    let l = path.len() - 1;
    let one = path[index].one_fraction;
    let zero = path[index].zero_fraction;
    let denom = (l + 1) as f64;
    let mut next = path[l].weight;
    let mut total = 0.0;

    for j in (0..l).rev() {
        if one != 0.0 {
            let tmp = next * denom / ((j + 1) as f64 * one);
            total += tmp;
            next = path[j].weight - tmp * zero * (l - j) as f64 / denom;
        } else {
            total += path[j].weight * denom / (zero * (l - j) as f64);
        }
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::fixtures;

    /// E[f(x) | x_S] by cover-weighted descent, the value function TreeSHAP solves
    fn conditional_expectation(tree: &DecisionTree, idx: usize, x: &[f64], known: u32) -> f64 {
        match &tree.nodes[idx] {
            TreeNode::Leaf { value, .. } => *value,
            TreeNode::Split { feature, threshold, left, right, missing_left, cover } => {
                if known & (1 << feature) != 0 {
                    let next = DecisionTree::route(x[*feature], *threshold, *left, *right, *missing_left);
                    conditional_expectation(tree, next, x, known)
                } else {
                    let lc = tree.nodes[*left].cover().unwrap();
                    let rc = tree.nodes[*right].cover().unwrap();
                    (lc * conditional_expectation(tree, *left, x, known)
                        + rc * conditional_expectation(tree, *right, x, known)) / cover.unwrap()
                }
            }
        }
    }

    fn factorial(n: usize) -> f64 {
        (1..=n).map(|k| k as f64).product()
    }

    /// Classic Shapley formula over every coalition
    fn brute_force_shap(trees: &[DecisionTree], x: &[f64]) -> Vec<f64> {
        let m = x.len();
        let value = |set: u32| -> f64 {
            trees.iter().map(|t| conditional_expectation(t, 0, x, set)).sum()
        };

        (0..m).map(|i| {
            let mut phi = 0.0;
            for set in 0u32..(1 << m) {
                if set & (1 << i) != 0 {
                    continue;
                }
                let s = set.count_ones() as usize;
                let weight = factorial(s) * factorial(m - s - 1) / factorial(m);
                phi += weight * (value(set | (1 << i)) - value(set));
            }
            phi
        }).collect()
    }

    fn trees_of(model: &Classifier) -> (&[DecisionTree], f64) {
        match model {
            Classifier::TreeEnsemble { trees, base_score, .. } => (trees, *base_score),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_stump_attribution() {
        let tree = DecisionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 0.0, left: 1, right: 2, missing_left: false, cover: Some(4.0) },
                TreeNode::Leaf { value: 1.0, cover: Some(3.0) },
                TreeNode::Leaf { value: -3.0, cover: Some(1.0) },
            ],
        };
        let trees = [tree];
        let explainer = TreeExplainer::new(&trees, 0.0, 1).unwrap();
        let explanation = explainer.explain(&[-1.0]).unwrap();

        assert!((explanation.expected_value - 0.0).abs() < 1e-12);
        assert!((explanation.values[0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_tree_shap_matches_brute_force() {
        let model = fixtures::tree_model();
        let (trees, base) = trees_of(&model);
        let explainer = TreeExplainer::new(trees, base, 5).unwrap();

        for x in [
            vec![-1.0, 1.0, 1.0, 0.0, 1.0],
            vec![0.3, -0.5, 0.1, 2.0, 0.0],
            vec![f64::NAN, 0.4, f64::NAN, -1.0, 1.0],
        ] {
            let fast = explainer.explain(&x).unwrap();
            let slow = brute_force_shap(trees, &x);
            for (a, b) in fast.values.iter().zip(&slow) {
                assert!((a - b).abs() < 1e-9, "TreeSHAP {} vs brute force {}", a, b);
            }
        }
    }

    #[test]
    fn test_tree_shap_additivity() {
        let model = fixtures::tree_model();
        let (trees, base) = trees_of(&model);
        let explainer = TreeExplainer::new(trees, base, 5).unwrap();

        let x = [0.3, 0.7, -2.0, 0.0, 1.0];
        let explanation = explainer.explain(&x).unwrap();
        assert!((explanation.reconstructed_output() - model.raw_output(&x)).abs() < 1e-9);
        // features never split on get nothing
        assert_eq!(explanation.values[3], 0.0);
        assert_eq!(explanation.values[4], 0.0);
    }

    #[test]
    fn test_linear_shap() {
        let model = fixtures::logistic_model();
        let engine = AttributionEngine::new(Arc::new(model.clone()));
        let x = [0.5, -1.0, 2.0, 0.0, 1.0];

        let explanation = engine.explain(&x).unwrap();
        assert!((explanation.reconstructed_output() - model.raw_output(&x)).abs() < 1e-12);

        let Classifier::Logistic { coefficients, feature_means: Some(means), .. } = &model else { unreachable!() };
        assert!((explanation.values[0] - coefficients[0] * (0.5 - means[0])).abs() < 1e-12);
    }

    #[test]
    fn test_tree_without_covers_is_unsupported() {
        let model: Classifier = serde_json::from_str(r#"{
            "kind": "tree_ensemble",
            "feature_names": ["A"],
            "trees": [{"nodes": [
                {"split": {"feature": 0, "threshold": 0.0, "left": 1, "right": 2}},
                {"leaf": {"value": 1.0}},
                {"leaf": {"value": 2.0}}
            ]}]
        }"#).unwrap();
        let engine = AttributionEngine::new(Arc::new(model));
        assert!(matches!(engine.explain(&[0.0]), Err(ScoringError::Explainer(_))));
        assert!(engine.check_supported().is_err());
    }

    #[test]
    fn test_logistic_without_means_is_unsupported() {
        let Classifier::Logistic { feature_names, intercept, coefficients, .. } = fixtures::logistic_model() else {
            unreachable!()
        };
        let model = Classifier::Logistic { feature_names, intercept, coefficients, feature_means: None };
        let engine = AttributionEngine::new(Arc::new(model));
        assert!(matches!(engine.check_supported(), Err(ScoringError::Explainer(_))));
    }
}
