//! Presentation Formatter
//!
//! Turns a validated scoring result into what the analyst sees: the risk
//! band against the decision threshold, the top risk-reducing and
//! risk-increasing features, and display-ready raw values.

use std::cmp::Ordering;

use super::client::{FeatureAttribution, ScoringResult};
use super::error::DashboardError;

/// Risk band of a probability relative to the decision threshold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskBand {
    /// `0 <= p < threshold`
    Low,
    /// `threshold <= p <= 100`
    High,
}

impl RiskBand {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }

    /// Decision banner text
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low risk",
            Self::High => "Potential risk",
        }
    }
}

/// Raw feature value ready for display
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayValue {
    Missing,
    Integral(i64),
    /// Rounded to 2 decimals; integral only when too large for `i64`
    Fractional(f64),
}

impl std::fmt::Display for DisplayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Missing => write!(f, "n/a"),
            Self::Integral(v) => write!(f, "{}", v),
            Self::Fractional(v) => write!(f, "{}", v),
        }
    }
}

/// Which side of the attribution ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Negative attributions, most negative first
    Decreasing,
    /// Positive attributions, most positive first
    Increasing,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankedFeature {
    pub name: String,
    pub attribution: f64,
    pub value: DisplayValue,
}

/// Everything the renderer needs for one client
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreView {
    pub probability: f64,
    pub threshold: f64,
    pub band: RiskBand,
    /// Marker position on the gauge, in [0, 1]
    pub gauge_position: f64,
    pub decreasing: Vec<RankedFeature>,
    pub increasing: Vec<RankedFeature>,
}

#[derive(Debug, Clone)]
pub struct PresentationFormatter {
    threshold: f64,
    top_k: usize,
}

impl PresentationFormatter {
    pub fn new(threshold: f64, top_k: usize) -> Result<Self, DashboardError> {
        if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
            return Err(DashboardError::InvariantViolation(format!(
                "decision threshold {} outside [0, 100]",
                threshold
            )));
        }
        Ok(Self { threshold, top_k })
    }

    /// Threshold and table size from the environment
    pub fn from_env() -> Result<Self, DashboardError> {
        use crate::constants;

        Self::new(constants::get_decision_threshold(), constants::get_top_k())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// No clamping: anything outside [0, 100] is a broken upstream.
    pub fn classify(&self, probability: f64) -> Result<RiskBand, DashboardError> {
        check_probability(probability)?;
        if probability < self.threshold {
            Ok(RiskBand::Low)
        } else {
            Ok(RiskBand::High)
        }
    }

    pub fn gauge_position(&self, probability: f64) -> Result<f64, DashboardError> {
        check_probability(probability)?;
        Ok(probability / 100.0)
    }

    /// Integral values become integers, others are rounded to 2 decimals.
    /// Whole numbers outside the `i64` range stay `Fractional` and print
    /// without a decimal part.
    ///
    /// Idempotent: formatting the numeric value of a result gives the same result.
    pub fn format_value(value: Option<f64>) -> DisplayValue {
        let v = match value {
            Some(v) if v.is_finite() => v,
            _ => return DisplayValue::Missing,
        };

        let rounded = if v.fract() == 0.0 { v } else { (v * 100.0).round() / 100.0 };
        if rounded.fract() == 0.0 && rounded.abs() < i64::MAX as f64 {
            DisplayValue::Integral(rounded as i64)
        } else {
            DisplayValue::Fractional(rounded)
        }
    }

    /// Top `k` features on one side; ties keep column order, zeros are dropped.
    pub fn top_features(&self, features: &[FeatureAttribution], direction: Direction) -> Vec<RankedFeature> {
        let mut side: Vec<&FeatureAttribution> = features.iter()
            .filter(|f| match direction {
                Direction::Decreasing => f.attribution < 0.0,
                Direction::Increasing => f.attribution > 0.0,
            })
            .collect();

        // sort_by is stable
        side.sort_by(|a, b| rank(direction, a.attribution, b.attribution));

        side.into_iter()
            .take(self.top_k)
            .map(|f| RankedFeature {
                name: f.name.clone(),
                attribution: f.attribution,
                value: Self::format_value(f.value),
            })
            .collect()
    }

    pub fn view(&self, result: &ScoringResult) -> Result<ScoreView, DashboardError> {
        Ok(ScoreView {
            probability: result.probability,
            threshold: self.threshold,
            band: self.classify(result.probability)?,
            gauge_position: self.gauge_position(result.probability)?,
            decreasing: self.top_features(&result.features, Direction::Decreasing),
            increasing: self.top_features(&result.features, Direction::Increasing),
        })
    }
}

fn rank(direction: Direction, a: f64, b: f64) -> Ordering {
    match direction {
        Direction::Decreasing => a.total_cmp(&b),
        Direction::Increasing => b.total_cmp(&a),
    }
}

fn check_probability(probability: f64) -> Result<(), DashboardError> {
    if probability.is_nan() || !(0.0..=100.0).contains(&probability) {
        return Err(DashboardError::InvariantViolation(format!(
            "probability {} outside [0, 100]",
            probability
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> PresentationFormatter {
        PresentationFormatter::new(44.5262, 10).unwrap()
    }

    fn feature(name: &str, attribution: f64) -> FeatureAttribution {
        FeatureAttribution { name: name.to_string(), attribution, value: Some(1.0) }
    }

    fn numeric(value: DisplayValue) -> Option<f64> {
        match value {
            DisplayValue::Missing => None,
            DisplayValue::Integral(v) => Some(v as f64),
            DisplayValue::Fractional(v) => Some(v),
        }
    }

    fn names(ranked: &[RankedFeature]) -> Vec<&str> {
        ranked.iter().map(|f| f.name.as_str()).collect()
    }

    #[test]
    fn test_classify_threshold_is_high_inclusive() {
        let f = formatter();
        assert_eq!(f.classify(44.5262).unwrap(), RiskBand::High);
        assert_eq!(f.classify(44.5261).unwrap(), RiskBand::Low);
    }

    #[test]
    fn test_classify_bounds() {
        let f = formatter();
        assert_eq!(f.classify(0.0).unwrap(), RiskBand::Low);
        assert_eq!(f.classify(100.0).unwrap(), RiskBand::High);
    }

    #[test]
    fn test_classify_is_monotonic() {
        let f = formatter();
        let bands: Vec<RiskBand> = (0..=1000)
            .map(|i| f.classify(i as f64 / 10.0).unwrap())
            .collect();
        let first_high = bands.iter().position(|b| *b == RiskBand::High).unwrap();
        assert!(bands[first_high..].iter().all(|b| *b == RiskBand::High));
        assert!(bands[..first_high].iter().all(|b| *b == RiskBand::Low));
    }

    #[test]
    fn test_classify_out_of_range() {
        let f = formatter();
        for p in [-0.01, 100.01, f64::NAN, f64::INFINITY] {
            assert!(matches!(f.classify(p), Err(DashboardError::InvariantViolation(_))));
        }
    }

    #[test]
    fn test_band_labels() {
        assert_eq!(RiskBand::Low.label(), "Low risk");
        assert_eq!(RiskBand::High.label(), "Potential risk");
        assert_eq!(RiskBand::High.as_str(), "high");
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(PresentationFormatter::new(120.0, 10).is_err());
        assert!(PresentationFormatter::new(f64::NAN, 10).is_err());
    }

    #[test]
    fn test_format_value() {
        assert_eq!(PresentationFormatter::format_value(Some(7.0)), DisplayValue::Integral(7));
        assert_eq!(PresentationFormatter::format_value(Some(1.82)), DisplayValue::Fractional(1.82));
        assert_eq!(PresentationFormatter::format_value(Some(0.26291)), DisplayValue::Fractional(0.26));
        assert_eq!(PresentationFormatter::format_value(Some(-9461.0)), DisplayValue::Integral(-9461));
        assert_eq!(PresentationFormatter::format_value(Some(2.999)), DisplayValue::Integral(3));
        assert_eq!(PresentationFormatter::format_value(None), DisplayValue::Missing);
        assert_eq!(PresentationFormatter::format_value(Some(f64::NAN)), DisplayValue::Missing);
    }

    #[test]
    fn test_format_value_is_idempotent() {
        for v in [7.0, 1.82, 0.26291, -3.14159, 406597.5, 2.999, 1e-9, -0.004] {
            let once = PresentationFormatter::format_value(Some(v));
            let twice = PresentationFormatter::format_value(numeric(once));
            assert_eq!(once, twice, "not idempotent for {}", v);
        }
    }

    #[test]
    fn test_format_value_beyond_i64() {
        let huge = PresentationFormatter::format_value(Some(1e19));
        assert_eq!(huge, DisplayValue::Fractional(1e19));
        assert_eq!(huge.to_string(), "10000000000000000000");
        assert_eq!(PresentationFormatter::format_value(numeric(huge)), huge);
    }

    #[test]
    fn test_display_value_text() {
        assert_eq!(DisplayValue::Integral(7).to_string(), "7");
        assert_eq!(DisplayValue::Fractional(1.82).to_string(), "1.82");
        assert_eq!(DisplayValue::Missing.to_string(), "n/a");
    }

    #[test]
    fn test_top_features_split_by_sign() {
        let features = vec![
            feature("A", -0.2),
            feature("B", 0.5),
            feature("C", 0.0),
            feature("D", -0.7),
            feature("E", 0.1),
        ];
        let f = formatter();

        assert_eq!(names(&f.top_features(&features, Direction::Decreasing)), ["D", "A"]);
        assert_eq!(names(&f.top_features(&features, Direction::Increasing)), ["B", "E"]);
    }

    #[test]
    fn test_top_features_ties_keep_column_order() {
        let features = vec![
            feature("A", 0.3),
            feature("B", 0.5),
            feature("C", 0.3),
            feature("D", 0.3),
        ];
        let ranked = formatter().top_features(&features, Direction::Increasing);
        assert_eq!(names(&ranked), ["B", "A", "C", "D"]);
    }

    #[test]
    fn test_top_features_truncates_to_k() {
        let features: Vec<FeatureAttribution> = (0..25)
            .map(|i| feature(&format!("F{}", i), -(i as f64) - 1.0))
            .collect();
        let ranked = formatter().top_features(&features, Direction::Decreasing);

        assert_eq!(ranked.len(), 10);
        assert_eq!(ranked[0].name, "F24");
        assert_eq!(ranked[9].name, "F15");
    }

    #[test]
    fn test_view() {
        let result = ScoringResult {
            probability: 50.0,
            features: vec![feature("A", -0.2), feature("B", 0.4)],
        };
        let view = formatter().view(&result).unwrap();

        assert_eq!(view.band, RiskBand::High);
        assert_eq!(view.gauge_position, 0.5);
        assert_eq!(view.decreasing.len(), 1);
        assert_eq!(view.increasing[0].value, DisplayValue::Integral(1));
    }
}
