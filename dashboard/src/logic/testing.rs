//! In-memory transport for cache and session tests

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::client::{FeatureAttribution, ScoringResult, ScoringTransport};
use super::error::DashboardError;

/// Answers every identifier with a fixed result and counts the calls
pub struct FakeTransport {
    calls: AtomicUsize,
    failing: Vec<i64>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::failing_for(&[])
    }

    /// Identifiers answered with a 404 `not_found`
    pub fn failing_for(ids: &[i64]) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            failing: ids.to_vec(),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn sample_result(probability: f64) -> ScoringResult {
    let features = [
        ("EXT_SOURCE_2", -0.42, Some(0.2629)),
        ("EXT_SOURCE_3", 0.0, None),
        ("AMT_CREDIT", 0.31, Some(406597.5)),
        ("DAYS_BIRTH", 0.18, Some(-9461.0)),
        ("CODE_GENDER_M", -0.05, Some(1.0)),
    ];

    ScoringResult {
        probability,
        features: features.iter()
            .map(|(name, attribution, value)| FeatureAttribution {
                name: name.to_string(),
                attribution: *attribution,
                value: *value,
            })
            .collect(),
    }
}

impl ScoringTransport for FakeTransport {
    fn fetch(&self, id: i64) -> impl Future<Output = Result<ScoringResult, DashboardError>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let outcome = if self.failing.contains(&id) {
            Err(DashboardError::Server {
                status: 404,
                kind: Some("not_found".to_string()),
                message: format!("no record with SK_ID_CURR {}", id),
            })
        } else {
            // Distinct probability per identifier so tests can tell results apart
            Ok(sample_result((id % 100) as f64))
        };

        std::future::ready(outcome)
    }
}
