//! Central Configuration Constants
//!
//! Single source of truth for the dashboard defaults.
//! Every value can be overridden from the environment.

/// Default scoring API URL
///
/// For development: http://localhost:5000
pub const DEFAULT_SCORING_API_URL: &str = "http://localhost:5000";

/// Probability (percent) at and above which a client is flagged
pub const DEFAULT_DECISION_THRESHOLD: f64 = 44.5262;

/// Default HTTP timeout (seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Rows per top-feature table
pub const DEFAULT_TOP_K: usize = 10;

/// App version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// App name
pub const APP_NAME: &str = "Credit Scoring Dashboard";

// ============================================
// Helper functions to read from env with fallback
// ============================================

/// Get scoring API URL from environment or use default
pub fn get_scoring_api_url() -> String {
    std::env::var("SCORING_API_URL")
        .map(|s| s.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_SCORING_API_URL.to_string())
}

/// Get decision threshold from environment or use default
///
/// Values outside [0, 100] are ignored.
pub fn get_decision_threshold() -> f64 {
    std::env::var("DECISION_THRESHOLD")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|t| (0.0..=100.0).contains(t))
        .unwrap_or(DEFAULT_DECISION_THRESHOLD)
}

/// Get HTTP timeout from environment or use default
pub fn get_timeout_secs() -> u64 {
    std::env::var("SCORING_TIMEOUT_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_TIMEOUT_SECS)
}

/// Get top-feature table size from environment or use default
pub fn get_top_k() -> usize {
    std::env::var("TOP_K")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|k| *k > 0)
        .unwrap_or(DEFAULT_TOP_K)
}
