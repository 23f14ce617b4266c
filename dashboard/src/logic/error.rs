//! Dashboard errors
//!
//! Every error is terminal for the current submission. Nothing is retried
//! automatically; the analyst resubmits.

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// Connection refused, timeout, broken body
    Transport(String),
    /// Non-2xx answer from the scoring API
    Server {
        status: u16,
        kind: Option<String>,
        message: String,
    },
    /// 2xx answer whose body breaks the response schema
    InvalidPayload(String),
    /// Analyst typed something that is not an identifier
    InvalidInput(String),
    InvariantViolation(String),
}

/// Error body the scoring API sends with every non-2xx status
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    kind: String,
}

impl DashboardError {
    /// Build a `Server` error from a status and raw response body.
    ///
    /// Falls back to the raw text when the body is not the tagged error shape.
    pub fn from_response(status: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorBody>(body) {
            Ok(parsed) => Self::Server {
                status,
                kind: Some(parsed.kind),
                message: parsed.error,
            },
            Err(_) => Self::Server {
                status,
                kind: None,
                message: body.trim().to_string(),
            },
        }
    }

    /// Snake_case kind reported by the server, if any
    pub fn server_kind(&self) -> Option<&str> {
        match self {
            Self::Server { kind, .. } => kind.as_deref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for DashboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "Transport error: {}", e),
            Self::Server { status, kind: Some(kind), message } => {
                write!(f, "API error {} ({}): {}", status, kind, message)
            }
            Self::Server { status, kind: None, message } if message.is_empty() => {
                write!(f, "API error {}", status)
            }
            Self::Server { status, kind: None, message } => write!(f, "API error {}: {}", status, message),
            Self::InvalidPayload(e) => write!(f, "Invalid response: {}", e),
            Self::InvalidInput(e) => write!(f, "Invalid input: {}", e),
            Self::InvariantViolation(e) => write!(f, "Invariant violation: {}", e),
        }
    }
}

impl std::error::Error for DashboardError {}

impl From<reqwest::Error> for DashboardError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}
