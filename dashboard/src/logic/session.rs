//! Analyst session
//!
//! Owns the dashboard state for its lifetime and wires input, cache and
//! formatter together.

use super::client::ScoringTransport;
use super::error::DashboardError;
use super::formatter::{PresentationFormatter, ScoreView};
use super::render;
use super::state::{CacheOutcome, ClientStateCache, DashboardState};

/// One answered submission
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: i64,
    pub outcome: CacheOutcome,
    pub view: ScoreView,
}

impl Report {
    pub fn render(&self) -> String {
        let body = render::render_view(self.id, &self.view);
        match self.outcome {
            CacheOutcome::Served => format!("{}\n\n{}", render::CACHED_NOTICE, body),
            CacheOutcome::Fetched => body,
        }
    }
}

pub struct Session<T> {
    cache: ClientStateCache<T>,
    state: DashboardState,
    formatter: PresentationFormatter,
}

impl<T: ScoringTransport> Session<T> {
    pub fn new(transport: T, formatter: PresentationFormatter) -> Self {
        Self {
            cache: ClientStateCache::new(transport),
            state: DashboardState::new(),
            formatter,
        }
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn transport(&self) -> &T {
        self.cache.transport()
    }

    /// Parse analyst input and show the result for that client.
    pub async fn submit_input(&mut self, input: &str) -> Result<Report, DashboardError> {
        let id = parse_identifier(input)?;
        let outcome = self.cache.submit(&mut self.state, id).await?;

        let result = self.state.result().ok_or_else(|| {
            DashboardError::InvariantViolation(format!("no cached result for {} after submit", id))
        })?;

        let view = self.formatter.view(result)?;
        log::debug!("SK_ID_CURR {} in {} risk band", id, view.band.as_str());

        Ok(Report { id, outcome, view })
    }
}

pub fn parse_identifier(input: &str) -> Result<i64, DashboardError> {
    let text = input.trim();
    if text.is_empty() {
        return Err(DashboardError::InvalidInput("enter a SK_ID_CURR".to_string()));
    }

    text.parse::<i64>()
        .map_err(|_| DashboardError::InvalidInput(format!("'{}' is not a client identifier", text)))
}
