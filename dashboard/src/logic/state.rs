//! Session state and the client cache
//!
//! `DashboardState` is only mutated here, through `ClientStateCache::submit`.
//! At most one result is cached: the one for `last_identifier`.

use super::client::{ScoringResult, ScoringTransport};
use super::error::DashboardError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Empty,
    IdentifierSet,
    Fetched,
}

#[derive(Debug, Default)]
pub struct DashboardState {
    has_result: bool,
    cached_result: Option<ScoringResult>,
    last_identifier: Option<i64>,
}

impl DashboardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        match (self.last_identifier, self.has_result) {
            (None, _) => Phase::Empty,
            (Some(_), false) => Phase::IdentifierSet,
            (Some(_), true) => Phase::Fetched,
        }
    }

    pub fn last_identifier(&self) -> Option<i64> {
        self.last_identifier
    }

    pub fn result(&self) -> Option<&ScoringResult> {
        self.cached_result.as_ref()
    }

    fn select(&mut self, id: i64) {
        self.has_result = false;
        self.cached_result = None;
        self.last_identifier = Some(id);
    }

    fn store(&mut self, result: ScoringResult) {
        self.cached_result = Some(result);
        self.has_result = true;
    }
}

/// Where the result of a submission came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheOutcome {
    /// Already cached for this identifier, no network call
    Served,
    Fetched,
}

pub struct ClientStateCache<T> {
    transport: T,
}

impl<T: ScoringTransport> ClientStateCache<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Make the result for `id` current, fetching only when it is not cached.
    ///
    /// On failure the state stays in `IdentifierSet` for `id`, so the next
    /// submission of the same identifier fetches again.
    pub async fn submit(&self, state: &mut DashboardState, id: i64) -> Result<CacheOutcome, DashboardError> {
        if state.last_identifier == Some(id) && state.has_result {
            log::debug!("SK_ID_CURR {} served from cache", id);
            return Ok(CacheOutcome::Served);
        }

        if state.last_identifier != Some(id) {
            if let Some(previous) = state.last_identifier {
                log::info!("Client changed {} -> {}, cache invalidated", previous, id);
            }
            state.select(id);
        }

        let result = self.transport.fetch(id).await?;
        log::info!(
            "SK_ID_CURR {} scored: {:.2}% over {} features",
            id, result.probability, result.features.len()
        );
        state.store(result);

        Ok(CacheOutcome::Fetched)
    }
}
