use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{RankedRequest, RecommendationEngine, ScoringWeights};
use crate::engagement::domain::{
    DonationRequest, DonationRequestId, InteractionEvent, UserId, UserProfile,
};
use crate::engagement::error::ErrorKind;
use crate::engagement::repository::{
    CandidateFilter, DonationRequestCatalog, InteractionLog, ProfileDirectory, RepositoryError,
};
use crate::session::Session;

/// Service composing the catalog, profile directory, interaction log, and ranking engine.
pub struct RecommendationService<C, P, L> {
    catalog: Arc<C>,
    profiles: Arc<P>,
    log: Arc<L>,
    engine: Arc<RecommendationEngine>,
    default_limit: usize,
}

impl<C, P, L> RecommendationService<C, P, L>
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    pub fn new(
        catalog: Arc<C>,
        profiles: Arc<P>,
        log: Arc<L>,
        weights: ScoringWeights,
        default_limit: usize,
    ) -> Self {
        Self {
            catalog,
            profiles,
            log,
            engine: Arc::new(RecommendationEngine::new(weights)),
            default_limit: default_limit.max(1),
        }
    }

    /// Ranked swipe feed for the session user, truncated to `limit` (or the configured default).
    ///
    /// Only the candidate lookup and an unknown user are fatal. A failing profile or history
    /// read degrades to a cold-start ranking so the feed is never empty while candidates exist.
    pub fn ranked_feed(
        &self,
        session: &Session,
        filter: &CandidateFilter,
        now: DateTime<Utc>,
        limit: Option<usize>,
    ) -> Result<Vec<RankedRequest>, RecommendationError> {
        let profile = self.profile_or_cold_start(&session.user_id)?;
        let candidates = self.catalog.candidates(filter)?;
        let history = self.history_or_empty(&session.user_id);
        let categories = self.categories_for(&history, &candidates);

        let mut ranked = self
            .engine
            .rank(&profile, &history, &categories, candidates, now);
        ranked.truncate(limit.unwrap_or(self.default_limit).max(1));

        debug!(user = %session.user_id, returned = ranked.len(), "feed ranked");
        Ok(ranked)
    }

    /// Score breakdown for a single request, regardless of whether it is currently listable.
    pub fn explain(
        &self,
        session: &Session,
        request_id: &DonationRequestId,
        now: DateTime<Utc>,
    ) -> Result<RankedRequest, RecommendationError> {
        let profile = self.profile_or_cold_start(&session.user_id)?;
        let request = self
            .catalog
            .fetch_request(request_id)?
            .filter(|request| !request.status.is_deleted())
            .ok_or_else(|| RecommendationError::UnknownRequest(request_id.clone()))?;
        let history = self.history_or_empty(&session.user_id);
        let categories = self.categories_for(&history, std::slice::from_ref(&request));

        self.engine
            .rank(&profile, &history, &categories, vec![request], now)
            .pop()
            .ok_or_else(|| RecommendationError::UnknownRequest(request_id.clone()))
    }

    fn profile_or_cold_start(&self, user_id: &UserId) -> Result<UserProfile, RecommendationError> {
        match self.profiles.fetch_profile(user_id) {
            Ok(Some(profile)) => Ok(profile),
            Ok(None) => Err(RecommendationError::UnknownUser(user_id.clone())),
            Err(error) => {
                warn!(user = %user_id, %error, "profile unavailable, ranking without declared interests");
                Ok(UserProfile::new(user_id.clone()))
            }
        }
    }

    fn history_or_empty(&self, user_id: &UserId) -> Vec<InteractionEvent> {
        self.log.for_user(user_id).unwrap_or_else(|error| {
            warn!(user = %user_id, %error, "interaction history unavailable, ranking cold");
            Vec::new()
        })
    }

    fn categories_for(
        &self,
        history: &[InteractionEvent],
        candidates: &[DonationRequest],
    ) -> HashMap<DonationRequestId, String> {
        let mut categories: HashMap<DonationRequestId, String> = candidates
            .iter()
            .map(|request| (request.id.clone(), request.category_key()))
            .collect();
        let mut looked_up = HashSet::new();

        for event in history {
            if categories.contains_key(&event.entity_id) || !looked_up.insert(&event.entity_id) {
                continue;
            }
            match self.catalog.fetch_request(&event.entity_id) {
                Ok(Some(request)) => {
                    categories.insert(request.id.clone(), request.category_key());
                }
                Ok(None) => {}
                Err(error) => {
                    debug!(request = %event.entity_id, %error, "category lookup failed");
                }
            }
        }

        categories
    }
}

/// Error raised by the recommendation service.
#[derive(Debug, thiserror::Error)]
pub enum RecommendationError {
    #[error("user {0} does not exist")]
    UnknownUser(UserId),
    #[error("donation request {0} does not exist")]
    UnknownRequest(DonationRequestId),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl RecommendationError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecommendationError::UnknownUser(_) | RecommendationError::UnknownRequest(_) => {
                ErrorKind::NotFound
            }
            RecommendationError::Repository(error) => error.kind(),
        }
    }
}
