//! Donor engagement core: interaction log, swipe-feed ranking, and points ledger.
//!
//! Storage is reached only through the traits in [`repository`], so every engine can be driven
//! with in-memory fixtures. All operations take an explicit [`Session`](crate::session::Session).

pub mod domain;
pub mod error;
pub mod interactions;
pub mod points;
pub mod recommendations;
pub mod repository;
pub mod router;

#[cfg(test)]
mod tests;

use std::sync::Arc;

use axum::Router;

pub use domain::{
    DonationRequest, DonationRequestId, EntityType, EventId, InteractionEvent, InteractionType,
    ItemNeed, RequestDetails, RequestStatus, Urgency, UserId, UserProfile,
};
pub use error::ErrorKind;
pub use interactions::{InteractionError, InteractionRecorder, InteractionSubmission};
pub use points::{PointsEngine, PointsError, PointsRequest, ReasonCode, UserPoints};
pub use recommendations::{
    RankedRequest, RecommendationEngine, RecommendationError, RecommendationService,
    ScoreComponent, ScoringWeights, SignalKind,
};
pub use repository::{
    CandidateFilter, DonationRequestCatalog, InteractionLog, PointsLedger, ProfileDirectory,
    RepositoryError,
};
pub use router::{feed_router, interaction_router, points_router};

use crate::config::FeedConfig;

/// The three engagement services wired over one set of repositories.
pub struct Engagement<C, P, L, G> {
    pub recorder: Arc<InteractionRecorder<C, P, L>>,
    pub feed: Arc<RecommendationService<C, P, L>>,
    pub points: Arc<PointsEngine<P, G>>,
}

impl<C, P, L, G> Engagement<C, P, L, G>
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
    G: PointsLedger + 'static,
{
    pub fn new(
        catalog: Arc<C>,
        profiles: Arc<P>,
        log: Arc<L>,
        ledger: Arc<G>,
        feed: &FeedConfig,
    ) -> Self {
        Self {
            recorder: Arc::new(InteractionRecorder::new(
                catalog.clone(),
                profiles.clone(),
                log.clone(),
            )),
            feed: Arc::new(RecommendationService::new(
                catalog,
                profiles.clone(),
                log,
                feed.weights.clone(),
                feed.default_limit,
            )),
            points: Arc::new(PointsEngine::new(profiles, ledger)),
        }
    }

    /// Every engagement route merged into one router.
    pub fn router(&self) -> Router {
        interaction_router(self.recorder.clone())
            .merge(feed_router(self.feed.clone()))
            .merge(points_router(self.points.clone()))
    }
}
