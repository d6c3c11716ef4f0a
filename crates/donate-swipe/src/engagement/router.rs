use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::domain::DonationRequestId;
use super::error::{error_response, unauthenticated};
use super::interactions::{InteractionRecorder, InteractionSubmission};
use super::points::{PointsEngine, PointsRequest, USER_LEVELS};
use super::recommendations::RecommendationService;
use super::repository::{
    CandidateFilter, DonationRequestCatalog, InteractionLog, PointsLedger, ProfileDirectory,
};
use crate::session::Session;

/// Interaction recording endpoints.
pub fn interaction_router<C, P, L>(recorder: Arc<InteractionRecorder<C, P, L>>) -> Router
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/interactions",
            get(history_handler::<C, P, L>).post(record_handler::<C, P, L>),
        )
        .with_state(recorder)
}

/// Ranked swipe feed endpoints.
pub fn feed_router<C, P, L>(service: Arc<RecommendationService<C, P, L>>) -> Router
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    Router::new()
        .route(
            "/api/v1/recommendations/donation-requests",
            get(feed_handler::<C, P, L>),
        )
        .route(
            "/api/v1/recommendations/donation-requests/:request_id/explain",
            get(explain_handler::<C, P, L>),
        )
        .with_state(service)
}

/// Points award, redemption, and balance endpoints.
pub fn points_router<P, G>(engine: Arc<PointsEngine<P, G>>) -> Router
where
    P: ProfileDirectory + 'static,
    G: PointsLedger + 'static,
{
    Router::new()
        .route(
            "/api/v1/points",
            get(balance_handler::<P, G>).post(award_handler::<P, G>),
        )
        .route(
            "/api/v1/points/redeem",
            axum::routing::post(redeem_handler::<P, G>),
        )
        .route("/api/v1/points/levels", get(levels_handler))
        .with_state(engine)
}

pub(crate) async fn record_handler<C, P, L>(
    State(recorder): State<Arc<InteractionRecorder<C, P, L>>>,
    headers: HeaderMap,
    Json(submission): Json<InteractionSubmission>,
) -> Response
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        debug!(request = %submission.entity_id, "anonymous interaction dropped");
        return (StatusCode::ACCEPTED, Json(json!({ "recorded": false }))).into_response();
    };

    match recorder.record(&session, submission, Utc::now()) {
        Ok(event) => {
            let payload = json!({
                "recorded": true,
                "event_id": event.event_id.0,
            });
            (StatusCode::ACCEPTED, Json(payload)).into_response()
        }
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn history_handler<C, P, L>(
    State(recorder): State<Arc<InteractionRecorder<C, P, L>>>,
    headers: HeaderMap,
) -> Response
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        return unauthenticated();
    };

    match recorder.history(&session) {
        Ok(events) => (StatusCode::OK, Json(events)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct FeedQuery {
    #[serde(default)]
    pub(crate) limit: Option<usize>,
    #[serde(default)]
    pub(crate) category: Option<String>,
}

pub(crate) async fn feed_handler<C, P, L>(
    State(service): State<Arc<RecommendationService<C, P, L>>>,
    headers: HeaderMap,
    Query(query): Query<FeedQuery>,
) -> Response
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        return unauthenticated();
    };

    let now = Utc::now();
    let filter = CandidateFilter {
        category: query.category,
        expires_after: Some(now),
    };

    match service.ranked_feed(&session, &filter, now, query.limit) {
        Ok(feed) => (StatusCode::OK, Json(feed)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn explain_handler<C, P, L>(
    State(service): State<Arc<RecommendationService<C, P, L>>>,
    headers: HeaderMap,
    Path(request_id): Path<String>,
) -> Response
where
    C: DonationRequestCatalog + 'static,
    P: ProfileDirectory + 'static,
    L: InteractionLog + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        return unauthenticated();
    };

    match service.explain(&session, &DonationRequestId(request_id), Utc::now()) {
        Ok(ranked) => (StatusCode::OK, Json(ranked)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn award_handler<P, G>(
    State(engine): State<Arc<PointsEngine<P, G>>>,
    headers: HeaderMap,
    Json(request): Json<PointsRequest>,
) -> Response
where
    P: ProfileDirectory + 'static,
    G: PointsLedger + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        return unauthenticated();
    };

    match engine.add_points(&session, request, Utc::now()) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn redeem_handler<P, G>(
    State(engine): State<Arc<PointsEngine<P, G>>>,
    headers: HeaderMap,
    Json(request): Json<PointsRequest>,
) -> Response
where
    P: ProfileDirectory + 'static,
    G: PointsLedger + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        return unauthenticated();
    };

    match engine.spend_points(&session, request, Utc::now()) {
        Ok(transaction) => (StatusCode::CREATED, Json(transaction)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn balance_handler<P, G>(
    State(engine): State<Arc<PointsEngine<P, G>>>,
    headers: HeaderMap,
) -> Response
where
    P: ProfileDirectory + 'static,
    G: PointsLedger + 'static,
{
    let Some(session) = Session::from_headers(&headers) else {
        return unauthenticated();
    };

    match engine.user_points(&session) {
        Ok(points) => (StatusCode::OK, Json(points)).into_response(),
        Err(error) => error_response(error.kind(), error.to_string()),
    }
}

pub(crate) async fn levels_handler() -> Response {
    (StatusCode::OK, Json(USER_LEVELS)).into_response()
}
