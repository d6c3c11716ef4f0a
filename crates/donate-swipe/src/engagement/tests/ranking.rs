use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;

use super::common::*;
use crate::engagement::domain::{
    DonationRequestId, EventId, InteractionEvent, InteractionType, RequestStatus, Urgency, UserId,
};
use crate::engagement::error::ErrorKind;
use crate::engagement::recommendations::{
    RankedRequest, RecommendationEngine, RecommendationError, RecommendationService,
    ScoringWeights, SignalKind,
};
use crate::engagement::repository::CandidateFilter;

fn engine() -> RecommendationEngine {
    RecommendationEngine::new(ScoringWeights::default())
}

fn ids(ranked: &[RankedRequest]) -> Vec<&str> {
    ranked
        .iter()
        .map(|entry| entry.request.id.0.as_str())
        .collect()
}

fn event(user: &str, request: &str, kind: InteractionType, days_ago: i64) -> InteractionEvent {
    InteractionEvent::new(
        EventId(format!("evt-{user}-{request}-{days_ago}")),
        UserId(user.to_string()),
        DonationRequestId(request.to_string()),
        kind,
        now() - Duration::days(days_ago),
    )
}

#[test]
fn favorite_category_outranks_identical_other_category() {
    let mut past = request("past-med", "medical", Urgency::Low, 100.0, 100.0);
    past.status = RequestStatus::Completed;
    let fixture = fixture(
        vec![
            past,
            request("env", "environment", Urgency::Medium, 50.0, 100.0),
            request("med", "medical", Urgency::Medium, 50.0, 100.0),
        ],
        vec![profile("donor-1")],
    );
    fixture
        .log
        .seed(event("donor-1", "past-med", InteractionType::Favorite, 1));

    let feed = fixture
        .engagement
        .feed
        .ranked_feed(&session("donor-1"), &CandidateFilter::default(), now(), None)
        .expect("feed ranks");

    assert_eq!(ids(&feed), vec!["med", "env"]);
    assert!(feed[0].score > feed[1].score);
    assert!(feed[0]
        .components
        .iter()
        .any(|component| component.signal == SignalKind::Affinity && component.score > 0.0));
}

#[test]
fn cold_start_feed_is_non_empty_and_stable() {
    let fixture = fixture(
        vec![
            request("low", "animals", Urgency::Low, 10.0, 100.0),
            request("high", "medical", Urgency::High, 10.0, 100.0),
            request("medium", "education", Urgency::Medium, 10.0, 100.0),
        ],
        vec![profile("newcomer")],
    );
    let service = &fixture.engagement.feed;
    let newcomer = session("newcomer");

    let first = service
        .ranked_feed(&newcomer, &CandidateFilter::default(), now(), None)
        .expect("feed ranks");
    let second = service
        .ranked_feed(&newcomer, &CandidateFilter::default(), now(), None)
        .expect("feed ranks");

    assert_eq!(ids(&first), vec!["high", "medium", "low"]);
    assert_eq!(first, second);
    assert!(first.iter().all(|entry| entry
        .components
        .iter()
        .all(|component| matches!(
            component.signal,
            SignalKind::Urgency | SignalKind::FundingProgress
        ))));
}

#[test]
fn fully_funded_request_sinks_below_half_funded_twin() {
    let ranked = engine().rank(
        &profile("donor-1"),
        &[],
        &HashMap::new(),
        vec![
            request("funded", "medical", Urgency::Medium, 100.0, 100.0),
            request("half", "medical", Urgency::Medium, 50.0, 100.0),
        ],
        now(),
    );

    assert_eq!(ids(&ranked), vec!["half", "funded"]);
}

#[test]
fn over_funding_penalty_is_capped() {
    let ranked = engine().rank(
        &profile("donor-1"),
        &[],
        &HashMap::new(),
        vec![
            request("double", "medical", Urgency::Medium, 200.0, 100.0),
            request("triple", "medical", Urgency::Medium, 300.0, 100.0),
        ],
        now(),
    );

    assert_eq!(ranked[0].score, ranked[1].score);
}

#[test]
fn urgency_does_not_override_strong_affinity() {
    let mut categories = HashMap::new();
    categories.insert(DonationRequestId("seen".to_string()), "environment".to_string());
    let history = vec![event("donor-1", "seen", InteractionType::Favorite, 0)];

    let ranked = engine().rank(
        &profile("donor-1"),
        &history,
        &categories,
        vec![
            request("urgent", "medical", Urgency::High, 50.0, 100.0),
            request("liked", "environment", Urgency::Low, 50.0, 100.0),
        ],
        now(),
    );

    assert_eq!(ids(&ranked), vec!["liked", "urgent"]);
}

#[test]
fn fresh_favorite_outweighs_full_urgency_but_decayed_one_does_not() {
    let mut categories = HashMap::new();
    categories.insert(DonationRequestId("seen".to_string()), "environment".to_string());

    let mut urgent = request("urgent", "medical", Urgency::High, 50.0, 100.0);
    urgent.expires_at = Some(now());
    let candidates = vec![
        urgent,
        request("liked", "environment", Urgency::Low, 50.0, 100.0),
    ];

    // HIGH plus full time pressure is 7.0 against LOW at 1.0; a fresh favorite adds 8.0.
    let fresh = vec![event("donor-1", "seen", InteractionType::Favorite, 0)];
    let ranked = engine().rank(
        &profile("donor-1"),
        &fresh,
        &categories,
        candidates.clone(),
        now(),
    );
    assert_eq!(ids(&ranked), vec!["liked", "urgent"]);

    // One half-life later the favorite is worth 4.0, below the 6.0 urgency spread.
    let decayed = vec![event("donor-1", "seen", InteractionType::Favorite, 14)];
    let ranked = engine().rank(&profile("donor-1"), &decayed, &categories, candidates, now());
    assert_eq!(ids(&ranked), vec!["urgent", "liked"]);
    assert!((ranked[0].score - ranked[1].score - 2.0).abs() < 1e-9);
}

#[test]
fn declared_interest_lifts_matching_category() {
    let mut donor = profile("donor-1");
    donor.interests = vec!["Education".to_string()];

    let ranked = engine().rank(
        &donor,
        &[],
        &HashMap::new(),
        vec![
            request("health", "medical", Urgency::Medium, 50.0, 100.0),
            request("school", "education", Urgency::Medium, 50.0, 100.0),
        ],
        now(),
    );

    assert_eq!(ids(&ranked), vec!["school", "health"]);
    assert!(ranked[0]
        .components
        .iter()
        .any(|component| component.signal == SignalKind::DeclaredInterest));
}

#[test]
fn skipped_request_drops_but_stays_in_feed() {
    let mut categories = HashMap::new();
    categories.insert(DonationRequestId("a".to_string()), "medical".to_string());
    let history = vec![event("donor-1", "a", InteractionType::Skip, 0)];

    let ranked = engine().rank(
        &profile("donor-1"),
        &history,
        &categories,
        vec![
            request("a", "medical", Urgency::Medium, 50.0, 100.0),
            request("b", "medical", Urgency::Medium, 50.0, 100.0),
        ],
        now(),
    );

    assert_eq!(ids(&ranked), vec!["b", "a"]);
    assert!(ranked[1]
        .components
        .iter()
        .any(|component| component.signal == SignalKind::Skipped && component.score < 0.0));
}

#[test]
fn ties_prefer_newest_request() {
    let mut older = request("older", "medical", Urgency::Medium, 50.0, 100.0);
    older.created_at = now() - Duration::days(10);
    let newer = request("newer", "medical", Urgency::Medium, 50.0, 100.0);

    let ranked = engine().rank(
        &profile("donor-1"),
        &[],
        &HashMap::new(),
        vec![older, newer],
        now(),
    );

    assert_eq!(ids(&ranked), vec!["newer", "older"]);
}

#[test]
fn expired_request_is_still_scored_with_full_time_pressure() {
    let mut expired = request("expired", "medical", Urgency::Low, 0.0, 100.0);
    expired.expires_at = Some(now() - Duration::days(3));
    let weights = ScoringWeights::default();

    let ranked = engine().rank(
        &profile("donor-1"),
        &[],
        &HashMap::new(),
        vec![expired],
        now(),
    );

    assert_eq!(ranked.len(), 1);
    let urgency = ranked[0]
        .components
        .iter()
        .find(|component| component.signal == SignalKind::Urgency)
        .expect("urgency scored");
    assert_eq!(urgency.score, weights.urgency_low + weights.time_pressure_max);
}

#[test]
fn closer_deadline_ranks_higher() {
    let mut soon = request("soon", "medical", Urgency::Medium, 50.0, 100.0);
    soon.expires_at = Some(now() + Duration::days(2));
    let mut later = request("later", "medical", Urgency::Medium, 50.0, 100.0);
    later.expires_at = Some(now() + Duration::days(20));

    let ranked = engine().rank(
        &profile("donor-1"),
        &[],
        &HashMap::new(),
        vec![later, soon],
        now(),
    );

    assert_eq!(ids(&ranked), vec!["soon", "later"]);
}

#[test]
fn malformed_amounts_degrade_only_that_signal() {
    let broken = request("broken", "medical", Urgency::High, 10.0, 0.0);

    let ranked = engine().rank(
        &profile("donor-1"),
        &[],
        &HashMap::new(),
        vec![
            broken,
            request("fine", "medical", Urgency::Low, 10.0, 100.0),
        ],
        now(),
    );

    assert_eq!(ranked.len(), 2);
    let broken = ranked
        .iter()
        .find(|entry| entry.request.id.0 == "broken")
        .expect("broken request still ranked");
    assert_eq!(broken.degraded_signals, vec![SignalKind::FundingProgress]);
    assert!(broken
        .components
        .iter()
        .any(|component| component.signal == SignalKind::Urgency));
}

#[test]
fn feed_respects_limit() {
    let fixture = fixture(
        (0..5)
            .map(|index| request(&format!("req-{index}"), "medical", Urgency::Low, 0.0, 10.0))
            .collect(),
        vec![profile("donor-1")],
    );

    let feed = fixture
        .engagement
        .feed
        .ranked_feed(
            &session("donor-1"),
            &CandidateFilter::default(),
            now(),
            Some(2),
        )
        .expect("feed ranks");

    assert_eq!(feed.len(), 2);
}

#[test]
fn feed_excludes_unlisted_requests() {
    let mut pending = request("pending", "medical", Urgency::High, 0.0, 10.0);
    pending.status = RequestStatus::Pending;
    let fixture = fixture(
        vec![pending, request("open", "medical", Urgency::Low, 0.0, 10.0)],
        vec![profile("donor-1")],
    );

    let feed = fixture
        .engagement
        .feed
        .ranked_feed(&session("donor-1"), &CandidateFilter::default(), now(), None)
        .expect("feed ranks");

    assert_eq!(ids(&feed), vec!["open"]);
}

#[test]
fn unknown_user_cannot_request_a_feed() {
    let fixture = fixture(
        vec![request("open", "medical", Urgency::Low, 0.0, 10.0)],
        vec![profile("donor-1")],
    );

    let error = fixture
        .engagement
        .feed
        .ranked_feed(&session("ghost"), &CandidateFilter::default(), now(), None)
        .expect_err("unknown user");

    assert!(matches!(error, RecommendationError::UnknownUser(_)));
    assert_eq!(error.kind(), ErrorKind::NotFound);
}

#[test]
fn unavailable_history_falls_back_to_cold_start() {
    let service = RecommendationService::new(
        Arc::new(MemoryCatalog::with(vec![
            request("a", "medical", Urgency::Low, 0.0, 10.0),
            request("b", "medical", Urgency::High, 0.0, 10.0),
        ])),
        Arc::new(MemoryProfiles::with(vec![profile("donor-1")])),
        Arc::new(UnavailableLog),
        ScoringWeights::default(),
        10,
    );

    let feed = service
        .ranked_feed(&session("donor-1"), &CandidateFilter::default(), now(), None)
        .expect("feed still ranks");

    assert_eq!(ids(&feed), vec!["b", "a"]);
}

#[test]
fn explain_reports_components_for_one_request() {
    let fixture = fixture(
        vec![request("med", "medical", Urgency::High, 25.0, 100.0)],
        vec![profile("donor-1")],
    );

    let explained = fixture
        .engagement
        .feed
        .explain(
            &session("donor-1"),
            &DonationRequestId("med".to_string()),
            now(),
        )
        .expect("explains");

    let total: f64 = explained
        .components
        .iter()
        .map(|component| component.score)
        .sum();
    assert_eq!(explained.score, total);

    let missing = fixture
        .engagement
        .feed
        .explain(
            &session("donor-1"),
            &DonationRequestId("nope".to_string()),
            now(),
        )
        .expect_err("unknown request");
    assert!(matches!(missing, RecommendationError::UnknownRequest(_)));
}
