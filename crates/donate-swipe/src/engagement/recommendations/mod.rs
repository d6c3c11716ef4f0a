//! Swipe-feed ranking.
//!
//! Each candidate gets an additive score built from independent signals (category affinity from
//! past interactions, declared interests, urgency, funding progress, and prior skips). Every
//! signal is reported as a [`ScoreComponent`] so a ranking can be explained after the fact.

mod config;
mod service;
mod signals;

pub use config::ScoringWeights;
pub use service::{RecommendationError, RecommendationService};

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::domain::{DonationRequest, DonationRequestId, InteractionEvent, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    Affinity,
    DeclaredInterest,
    Urgency,
    FundingProgress,
    Skipped,
}

/// Discrete contribution to a candidate's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub signal: SignalKind,
    pub score: f64,
    pub notes: String,
}

/// A candidate with its score for one user. Scores are not comparable across users.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedRequest {
    #[serde(flatten)]
    pub request: DonationRequest,
    pub score: f64,
    pub components: Vec<ScoreComponent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub degraded_signals: Vec<SignalKind>,
}

/// Stateless scorer applying [`ScoringWeights`] to a user's history and a candidate pool.
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    weights: ScoringWeights,
}

impl RecommendationEngine {
    pub fn new(weights: ScoringWeights) -> Self {
        Self { weights }
    }

    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Score and order `candidates` for one user.
    ///
    /// `categories` maps every request referenced by `history` to its category; events whose
    /// request is unknown contribute nothing. The result is sorted by score descending, then
    /// newest `created_at`, then id, so identical inputs always produce identical order.
    pub fn rank(
        &self,
        profile: &UserProfile,
        history: &[InteractionEvent],
        categories: &HashMap<DonationRequestId, String>,
        candidates: Vec<DonationRequest>,
        now: DateTime<Utc>,
    ) -> Vec<RankedRequest> {
        let history = signals::summarize_history(history, categories, &self.weights, now);
        if history.is_empty() && !profile.has_declared_interests() {
            debug!(user = %profile.user_id, "cold start: ranking on urgency and progress only");
        }

        let mut ranked: Vec<RankedRequest> = candidates
            .into_iter()
            .map(|request| {
                let (components, score, degraded_signals) =
                    signals::score_request(&request, profile, &history, &self.weights, now);
                RankedRequest {
                    request,
                    score,
                    components,
                    degraded_signals,
                }
            })
            .collect();

        ranked.sort_by(feed_order);
        ranked
    }
}

fn feed_order(left: &RankedRequest, right: &RankedRequest) -> Ordering {
    right
        .score
        .total_cmp(&left.score)
        .then_with(|| right.request.created_at.cmp(&left.request.created_at))
        .then_with(|| left.request.id.cmp(&right.request.id))
}
