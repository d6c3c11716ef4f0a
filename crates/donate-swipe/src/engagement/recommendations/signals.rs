use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::config::ScoringWeights;
use super::{ScoreComponent, SignalKind};
use crate::engagement::domain::{
    DonationRequest, DonationRequestId, InteractionEvent, InteractionType, UserProfile,
};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Per-user aggregates derived once from the interaction log and reused for every candidate.
#[derive(Debug, Default)]
pub(crate) struct HistorySignals {
    /// Decayed interaction weight per normalized category.
    pub(crate) affinity: HashMap<String, f64>,
    pub(crate) skips: HashMap<DonationRequestId, u32>,
}

impl HistorySignals {
    pub(crate) fn is_empty(&self) -> bool {
        self.affinity.is_empty() && self.skips.is_empty()
    }
}

/// Reason a single signal could not be computed for a candidate.
#[derive(Debug, thiserror::Error)]
pub(crate) enum SignalError {
    #[error("target amount {0} is not a positive finite number")]
    InvalidTarget(f64),
    #[error("current amount {0} is not a non-negative finite number")]
    InvalidCurrent(f64),
}

pub(crate) fn summarize_history(
    history: &[InteractionEvent],
    categories: &HashMap<DonationRequestId, String>,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> HistorySignals {
    let mut signals = HistorySignals::default();

    for event in history {
        if event.interaction_type == InteractionType::Skip {
            *signals.skips.entry(event.entity_id.clone()).or_insert(0) += 1;
        }

        let Some(category) = categories.get(&event.entity_id) else {
            continue;
        };
        let value = f64::from(event.interaction_value());
        if value == 0.0 {
            continue;
        }

        let age_days =
            ((now - event.recorded_at).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
        *signals.affinity.entry(category.clone()).or_insert(0.0) +=
            value * decay(age_days, weights.affinity_half_life_days);
    }

    signals
}

fn decay(age_days: f64, half_life_days: f64) -> f64 {
    if half_life_days > 0.0 && half_life_days.is_finite() {
        0.5_f64.powf(age_days / half_life_days)
    } else {
        1.0
    }
}

/// Compute every signal for one candidate. Signals that fail are reported back by kind and
/// left out of the total.
pub(crate) fn score_request(
    request: &DonationRequest,
    profile: &UserProfile,
    history: &HistorySignals,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> (Vec<ScoreComponent>, f64, Vec<SignalKind>) {
    let category = request.category_key();
    let outcomes = [
        (SignalKind::Affinity, affinity(&category, history, weights)),
        (
            SignalKind::DeclaredInterest,
            declared_interest(&category, profile, weights),
        ),
        (SignalKind::Urgency, urgency(request, weights, now)),
        (SignalKind::FundingProgress, funding_progress(request, weights)),
        (SignalKind::Skipped, skipped(request, history, weights)),
    ];

    let mut components = Vec::new();
    let mut degraded = Vec::new();
    let mut total = 0.0;

    for (kind, outcome) in outcomes {
        match outcome {
            Ok(Some(component)) => {
                total += component.score;
                components.push(component);
            }
            Ok(None) => {}
            Err(error) => {
                debug!(request = %request.id, signal = ?kind, %error, "signal skipped");
                degraded.push(kind);
            }
        }
    }

    (components, total, degraded)
}

fn affinity(
    category: &str,
    history: &HistorySignals,
    weights: &ScoringWeights,
) -> Result<Option<ScoreComponent>, SignalError> {
    let decayed = history.affinity.get(category).copied().unwrap_or(0.0);
    if decayed <= 0.0 {
        return Ok(None);
    }

    Ok(Some(ScoreComponent {
        signal: SignalKind::Affinity,
        score: decayed * weights.affinity_per_point,
        notes: format!("{decayed:.2} decayed engagement points in '{category}'"),
    }))
}

fn declared_interest(
    category: &str,
    profile: &UserProfile,
    weights: &ScoringWeights,
) -> Result<Option<ScoreComponent>, SignalError> {
    if !profile.declares(category) {
        return Ok(None);
    }

    Ok(Some(ScoreComponent {
        signal: SignalKind::DeclaredInterest,
        score: weights.declared_interest_bonus,
        notes: format!("'{category}' is a declared interest"),
    }))
}

fn urgency(
    request: &DonationRequest,
    weights: &ScoringWeights,
    now: DateTime<Utc>,
) -> Result<Option<ScoreComponent>, SignalError> {
    let level_bonus = weights.urgency_bonus(request.urgency);

    let (pressure, window_note) = match request.expires_at {
        Some(expires_at) => {
            let days_left =
                ((expires_at - now).num_seconds() as f64 / SECONDS_PER_DAY).max(0.0);
            let horizon = weights.time_pressure_horizon_days;
            let pressure = if horizon > 0.0 {
                weights.time_pressure_max * (1.0 - days_left / horizon).max(0.0)
            } else {
                0.0
            };
            (pressure, format!(", {days_left:.1} day(s) left"))
        }
        None => (0.0, String::new()),
    };

    Ok(Some(ScoreComponent {
        signal: SignalKind::Urgency,
        score: level_bonus + pressure,
        notes: format!("{} urgency{window_note}", request.urgency.label()),
    }))
}

fn funding_progress(
    request: &DonationRequest,
    weights: &ScoringWeights,
) -> Result<Option<ScoreComponent>, SignalError> {
    if !request.target_amount.is_finite() || request.target_amount <= 0.0 {
        return Err(SignalError::InvalidTarget(request.target_amount));
    }
    if !request.current_amount.is_finite() || request.current_amount < 0.0 {
        return Err(SignalError::InvalidCurrent(request.current_amount));
    }

    let ratio = request.current_amount / request.target_amount;
    let counted = ratio.min(weights.progress_ratio_cap);

    Ok(Some(ScoreComponent {
        signal: SignalKind::FundingProgress,
        score: -weights.progress_penalty * counted,
        notes: format!("{:.0}% funded", ratio * 100.0),
    }))
}

fn skipped(
    request: &DonationRequest,
    history: &HistorySignals,
    weights: &ScoringWeights,
) -> Result<Option<ScoreComponent>, SignalError> {
    let skips = history.skips.get(&request.id).copied().unwrap_or(0);
    if skips == 0 {
        return Ok(None);
    }

    let counted = skips.min(weights.max_counted_skips);
    Ok(Some(ScoreComponent {
        signal: SignalKind::Skipped,
        score: -weights.skip_penalty * f64::from(counted),
        notes: format!("skipped {skips} time(s)"),
    }))
}
