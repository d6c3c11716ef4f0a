use serde::{Deserialize, Serialize};

use crate::engagement::domain::Urgency;

/// Coefficients for the additive feed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    /// Score per decayed interaction point on a matching category.
    pub affinity_per_point: f64,
    pub affinity_half_life_days: f64,
    pub declared_interest_bonus: f64,
    pub urgency_low: f64,
    pub urgency_medium: f64,
    pub urgency_high: f64,
    /// Bonus when the request expires now; shrinks linearly to zero at the horizon.
    pub time_pressure_max: f64,
    pub time_pressure_horizon_days: f64,
    pub progress_penalty: f64,
    /// Funding ratios above this cap add no further penalty.
    pub progress_ratio_cap: f64,
    pub skip_penalty: f64,
    pub max_counted_skips: u32,
}

impl ScoringWeights {
    pub fn urgency_bonus(&self, urgency: Urgency) -> f64 {
        match urgency {
            Urgency::Low => self.urgency_low,
            Urgency::Medium => self.urgency_medium,
            Urgency::High => self.urgency_high,
        }
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            affinity_per_point: 4.0,
            affinity_half_life_days: 14.0,
            declared_interest_bonus: 6.0,
            urgency_low: 1.0,
            urgency_medium: 2.5,
            urgency_high: 4.0,
            time_pressure_max: 3.0,
            time_pressure_horizon_days: 30.0,
            progress_penalty: 5.0,
            progress_ratio_cap: 1.25,
            skip_penalty: 3.0,
            max_counted_skips: 3,
        }
    }
}
