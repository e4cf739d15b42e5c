//! Weight functions deciding how likely each track is to be drawn.
//!
//! Every strategy is a pure function of the track, its parameters and the
//! moment the run started. Weights are never negative; a zero weight keeps
//! its slot in the distribution but can never be drawn.

use super::SamplingError;
use crate::models::Track;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The closed set of weighting schemes a playlist recipe can pick from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeightStrategy {
    /// Every track weighs 1.0
    Uniform,
    /// `base^(rating - midpoint)`
    #[default]
    Exponential,
    /// Exponential plus a linear bonus for recently added top-rated tracks
    ExponentialRecent,
}

impl fmt::Display for WeightStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WeightStrategy::Uniform => "uniform",
            WeightStrategy::Exponential => "exponential",
            WeightStrategy::ExponentialRecent => "exponential_recent",
        };
        f.write_str(name)
    }
}

/// Tuning knobs shared by the weight strategies.
/// Missing fields fall back to the defaults, unknown fields are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightParams {
    /// Exponential base; 1.0 makes ratings irrelevant
    pub base: f64,
    /// How many days a top-rated track keeps a recency bonus
    pub recency_days: u32,
    /// Bonus per day remaining before the cutoff
    pub recency_bonus_per_day: f64,
}

impl Default for WeightParams {
    fn default() -> Self {
        Self {
            base: 2.0,
            recency_days: 365,
            recency_bonus_per_day: 0.01,
        }
    }
}

impl WeightParams {
    pub fn validate(&self) -> Result<(), SamplingError> {
        if !self.base.is_finite() || self.base <= 0.0 {
            return Err(SamplingError::InvalidParameter(format!(
                "base must be a positive number, got {}",
                self.base
            )));
        }
        if !self.recency_bonus_per_day.is_finite() || self.recency_bonus_per_day < 0.0 {
            return Err(SamplingError::InvalidParameter(format!(
                "recency_bonus_per_day must be non-negative, got {}",
                self.recency_bonus_per_day
            )));
        }
        Ok(())
    }
}

impl WeightStrategy {
    /// Weight of `track` under this strategy, evaluated as of `now`
    pub fn weight(self, track: &Track, params: &WeightParams, now: DateTime<Utc>) -> f64 {
        match self {
            WeightStrategy::Uniform => 1.0,
            WeightStrategy::Exponential => exponential(track, params.base),
            WeightStrategy::ExponentialRecent => exponential_recent(
                track,
                params.base,
                params.recency_days,
                params.recency_bonus_per_day,
                now,
            ),
        }
    }
}

/// `base^(rating - midpoint)`
pub fn exponential(track: &Track, base: f64) -> f64 {
    base.powi(track.rating.offset_from_midpoint())
}

/// Exponential weight, plus `(recency_days - age) * bonus_per_day` when the
/// track holds the maximum rating and is younger than `recency_days`.
///
/// Only the single maximum rating qualifies; near-maximum ratings get the
/// plain exponential weight.
pub fn exponential_recent(
    track: &Track,
    base: f64,
    recency_days: u32,
    bonus_per_day: f64,
    now: DateTime<Utc>,
) -> f64 {
    let weight = exponential(track, base);
    if !track.rating.is_max() {
        return weight;
    }

    let age = age_in_days(track.added_at, now);
    let cutoff = i64::from(recency_days);
    if age < cutoff {
        weight + (cutoff - age) as f64 * bonus_per_day
    } else {
        weight
    }
}

/// Whole days between `added_at` and `now`, truncated. Future timestamps count as 0.
pub fn age_in_days(added_at: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    now.signed_duration_since(added_at).num_days().max(0)
}
