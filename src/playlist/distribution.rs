use super::{SamplingError, WeightParams, WeightStrategy};
use crate::models::Track;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashSet;

/// Normalized cumulative weights over a catalog snapshot.
///
/// Index `i` owns the half-open interval `[cumulative[i-1], cumulative[i])`,
/// so a zero-weight track owns an empty interval and is never drawn.
#[derive(Debug, Clone)]
pub struct CumulativeDistribution {
    ids: Vec<String>,
    weights: Vec<f64>,
    cumulative: Vec<f64>,
    total_weight: f64,
}

impl CumulativeDistribution {
    /// Weigh every track in iteration order and build the distribution
    pub fn build<'a, I>(
        tracks: I,
        strategy: WeightStrategy,
        params: &WeightParams,
        now: DateTime<Utc>,
    ) -> Result<Self, SamplingError>
    where
        I: IntoIterator<Item = &'a Track>,
    {
        params.validate()?;

        let weighted: Vec<(String, f64)> = tracks
            .into_iter()
            .map(|track| (track.id.clone(), strategy.weight(track, params, now)))
            .collect();

        debug!(
            "Weighted {} tracks with the {} strategy",
            weighted.len(),
            strategy
        );
        Self::from_weights(weighted)
    }

    /// Build from precomputed `(id, weight)` pairs, keeping their order.
    /// Ids must be unique, since the sampler's cooldown works on positions.
    pub fn from_weights(weighted: Vec<(String, f64)>) -> Result<Self, SamplingError> {
        if weighted.is_empty() {
            return Err(SamplingError::EmptyCatalog);
        }

        let mut ids = Vec::with_capacity(weighted.len());
        let mut weights = Vec::with_capacity(weighted.len());
        let mut cumulative = Vec::with_capacity(weighted.len());
        let mut seen = HashSet::with_capacity(weighted.len());
        let mut running = 0.0;

        for (id, weight) in weighted {
            if !seen.insert(id.clone()) {
                return Err(SamplingError::InvalidParameter(format!(
                    "track {id} appears more than once"
                )));
            }
            if !weight.is_finite() || weight < 0.0 {
                return Err(SamplingError::InvalidParameter(format!(
                    "weight for track {id} must be a non-negative number, got {weight}"
                )));
            }
            running += weight;
            ids.push(id);
            weights.push(weight);
            cumulative.push(running);
        }

        let total_weight = running;
        if !total_weight.is_finite() {
            return Err(SamplingError::InvalidParameter(format!(
                "total weight of {} tracks overflows",
                ids.len()
            )));
        }
        if total_weight <= 0.0 {
            return Err(SamplingError::ZeroTotalWeight { tracks: ids.len() });
        }

        for entry in cumulative.iter_mut() {
            *entry /= total_weight;
        }

        Ok(Self {
            ids,
            weights,
            cumulative,
            total_weight,
        })
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn cumulative(&self) -> &[f64] {
        &self.cumulative
    }

    /// Normalized probability of drawing `index`
    pub fn probability(&self, index: usize) -> Option<f64> {
        self.weights.get(index).map(|w| w / self.total_weight)
    }

    /// Number of tracks that can actually be drawn
    pub fn selectable_count(&self) -> usize {
        self.weights.iter().filter(|&&w| w > 0.0).count()
    }

    /// Index whose interval contains `r`, for `r` in `[0, 1)`
    pub fn locate(&self, r: f64) -> usize {
        leftmost_greater(&self.cumulative, r)
    }
}

/// Leftmost index whose value is strictly greater than `target`, or
/// `values.len()` if none is. `values` must be non-decreasing.
///
/// Ties resolve past every entry equal to `target`, which keeps
/// zero-width intervals unreachable.
pub fn leftmost_greater(values: &[f64], target: f64) -> usize {
    values.partition_point(|&v| v <= target)
}
