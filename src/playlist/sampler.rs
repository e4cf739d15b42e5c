use super::{CumulativeDistribution, ExhaustionCause, RunParams, SamplingError};
use log::debug;
use rand::Rng;
use std::collections::{HashSet, VecDeque};

/// The most recent selections, which a new draw must not repeat
#[derive(Debug)]
struct CooldownWindow {
    size: usize,
    order: VecDeque<usize>,
    members: HashSet<usize>,
}

impl CooldownWindow {
    /// Membership never exceeds the number of drawable indices, so that bounds the allocation
    fn new(size: usize, selectable: usize) -> Self {
        let capacity = size.min(selectable);
        Self {
            size,
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
        }
    }

    fn contains(&self, index: usize) -> bool {
        self.members.contains(&index)
    }

    fn push(&mut self, index: usize) {
        if self.size == 0 {
            return;
        }
        if self.order.len() == self.size {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(index);
        self.members.insert(index);
    }

    /// True once every drawable index sits in the window, so no draw can succeed
    fn blocks_all(&self, selectable: usize) -> bool {
        self.size > 0 && self.members.len() >= selectable
    }
}

/// Draws track ids from a cumulative distribution with a no-repeat cooldown
pub struct WeightedSampler<'a, R: Rng> {
    distribution: &'a CumulativeDistribution,
    rng: R,
}

impl<'a, R: Rng> WeightedSampler<'a, R> {
    pub fn new(distribution: &'a CumulativeDistribution, rng: R) -> Self {
        Self { distribution, rng }
    }

    /// One unconstrained draw: uniform `r` in `[0, 1)` mapped to its interval
    pub fn draw_index(&mut self) -> usize {
        let r: f64 = self.rng.gen_range(0.0..1.0);
        self.distribution.locate(r)
    }

    /// Gather `run.target` ids, rejecting any draw that repeats one of the
    /// last `run.cooldown` selections.
    ///
    /// Rejected draws count toward `run.max_attempts`. When the cap runs out,
    /// or when the catalog has too few drawable tracks to ever satisfy the
    /// cooldown, the run fails with `AttemptsExhausted` carrying what it gathered.
    pub fn sample(&mut self, run: &RunParams) -> Result<Vec<String>, SamplingError> {
        run.validate()?;

        let ids = self.distribution.ids();
        let selectable = self.distribution.selectable_count();
        let mut window = CooldownWindow::new(run.cooldown, selectable);
        let mut selected: Vec<String> = Vec::with_capacity(run.target);
        let mut attempts = 0;
        let mut rejected = 0;

        while selected.len() < run.target {
            if window.blocks_all(selectable) || attempts >= run.max_attempts {
                return Err(Self::exhausted(run, selectable, attempts, selected));
            }
            attempts += 1;

            let index = self.draw_index();
            let Some(id) = ids.get(index) else {
                rejected += 1;
                continue;
            };
            if window.contains(index) {
                rejected += 1;
                continue;
            }

            window.push(index);
            selected.push(id.clone());
        }

        debug!(
            "Sampled {} tracks in {attempts} draws ({rejected} rejected by cooldown {})",
            selected.len(),
            run.cooldown
        );
        Ok(selected)
    }

    fn exhausted(
        run: &RunParams,
        selectable: usize,
        attempts: usize,
        partial: Vec<String>,
    ) -> SamplingError {
        let cause = if run.cooldown > 0 && selectable <= run.cooldown && run.target > selectable {
            ExhaustionCause::CatalogExhausted {
                selectable,
                cooldown: run.cooldown,
            }
        } else {
            ExhaustionCause::AttemptCap
        };
        SamplingError::AttemptsExhausted {
            gathered: partial.len(),
            target: run.target,
            attempts,
            cause,
            partial,
        }
    }
}
