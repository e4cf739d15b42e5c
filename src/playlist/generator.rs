use super::assembler::PlaylistAssembler;
use super::{CumulativeDistribution, GeneratedPlaylist, PlaylistConfig, SamplingError, WeightedSampler};
use crate::catalog::Catalog;
use chrono::{DateTime, Utc};
use log::{info, warn};
use rand::Rng;

/// Turns a catalog snapshot into a playlist according to one recipe
pub struct PlaylistGenerator {
    config: PlaylistConfig,
}

impl PlaylistGenerator {
    pub fn new(config: PlaylistConfig) -> Self {
        Self { config }
    }

    /// Weigh the catalog as of `now`, sample with the recipe's cooldown and
    /// assemble the result. Any sampling failure is returned untouched.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<GeneratedPlaylist, SamplingError> {
        let distribution = CumulativeDistribution::build(
            catalog.tracks(),
            self.config.strategy,
            &self.config.weight_params,
            now,
        )?;
        info!(
            "'{}': {} of {} tracks selectable",
            self.config.name,
            distribution.selectable_count(),
            distribution.len()
        );

        let run = self.config.run_params();
        let selection = WeightedSampler::new(&distribution, &mut *rng).sample(&run)?;
        Ok(self.finish(selection, rng))
    }

    /// Like `generate`, but a run that ran out of attempts publishes what it
    /// gathered instead of failing, as long as it gathered something.
    pub fn generate_allowing_short<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<GeneratedPlaylist, SamplingError> {
        match self.generate(catalog, now, rng) {
            Err(SamplingError::AttemptsExhausted {
                gathered,
                target,
                cause,
                partial,
                ..
            }) if gathered > 0 => {
                warn!(
                    "'{}': accepting {gathered}/{target} tracks ({cause})",
                    self.config.name
                );
                Ok(self.finish(partial, rng))
            }
            other => other,
        }
    }

    /// Plain shuffle of the whole catalog, no weighting involved
    pub fn shuffle_all<R: Rng + ?Sized>(
        catalog: &Catalog,
        name: &str,
        length: usize,
        rng: &mut R,
    ) -> GeneratedPlaylist {
        let track_ids = PlaylistAssembler::assemble(catalog.ids(), length, true, rng);
        GeneratedPlaylist {
            name: name.to_string(),
            description: format!("Generated playlist with {} Songs", track_ids.len()),
            track_ids,
            target_length: length,
        }
    }

    fn finish<R: Rng + ?Sized>(&self, selection: Vec<String>, rng: &mut R) -> GeneratedPlaylist {
        let track_ids = PlaylistAssembler::assemble(
            selection,
            self.config.target_length,
            self.config.shuffle,
            rng,
        );
        GeneratedPlaylist {
            name: self.config.name.clone(),
            description: self.config.description_for(track_ids.len()),
            track_ids,
            target_length: self.config.target_length,
        }
    }
}
