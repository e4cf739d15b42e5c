use super::{SamplingError, WeightParams, WeightStrategy};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TARGET_LENGTH: usize = 1000;
pub const DEFAULT_COOLDOWN: usize = 100;
/// Draws allowed per requested track before a run gives up
pub const DEFAULT_ATTEMPTS_PER_TRACK: usize = 100;

/// Parameters of a single sampling run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunParams {
    /// Number of selections to gather
    pub target: usize,
    /// A track may not reappear within this many most recent selections; 0 disables
    pub cooldown: usize,
    /// Cap on total draws, accepted and rejected alike
    pub max_attempts: usize,
}

impl RunParams {
    pub fn new(target: usize, cooldown: usize) -> Self {
        Self {
            target,
            cooldown,
            max_attempts: target.saturating_mul(DEFAULT_ATTEMPTS_PER_TRACK),
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn validate(&self) -> Result<(), SamplingError> {
        if self.target == 0 {
            return Err(SamplingError::InvalidParameter(
                "target length must be positive".to_string(),
            ));
        }
        if self.max_attempts < self.target {
            return Err(SamplingError::InvalidParameter(format!(
                "max_attempts ({}) is smaller than the target length ({})",
                self.max_attempts, self.target
            )));
        }
        Ok(())
    }
}

impl Default for RunParams {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_LENGTH, DEFAULT_COOLDOWN)
    }
}

/// One playlist recipe, as loaded from the playlist configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaylistConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub strategy: WeightStrategy,
    #[serde(default)]
    pub weight_params: WeightParams,
    #[serde(default = "default_target_length")]
    pub target_length: usize,
    #[serde(default = "default_cooldown")]
    pub cooldown: usize,
    #[serde(default)]
    pub max_attempts: Option<usize>,
    /// Apply a final unweighted shuffle before publishing
    #[serde(default = "default_shuffle")]
    pub shuffle: bool,
}

fn default_target_length() -> usize {
    DEFAULT_TARGET_LENGTH
}

fn default_cooldown() -> usize {
    DEFAULT_COOLDOWN
}

fn default_shuffle() -> bool {
    true
}

impl Default for PlaylistConfig {
    fn default() -> Self {
        Self {
            name: "Liked Weighted".to_string(),
            description: None,
            strategy: WeightStrategy::Exponential,
            weight_params: WeightParams::default(),
            target_length: DEFAULT_TARGET_LENGTH,
            cooldown: DEFAULT_COOLDOWN,
            max_attempts: None,
            shuffle: true,
        }
    }
}

impl PlaylistConfig {
    /// Load playlist configurations directly from a JSON array file
    pub fn load_all_from_file(path: &str) -> anyhow::Result<Vec<PlaylistConfig>> {
        let content = std::fs::read_to_string(path)?;
        let configs: Vec<PlaylistConfig> = serde_json::from_str(&content)?;
        Ok(configs)
    }

    pub fn run_params(&self) -> RunParams {
        let params = RunParams::new(self.target_length, self.cooldown);
        match self.max_attempts {
            Some(max_attempts) => params.with_max_attempts(max_attempts),
            None => params,
        }
    }

    pub fn description_for(&self, track_count: usize) -> String {
        self.description
            .clone()
            .unwrap_or_else(|| format!("Generated playlist with {track_count} Songs"))
    }
}
