use thiserror::Error;

/// Why a sampling run stopped before reaching its target length
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExhaustionCause {
    /// The draw cap ran out while progress was still possible
    AttemptCap,
    /// Fewer than `cooldown + 1` tracks can ever be drawn, so every
    /// selectable track is already inside the cooldown window
    CatalogExhausted { selectable: usize, cooldown: usize },
}

impl std::fmt::Display for ExhaustionCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExhaustionCause::AttemptCap => write!(f, "attempt cap reached"),
            ExhaustionCause::CatalogExhausted {
                selectable,
                cooldown,
            } => write!(
                f,
                "only {selectable} selectable tracks for a cooldown window of {cooldown}"
            ),
        }
    }
}

/// Errors surfaced by the distribution builder and the weighted sampler
#[derive(Debug, Error)]
pub enum SamplingError {
    #[error("cannot build a distribution from an empty catalog")]
    EmptyCatalog,

    #[error("all {tracks} tracks have zero weight")]
    ZeroTotalWeight { tracks: usize },

    #[error("gathered {gathered}/{target} tracks after {attempts} draws: {cause}")]
    AttemptsExhausted {
        gathered: usize,
        target: usize,
        attempts: usize,
        cause: ExhaustionCause,
        /// Selections made before the run gave up, in draw order
        partial: Vec<String>,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
}

impl SamplingError {
    /// Partial selection carried by `AttemptsExhausted`, if any
    pub fn into_partial(self) -> Option<Vec<String>> {
        match self {
            SamplingError::AttemptsExhausted { partial, .. } => Some(partial),
            _ => None,
        }
    }
}
