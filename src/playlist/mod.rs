pub mod assembler;
pub mod config;
pub mod distribution;
pub mod error;
pub mod generator;
pub mod metadata;
pub mod sampler;
pub mod weights;

pub use assembler::{PlaylistAssembler, PlaylistSink};
pub use config::*;
pub use distribution::*;
pub use error::*;
pub use generator::*;
pub use metadata::*;
pub use sampler::*;
pub use weights::*;

#[cfg(test)]
mod sampling_tests;
