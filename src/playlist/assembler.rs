use anyhow::Result;
use rand::Rng;
use rand::seq::SliceRandom;

/// Destination for finished playlists
#[cfg_attr(test, mockall::automock)]
pub trait PlaylistSink {
    /// Create a playlist holding `track_ids` in order; returns a handle for it
    fn create(&self, name: &str, description: &str, track_ids: &[String]) -> Result<String>;
}

/// Final ordering of a sampled selection, and the hand-off to a sink
pub struct PlaylistAssembler;

impl PlaylistAssembler {
    /// Optionally shuffle the selection uniformly, then cut it to `length`.
    /// Shorter selections pass through unpadded.
    pub fn assemble<R: Rng + ?Sized>(
        mut selection: Vec<String>,
        length: usize,
        shuffle: bool,
        rng: &mut R,
    ) -> Vec<String> {
        if shuffle {
            selection.shuffle(rng);
        }
        selection.truncate(length);
        selection
    }

    pub fn publish(
        sink: &dyn PlaylistSink,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<String> {
        if track_ids.is_empty() {
            log::warn!("Creating empty playlist '{name}'");
        }
        sink.create(name, description, track_ids)
    }
}
