/// A playlist ready to be handed to a sink
#[derive(Debug, Clone)]
pub struct GeneratedPlaylist {
    pub name: String,
    pub description: String,
    pub track_ids: Vec<String>,
    /// Length the recipe asked for
    pub target_length: usize,
}

impl GeneratedPlaylist {
    /// False when a short selection was accepted
    pub fn is_complete(&self) -> bool {
        self.track_ids.len() >= self.target_length
    }

    pub fn distinct_tracks(&self) -> usize {
        self.track_ids
            .iter()
            .collect::<std::collections::HashSet<_>>()
            .len()
    }
}
