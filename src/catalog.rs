use crate::models::Track;
use anyhow::{Context, Result};
use chrono::Utc;
use log::{debug, info, warn};
use std::collections::BTreeMap;
use std::path::Path;

/// Immutable snapshot of the liked-track catalog, keyed by track id.
///
/// Syncing never edits a snapshot in place: `merged_with` builds a new one,
/// so a sampling run always sees a consistent set of tracks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    tracks: BTreeMap<String, Track>,
}

impl Catalog {
    /// Build a snapshot from tracks; a later duplicate id replaces an earlier one
    pub fn from_tracks<I: IntoIterator<Item = Track>>(tracks: I) -> Self {
        Catalog {
            tracks: tracks.into_iter().map(|t| (t.id.clone(), t)).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Track> {
        self.tracks.get(id)
    }

    /// Tracks in stable id order
    pub fn tracks(&self) -> impl Iterator<Item = &Track> {
        self.tracks.values()
    }

    pub fn ids(&self) -> Vec<String> {
        self.tracks.keys().cloned().collect()
    }

    /// Merge freshly fetched tracks into a new snapshot.
    ///
    /// Known tracks keep their user rating and stored `added_at` while metadata,
    /// reported audio features and genres are refreshed. Unknown tracks are
    /// inserted as-is.
    pub fn merged_with<I: IntoIterator<Item = Track>>(&self, fetched: I) -> Catalog {
        let mut tracks = self.tracks.clone();
        let mut added = 0;
        let mut updated = 0;

        for fresh in fetched {
            match tracks.get_mut(&fresh.id) {
                Some(existing) => {
                    existing.name = fresh.name;
                    existing.artist = fresh.artist;
                    existing.album = fresh.album;
                    for (feature, value) in fresh.audio_features {
                        let slot = existing.audio_features.entry(feature).or_insert(None);
                        if value.is_some() {
                            *slot = value;
                        }
                    }
                    existing.genres.extend(fresh.genres);
                    existing.last_updated = Utc::now();
                    updated += 1;
                }
                None => {
                    tracks.insert(fresh.id.clone(), fresh);
                    added += 1;
                }
            }
        }

        debug!("Merged catalog: {added} new tracks, {updated} refreshed");
        Catalog { tracks }
    }

    /// Load a catalog from JSON. A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Catalog> {
        if !path.exists() {
            warn!(
                "Catalog file {} not found, starting with an empty catalog",
                path.display()
            );
            return Ok(Catalog::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        let tracks: BTreeMap<String, Track> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))?;

        let catalog = Catalog::from_tracks(tracks.into_iter().map(|(id, mut track)| {
            track.id = id;
            track
        }));
        info!("Loaded {} tracks from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Write the catalog as pretty-printed JSON keyed by track id
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(&self.tracks)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write catalog {}", path.display()))?;
        info!("Saved {} tracks to {}", self.len(), path.display());
        Ok(())
    }
}

/// Where liked tracks come from during a sync
#[cfg_attr(test, mockall::automock)]
pub trait LibrarySource {
    /// Every liked track, each tracking `features`, with default ratings
    fn fetch_liked_tracks(&self, features: &[String]) -> Result<Vec<Track>>;
}

/// Pull liked tracks from `source` and merge them into a new snapshot
pub fn sync_catalog(
    source: &dyn LibrarySource,
    current: &Catalog,
    features: &[String],
) -> Result<Catalog> {
    let fetched = source.fetch_liked_tracks(features)?;
    info!("Fetched {} liked tracks", fetched.len());
    Ok(current.merged_with(fetched))
}
