use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Lowest rating a user can give a track
pub const RATING_MIN: u8 = 1;
/// Highest rating; only tracks at this value earn the recency bonus
pub const RATING_MAX: u8 = 10;
/// Centre of the scale, also the rating new tracks start with
pub const RATING_MIDPOINT: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("rating {0} is outside 1..=10")]
pub struct RatingOutOfRange(pub u8);

/// User rating on the 1-10 scale. Out-of-range values cannot be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MAX: Rating = Rating(RATING_MAX);

    pub fn new(value: u8) -> Result<Self, RatingOutOfRange> {
        if (RATING_MIN..=RATING_MAX).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(RatingOutOfRange(value))
        }
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Signed distance from the midpoint, the exponent used by the exponential weights
    pub fn offset_from_midpoint(self) -> i32 {
        i32::from(self.0) - i32::from(RATING_MIDPOINT)
    }

    pub fn is_max(self) -> bool {
        self.0 == RATING_MAX
    }
}

impl Default for Rating {
    fn default() -> Self {
        Rating(RATING_MIDPOINT)
    }
}

impl TryFrom<u8> for Rating {
    type Error = RatingOutOfRange;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Rating::new(value)
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> u8 {
        rating.0
    }
}

/// A liked track as stored in the local catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: String,
    pub name: String,
    pub artist: String,
    pub album: String,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub genres: BTreeSet<String>,
    /// Tracked audio features; `None` until the API has reported a value
    #[serde(default)]
    pub audio_features: BTreeMap<String, Option<f64>>,
    pub added_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl Track {
    pub fn new(id: &str, name: &str, artist: &str, album: &str, added_at: DateTime<Utc>) -> Self {
        Track {
            id: id.to_string(),
            name: name.to_string(),
            artist: artist.to_string(),
            album: album.to_string(),
            rating: Rating::default(),
            genres: BTreeSet::new(),
            audio_features: BTreeMap::new(),
            added_at,
            last_updated: Utc::now(),
        }
    }

    /// Start tracking the given features, leaving existing values alone
    pub fn track_features(&mut self, features: &[String]) {
        for feature in features {
            self.audio_features.entry(feature.clone()).or_insert(None);
        }
    }

    /// Copy numeric values for features this track already tracks
    pub fn update_audio_features(&mut self, reported: &HashMap<String, serde_json::Value>) {
        for (feature, slot) in self.audio_features.iter_mut() {
            if let Some(value) = reported.get(feature).and_then(|v| v.as_f64()) {
                *slot = Some(value);
            }
        }
        self.last_updated = Utc::now();
    }

    pub fn add_genres<I: IntoIterator<Item = String>>(&mut self, genres: I) {
        self.genres.extend(genres.into_iter().map(|g| g.to_lowercase()));
        self.last_updated = Utc::now();
    }

    /// "Name - Artist", as shown in dry-run listings
    pub fn display_name(&self) -> String {
        format!("{} - {}", self.name, self.artist)
    }
}

/// One page of the saved-tracks endpoint
#[derive(Debug, Deserialize)]
pub struct SavedTracksPage {
    pub items: Vec<SavedTrackItem>,
    pub next: Option<String>,
    pub total: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SavedTrackItem {
    pub added_at: DateTime<Utc>,
    /// Null for tracks that are no longer available
    pub track: Option<ApiTrack>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTrack {
    /// Null for local files
    pub id: Option<String>,
    pub name: String,
    pub artists: Vec<ApiArtistRef>,
    pub album: ApiAlbumRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiArtistRef {
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct ApiAlbumRef {
    pub name: String,
}

impl ApiTrack {
    pub fn primary_artist(&self) -> Option<&ApiArtistRef> {
        self.artists.first()
    }

    /// Convert to a catalog track with the default rating
    pub fn to_track(&self, added_at: DateTime<Utc>, features: &[String]) -> Option<Track> {
        let id = self.id.as_deref()?;
        let artist = self
            .primary_artist()
            .map(|a| a.name.as_str())
            .unwrap_or("Unknown");
        let mut track = Track::new(id, &self.name, artist, &self.album.name, added_at);
        track.track_features(features);
        Some(track)
    }
}

/// Response of the audio-features endpoint; unknown ids come back as null
#[derive(Debug, Deserialize)]
pub struct AudioFeaturesResponse {
    pub audio_features: Vec<Option<HashMap<String, serde_json::Value>>>,
}

/// Response of the several-artists endpoint
#[derive(Debug, Deserialize)]
pub struct ArtistsResponse {
    pub artists: Vec<Option<ApiArtist>>,
}

#[derive(Debug, Deserialize)]
pub struct ApiArtist {
    pub id: String,
    #[serde(default)]
    pub genres: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub display_name: Option<String>,
}

/// Response structure for playlist creation
#[derive(Debug, Deserialize)]
pub struct CreatedPlaylist {
    pub id: String,
    #[serde(default)]
    pub external_urls: ExternalUrls,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExternalUrls {
    pub spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
}
