use crate::catalog::LibrarySource;
use crate::config::ApiConfig;
use crate::models::{
    ArtistsResponse, AudioFeaturesResponse, CreatedPlaylist, SavedTracksPage, TokenResponse,
    Track, UserProfile,
};
use crate::playlist::PlaylistSink;
use anyhow::{Context, Result};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::time::Duration;
use ureq::Agent;
use urlencoding::encode;

const API_BASE: &str = "https://api.spotify.com/v1";
const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";
/// Saved tracks per page; the service caps this at 50
const SAVED_TRACKS_PAGE_SIZE: usize = 50;
/// Track ids per audio-features or add-tracks call
const TRACK_BATCH_SIZE: usize = 100;
const ARTIST_BATCH_SIZE: usize = 50;
const PAGE_DELAY: Duration = Duration::from_millis(100);

/// HTTP status carried by an error from `send`, if any
fn status_of(err: &anyhow::Error) -> Option<u16> {
    match err.downcast_ref::<ureq::Error>() {
        Some(ureq::Error::Status(code, _)) => Some(*code),
        _ => None,
    }
}

/// A small Web API client authenticated with a refresh token
pub struct SpotifyClient {
    agent: Agent,
    client_id: String,
    client_secret: String,
    refresh_token: String,
    access_token: RefCell<Option<String>>,
}

impl SpotifyClient {
    pub fn new(config: ApiConfig) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(Duration::from_secs(30))
            .build();

        SpotifyClient {
            agent,
            client_id: config.client_id,
            client_secret: config.client_secret,
            refresh_token: config.refresh_token,
            access_token: RefCell::new(config.access_token),
        }
    }

    /// Exchange the refresh token for a fresh access token
    pub fn refresh_access_token(&self) -> Result<()> {
        debug!("Refreshing access token");
        let response: TokenResponse = self
            .agent
            .post(TOKEN_URL)
            .send_form(&[
                ("grant_type", "refresh_token"),
                ("refresh_token", self.refresh_token.as_str()),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .map_err(|e| anyhow::anyhow!("Token refresh failed: {}", e))?
            .into_json()
            .context("Failed to parse token response")?;

        if response.refresh_token.is_some() {
            debug!("Token endpoint rotated the refresh token; keeping the configured one");
        }
        *self.access_token.borrow_mut() = Some(response.access_token);
        Ok(())
    }

    fn bearer(&self) -> Result<String> {
        if self.access_token.borrow().is_none() {
            self.refresh_access_token()?;
        }
        self.access_token
            .borrow()
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No access token available"))
    }

    /// Send an authenticated request, refreshing the token and retrying once on 401
    fn send(
        &self,
        method: &str,
        endpoint: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<ureq::Response> {
        let url = format!("{API_BASE}/{endpoint}");
        let attempt = |token: &str| {
            let request = self
                .agent
                .request(method, &url)
                .set("Authorization", &format!("Bearer {token}"));
            match body {
                Some(body) => request.send_json(body),
                None => request.call(),
            }
        };

        let result = match attempt(&self.bearer()?) {
            Err(ureq::Error::Status(401, _)) => {
                debug!("{method} {endpoint} returned 401, refreshing token");
                self.refresh_access_token()?;
                attempt(&self.bearer()?)
            }
            other => other,
        };

        result
            .map_err(anyhow::Error::new)
            .with_context(|| format!("{method} {endpoint} failed"))
    }

    fn get_json<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T> {
        let response = self.send("GET", endpoint, None)?;
        response
            .into_json()
            .with_context(|| format!("Failed to parse response from {endpoint}"))
    }

    pub fn current_user(&self) -> Result<UserProfile> {
        self.get_json("me")
    }

    /// Page through every saved track, enriching each page with audio
    /// features and primary-artist genres
    pub fn fetch_liked_tracks(&self, features: &[String]) -> Result<Vec<Track>> {
        let profile = self.current_user()?;
        info!(
            "Authenticated as: {}",
            profile.display_name.as_deref().unwrap_or(&profile.id)
        );

        let mut tracks = Vec::new();
        let mut offset = 0;
        let mut features_available = !features.is_empty();

        loop {
            info!(
                "Fetching tracks {}-{}...",
                offset,
                offset + SAVED_TRACKS_PAGE_SIZE
            );
            let page: SavedTracksPage = self.get_json(&format!(
                "me/tracks?limit={SAVED_TRACKS_PAGE_SIZE}&offset={offset}"
            ))?;
            if page.items.is_empty() {
                break;
            }
            if let Some(total) = page.total {
                debug!("Saved tracks reported by the service: {total}");
            }

            let mut batch = Vec::with_capacity(page.items.len());
            let mut artist_of: HashMap<String, String> = HashMap::new();
            for item in &page.items {
                let Some(api_track) = &item.track else {
                    continue;
                };
                let Some(track) = api_track.to_track(item.added_at, features) else {
                    debug!("Skipping track without id: {}", api_track.name);
                    continue;
                };
                if let Some(artist_id) = api_track.primary_artist().and_then(|a| a.id.clone()) {
                    artist_of.insert(track.id.clone(), artist_id);
                }
                batch.push(track);
            }

            if features_available {
                match self.apply_audio_features(&mut batch) {
                    Ok(available) => features_available = available,
                    Err(e) => warn!("Error updating audio features: {e:#}"),
                }
            }
            if let Err(e) = self.apply_genres(&mut batch, &artist_of) {
                warn!("Error updating genres: {e:#}");
            }

            tracks.extend(batch);
            offset += SAVED_TRACKS_PAGE_SIZE;
            if page.next.is_none() {
                break;
            }
            std::thread::sleep(PAGE_DELAY);
        }

        info!("Loaded {} liked songs", tracks.len());
        Ok(tracks)
    }

    /// Returns false when the service refuses audio features (403), so the
    /// caller can stop asking for the rest of the sync
    fn apply_audio_features(&self, batch: &mut [Track]) -> Result<bool> {
        let position: HashMap<String, usize> = batch
            .iter()
            .enumerate()
            .map(|(i, t)| (t.id.clone(), i))
            .collect();
        let ids: Vec<String> = batch.iter().map(|t| t.id.clone()).collect();

        for chunk in ids.chunks(TRACK_BATCH_SIZE) {
            let endpoint = format!("audio-features?ids={}", encode(&chunk.join(",")));
            let response: AudioFeaturesResponse = match self.get_json(&endpoint) {
                Ok(response) => response,
                Err(e) if status_of(&e) == Some(403) => {
                    warn!("403 accessing audio features; continuing without them");
                    return Ok(false);
                }
                Err(e) => return Err(e),
            };

            for reported in response.audio_features.into_iter().flatten() {
                let index = reported
                    .get("id")
                    .and_then(|id| id.as_str())
                    .and_then(|id| position.get(id));
                if let Some(&index) = index {
                    batch[index].update_audio_features(&reported);
                }
            }
        }
        Ok(true)
    }

    fn apply_genres(&self, batch: &mut [Track], artist_of: &HashMap<String, String>) -> Result<()> {
        let artist_ids: Vec<&String> = artist_of
            .values()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        let mut genres_of: HashMap<String, Vec<String>> = HashMap::new();
        for chunk in artist_ids.chunks(ARTIST_BATCH_SIZE) {
            let ids: Vec<&str> = chunk.iter().map(|id| id.as_str()).collect();
            let response: ArtistsResponse =
                self.get_json(&format!("artists?ids={}", encode(&ids.join(","))))?;
            for artist in response.artists.into_iter().flatten() {
                genres_of.insert(artist.id, artist.genres);
            }
        }

        for track in batch.iter_mut() {
            if let Some(genres) = artist_of.get(&track.id).and_then(|a| genres_of.get(a)) {
                track.add_genres(genres.iter().cloned());
            }
        }
        Ok(())
    }

    /// Create a private playlist and fill it with `track_ids` in order.
    /// Returns the playlist's web link, or its id when none is reported.
    pub fn create_playlist(
        &self,
        name: &str,
        description: &str,
        track_ids: &[String],
    ) -> Result<String> {
        let user = self.current_user()?;
        let body = json!({
            "name": name,
            "description": description,
            "public": false,
        });
        let playlist: CreatedPlaylist = self
            .send(
                "POST",
                &format!("users/{}/playlists", encode(&user.id)),
                Some(&body),
            )?
            .into_json()
            .context("Failed to parse playlist creation response")?;

        let uris: Vec<String> = track_ids
            .iter()
            .map(|id| format!("spotify:track:{id}"))
            .collect();
        for chunk in uris.chunks(TRACK_BATCH_SIZE) {
            self.send(
                "POST",
                &format!("playlists/{}/tracks", encode(&playlist.id)),
                Some(&json!({ "uris": chunk })),
            )
            .with_context(|| format!("Failed to add tracks to playlist '{name}'"))?;
        }

        info!("Created playlist '{name}' with {} tracks", track_ids.len());
        Ok(playlist.external_urls.spotify.unwrap_or(playlist.id))
    }
}

impl LibrarySource for SpotifyClient {
    fn fetch_liked_tracks(&self, features: &[String]) -> Result<Vec<Track>> {
        SpotifyClient::fetch_liked_tracks(self, features)
    }
}

impl PlaylistSink for SpotifyClient {
    fn create(&self, name: &str, description: &str, track_ids: &[String]) -> Result<String> {
        self.create_playlist(name, description, track_ids)
    }
}
