use anyhow::{Context, Result};
use std::path::PathBuf;

const DEFAULT_CATALOG_PATH: &str = "my_music.json";
const DEFAULT_AUDIO_FEATURES: &str = "instrumentalness";

/// Local settings loaded from environment variables
#[derive(Debug)]
pub struct Config {
    pub catalog_path: PathBuf,
    /// Audio features recorded for every track during sync
    pub audio_features: Vec<String>,
}

/// Credentials for the remote music service
#[derive(Debug)]
pub struct ApiConfig {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    /// Skips the first token refresh when still valid
    pub access_token: Option<String>,
}

/// Load local configuration from `.env` and environment
pub fn load_config() -> Config {
    dotenv::dotenv().ok();
    let catalog_path = std::env::var("CATALOG_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CATALOG_PATH));
    let audio_features = parse_feature_list(
        &std::env::var("AUDIO_FEATURES").unwrap_or_else(|_| DEFAULT_AUDIO_FEATURES.to_string()),
    );
    Config {
        catalog_path,
        audio_features,
    }
}

/// Load API credentials; only commands that reach the remote service need them
pub fn load_api_config() -> Result<ApiConfig> {
    dotenv::dotenv().ok();
    let client_id = std::env::var("SPOTIFY_CLIENT_ID").context("SPOTIFY_CLIENT_ID is not set")?;
    let client_secret =
        std::env::var("SPOTIFY_CLIENT_SECRET").context("SPOTIFY_CLIENT_SECRET is not set")?;
    let refresh_token =
        std::env::var("SPOTIFY_REFRESH_TOKEN").context("SPOTIFY_REFRESH_TOKEN is not set")?;
    let access_token = std::env::var("SPOTIFY_ACCESS_TOKEN").ok();
    Ok(ApiConfig {
        client_id,
        client_secret,
        refresh_token,
        access_token,
    })
}

/// Split a comma separated feature list, dropping blanks and duplicates
pub fn parse_feature_list(raw: &str) -> Vec<String> {
    let mut features: Vec<String> = Vec::new();
    for feature in raw.split(',').map(str::trim).filter(|f| !f.is_empty()) {
        let feature = feature.to_lowercase();
        if !features.contains(&feature) {
            features.push(feature);
        }
    }
    features
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feature_list() {
        assert_eq!(
            parse_feature_list("instrumentalness, Energy,,energy , valence"),
            vec!["instrumentalness", "energy", "valence"]
        );
        assert!(parse_feature_list("  ").is_empty());
    }
}
