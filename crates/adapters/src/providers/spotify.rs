//! Spotify track matching with a cached client-credentials token.

use super::http::{build_client, decode_json, map_http_status, normalize_base_url, send, send_json};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use cinedex_config::SpotifyConfig;
use cinedex_domain::Track;
use cinedex_shared::{ErrorEnvelope, RequestContext, Result, SecretString};
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

const PROVIDER: &str = "spotify";
// Refresh a little before the server-side expiry.
const TOKEN_SLACK: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CachedToken {
    value: SecretString,
    expires_at: Instant,
}

/// Spotify Web API client for single-track searches.
#[derive(Debug)]
pub struct SpotifyClient {
    client: reqwest::Client,
    api_base_url: Box<str>,
    auth_url: Box<str>,
    basic_auth: SecretString,
    token: Mutex<Option<CachedToken>>,
}

impl SpotifyClient {
    /// Build a client from config; `None` without both credentials.
    pub fn from_config(config: &SpotifyConfig) -> Result<Option<Self>> {
        let (Some(client_id), Some(client_secret)) =
            (config.client_id.as_deref(), config.client_secret.as_ref())
        else {
            return Ok(None);
        };
        let encoded = STANDARD.encode(format!("{client_id}:{}", client_secret.expose()));
        Ok(Some(Self {
            client: build_client(PROVIDER, config.timeout_ms, HeaderMap::new())?,
            api_base_url: normalize_base_url(PROVIDER, &config.api_base_url)?,
            auth_url: normalize_base_url(PROVIDER, &config.auth_url)?,
            basic_auth: SecretString::new(format!("Basic {encoded}")),
            token: Mutex::new(None),
        }))
    }

    /// Search for `track:<title> artist:<artist>` and map the first hit.
    pub(crate) async fn find_track(
        &self,
        ctx: &RequestContext,
        title: &str,
        artist: &str,
    ) -> Result<Option<SpotifyTrack>> {
        let token = self.access_token(ctx).await?;
        let query = format!("track:{title} artist:{artist}");
        let request = self
            .client
            .get(format!("{}/search", self.api_base_url))
            .header(AUTHORIZATION, sensitive_header(&format!("Bearer {}", token.expose()))?)
            .query(&[("q", query.as_str()), ("type", "track"), ("limit", "1")]);
        let response: SearchResponse = send_json(ctx, PROVIDER, "spotify.search", request).await?;
        Ok(response.tracks.items.into_iter().next().map(SpotifyTrack::from))
    }

    async fn access_token(&self, ctx: &RequestContext) -> Result<SecretString> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() {
                return Ok(token.value.clone());
            }
        }

        let request = self
            .client
            .post(&*self.auth_url)
            .header(AUTHORIZATION, sensitive_header(self.basic_auth.expose())?)
            .form(&[("grant_type", "client_credentials")]);
        let (status, payload) = send(ctx, PROVIDER, "spotify.token", request).await?;
        if !status.is_success() {
            return Err(map_http_status(PROVIDER, status).with_metadata("operation", "token"));
        }
        let token: TokenResponse = decode_json(PROVIDER, &payload)?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_SLACK);
        let value = SecretString::from(token.access_token);
        *cached = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(value)
    }
}

/// A matched Spotify track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SpotifyTrack {
    pub title: Box<str>,
    pub artist: Option<Box<str>>,
    pub spotify_id: Box<str>,
    pub preview_url: Option<Box<str>>,
    pub external_url: Option<Box<str>>,
    pub album: Option<Box<str>>,
    pub duration_ms: Option<u64>,
}

impl SpotifyTrack {
    /// Merge the match into a generated track, keeping its description.
    pub(crate) fn enrich(self, track: Track) -> Track {
        Track {
            title: self.title,
            artist: self.artist.unwrap_or(track.artist),
            description: track.description,
            spotify_id: Some(self.spotify_id),
            preview_url: self.preview_url,
            external_url: self.external_url,
            album: self.album,
            duration_ms: self.duration_ms,
        }
    }
}

impl From<SearchItem> for SpotifyTrack {
    fn from(item: SearchItem) -> Self {
        Self {
            title: item.name.into_boxed_str(),
            artist: item
                .artists
                .into_iter()
                .next()
                .map(|artist| artist.name.into_boxed_str()),
            spotify_id: item.id.into_boxed_str(),
            preview_url: item.preview_url.map(String::into_boxed_str),
            external_url: item
                .external_urls
                .and_then(|urls| urls.spotify)
                .map(String::into_boxed_str),
            album: item.album.map(|album| album.name.into_boxed_str()),
            duration_ms: item.duration_ms,
        }
    }
}

fn sensitive_header(value: &str) -> Result<HeaderValue> {
    let mut header = HeaderValue::from_str(value).map_err(|_| {
        ErrorEnvelope::invalid_input("spotify credentials contain invalid header characters")
    })?;
    header.set_sensitive(true);
    Ok(header)
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

const fn default_expires_in() -> u64 {
    3600
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: SearchTracks,
}

#[derive(Debug, Deserialize)]
struct SearchTracks {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<SearchArtist>,
    preview_url: Option<String>,
    external_urls: Option<ExternalUrls>,
    album: Option<SearchAlbum>,
    duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct SearchArtist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchAlbum {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_are_both_required() -> Result<()> {
        let config = SpotifyConfig {
            client_id: Some("id".into()),
            ..SpotifyConfig::default()
        };
        assert!(SpotifyClient::from_config(&config)?.is_none());
        Ok(())
    }

    #[test]
    fn search_items_map_to_tracks() -> std::result::Result<(), serde_json::Error> {
        let item: SearchItem = serde_json::from_str(
            r#"{
                "id": "abc",
                "name": "Tears in Rain",
                "artists": [{"name": "Vangelis"}],
                "preview_url": null,
                "external_urls": {"spotify": "https://open.spotify.com/track/abc"},
                "album": {"name": "Blade Runner"},
                "duration_ms": 180000
            }"#,
        )?;
        let generated = Track {
            title: "Tears In Rain".into(),
            artist: "Vangelis".into(),
            description: "Roy's monologue".into(),
            spotify_id: None,
            preview_url: None,
            external_url: None,
            album: None,
            duration_ms: None,
        };
        let track = SpotifyTrack::from(item).enrich(generated);
        assert_eq!(&*track.title, "Tears in Rain");
        assert_eq!(track.spotify_id.as_deref(), Some("abc"));
        assert_eq!(&*track.description, "Roy's monologue");
        assert_eq!(track.album.as_deref(), Some("Blade Runner"));
        Ok(())
    }
}
