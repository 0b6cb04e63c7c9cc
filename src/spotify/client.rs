use crate::error::AppError;
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{RefreshToken, TokenResponse};
use serde::Deserialize;
use std::sync::RwLock;

/// A track returned by the catalog search
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Track {
    pub name: String,
    #[serde(deserialize_with = "artist_names")]
    pub artists: Vec<String>,
    pub uri: String,
}

impl Track {
    /// `"<name> — <artist>, <artist>"`
    pub fn display_name(&self) -> String {
        format!("{} — {}", self.name, self.artists.join(", "))
    }
}

fn artist_names<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    struct Artist {
        name: String,
    }

    let artists = Vec::<Artist>::deserialize(deserializer)?;
    Ok(artists.into_iter().map(|a| a.name).collect())
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: TrackPage,
}

#[derive(Debug, Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<Track>,
}

/// Spotify Web API error body: `{"error": {"status": 401, "message": "..."}}`
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Spotify Web API client for the shared jukebox account
///
/// Access tokens are derived from the long-lived refresh token and kept in a
/// single slot. Every refresh overwrites the slot (last writer wins).
pub struct SpotifyClient {
    http: reqwest::Client,
    oauth_client: BasicClient,
    api_base_url: String,
    refresh_token: Option<String>,
    access_token: RwLock<Option<String>>,
}

impl SpotifyClient {
    pub fn new(
        oauth_client: BasicClient,
        api_base_url: impl Into<String>,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            oauth_client,
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            refresh_token,
            access_token: RwLock::new(None),
        }
    }

    pub fn oauth_client(&self) -> &BasicClient {
        &self.oauth_client
    }

    /// True once a refresh token is configured
    pub fn is_connected(&self) -> bool {
        self.refresh_token.is_some()
    }

    /// The access token from the most recent refresh, if any
    pub fn current_access_token(&self) -> Option<String> {
        self.access_token.read().ok().and_then(|token| token.clone())
    }

    /// Exchange the refresh token for a fresh access token
    ///
    /// The new token replaces whatever is cached on the client.
    ///
    /// # Errors
    /// `Authentication` if no refresh token is configured or Spotify rejects it
    pub async fn refresh_access_token(&self) -> Result<String, AppError> {
        let refresh_token = self.refresh_token.as_ref().ok_or_else(|| {
            AppError::Authentication("No Spotify refresh token configured".to_string())
        })?;

        tracing::debug!("Refreshing Spotify access token");

        let token_result = self
            .oauth_client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.clone()))
            .request_async(async_http_client)
            .await
            .map_err(|e| {
                tracing::error!(error = ?e, "Token refresh request failed");
                AppError::Authentication(format!("Failed to refresh access token: {}", e))
            })?;

        let access_token = token_result.access_token().secret().to_string();

        if let Ok(mut slot) = self.access_token.write() {
            *slot = Some(access_token.clone());
        }

        tracing::debug!(
            expires_in_seconds = token_result.expires_in().map(|d| d.as_secs()),
            "Received new Spotify access token"
        );

        Ok(access_token)
    }

    fn bearer_token(&self) -> Result<String, AppError> {
        self.current_access_token().ok_or_else(|| {
            AppError::Authentication("No Spotify access token, refresh first".to_string())
        })
    }

    /// Search the catalog and return the best matching track
    ///
    /// Only the first result is requested (`limit=1`).
    ///
    /// # Returns
    /// None when the search has no hits
    pub async fn search_track(&self, query: &str, market: &str) -> Result<Option<Track>, AppError> {
        let token = self.bearer_token()?;
        let url = format!("{}/search", self.api_base_url);

        tracing::debug!(query = query, market = market, "Searching Spotify");

        let response = self
            .http
            .get(&url)
            .bearer_auth(token)
            .query(&[
                ("q", query),
                ("type", "track"),
                ("limit", "1"),
                ("market", market),
            ])
            .send()
            .await
            .map_err(|e| AppError::SpotifyApi(format!("Failed to call search: {}", e)))?;

        let response = ensure_success(response, "search").await?;

        let search = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| AppError::SpotifyApi(format!("Failed to parse search response: {}", e)))?;

        Ok(search.tracks.items.into_iter().next())
    }

    /// Append a single track to a playlist
    pub async fn add_track_to_playlist(
        &self,
        playlist_id: &str,
        track_uri: &str,
    ) -> Result<(), AppError> {
        let token = self.bearer_token()?;
        let url = format!("{}/playlists/{}/tracks", self.api_base_url, playlist_id);

        tracing::debug!(
            playlist_id = playlist_id,
            track_uri = track_uri,
            "Adding track to playlist"
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(token)
            .json(&serde_json::json!({ "uris": [track_uri] }))
            .send()
            .await
            .map_err(|e| AppError::SpotifyApi(format!("Failed to add track: {}", e)))?;

        ensure_success(response, "add to playlist").await?;
        Ok(())
    }
}

async fn ensure_success(
    response: reqwest::Response,
    operation: &str,
) -> Result<reqwest::Response, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let message = response
        .json::<ApiErrorBody>()
        .await
        .map(|body| body.error.message)
        .unwrap_or_else(|_| status.to_string());

    tracing::error!(status = %status, operation = operation, "Spotify API returned error");
    Err(AppError::SpotifyApi(format!("{} failed: {}", operation, message)))
}
