use crate::error::AppError;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::reqwest::async_http_client;
use oauth2::url::Url;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, RequestTokenError,
    Scope, TokenUrl,
};

/// Scopes needed to append tracks to public and private playlists
pub const SPOTIFY_SCOPES: &[&str] = &["playlist-modify-public", "playlist-modify-private"];

const DEFAULT_EXCHANGE_ERROR: &str = "Failed to exchange Spotify OAuth code";

/// Build the OAuth2 client for the Spotify accounts service
///
/// The same client drives the authorize redirect, the one-time code
/// exchange and the refresh-token grant. Client credentials are sent with
/// HTTP Basic auth.
///
/// # Arguments
/// * `client_id` / `client_secret` - Spotify app credentials
/// * `accounts_base_url` - Usually `https://accounts.spotify.com`
/// * `redirect_uri` - Callback registered with the Spotify app
///
/// # Errors
/// `Configuration` if any of the URLs is malformed
pub fn build_oauth_client(
    client_id: &str,
    client_secret: &str,
    accounts_base_url: &str,
    redirect_uri: &str,
) -> Result<BasicClient, AppError> {
    let base = accounts_base_url.trim_end_matches('/');

    let auth_url = AuthUrl::new(format!("{}/authorize", base))
        .map_err(|e| AppError::Configuration(format!("Invalid Spotify authorize URL: {}", e)))?;
    let token_url = TokenUrl::new(format!("{}/api/token", base))
        .map_err(|e| AppError::Configuration(format!("Invalid Spotify token URL: {}", e)))?;
    let redirect_url = RedirectUrl::new(redirect_uri.to_string())
        .map_err(|e| AppError::Configuration(format!("Invalid Spotify redirect URI: {}", e)))?;

    Ok(BasicClient::new(
        ClientId::new(client_id.to_string()),
        Some(ClientSecret::new(client_secret.to_string())),
        auth_url,
        Some(token_url),
    )
    .set_redirect_uri(redirect_url))
}

/// Generate a random, URL-safe OAuth state token
///
/// The value is passed through the redirect but not checked on return.
pub fn generate_state_token() -> String {
    let bytes: [u8; 32] = rand::random();
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Build the Spotify authorize URL for the playlist scopes
pub fn build_spotify_authorize_url(oauth_client: &BasicClient, state: String) -> Url {
    let (auth_url, _csrf_token) = oauth_client
        .authorize_url(|| CsrfToken::new(state))
        .add_scopes(SPOTIFY_SCOPES.iter().map(|s| Scope::new(s.to_string())))
        .url();

    auth_url
}

/// Exchange an authorization code for Spotify tokens
///
/// # Returns
/// The token payload as granted. `refresh_token` may be absent when the
/// user did not grant offline access.
///
/// # Errors
/// `SpotifyApi` carrying the provider's `error_description`, else its
/// `error`, else a generic message
pub async fn exchange_code_for_tokens(
    oauth_client: &BasicClient,
    code: &str,
) -> Result<BasicTokenResponse, AppError> {
    tracing::info!("Exchanging Spotify authorization code");

    oauth_client
        .exchange_code(AuthorizationCode::new(code.to_string()))
        .request_async(async_http_client)
        .await
        .map_err(|e| {
            tracing::error!(error = ?e, "Spotify code exchange failed");
            AppError::SpotifyApi(exchange_error_message(&e))
        })
}

fn exchange_error_message<RE>(err: &RequestTokenError<RE, BasicErrorResponse>) -> String
where
    RE: std::error::Error + 'static,
{
    match err {
        RequestTokenError::ServerResponse(response) => {
            let error: &str = response.error().as_ref();
            response
                .error_description()
                .filter(|description| !description.is_empty())
                .cloned()
                .or_else(|| (!error.is_empty()).then(|| error.to_string()))
                .unwrap_or_else(|| DEFAULT_EXCHANGE_ERROR.to_string())
        }
        // Error bodies that are not standard OAuth errors still may carry the fields
        RequestTokenError::Parse(_, body) => {
            provider_message(body).unwrap_or_else(|| DEFAULT_EXCHANGE_ERROR.to_string())
        }
        RequestTokenError::Request(e) => e.to_string(),
        RequestTokenError::Other(_) => DEFAULT_EXCHANGE_ERROR.to_string(),
    }
}

fn provider_message(body: &[u8]) -> Option<String> {
    let payload: serde_json::Value = serde_json::from_slice(body).ok()?;

    ["error_description", "error"].iter().find_map(|field| {
        payload
            .get(field)
            .and_then(|value| value.as_str())
            .filter(|value| !value.is_empty())
            .map(str::to_string)
    })
}
