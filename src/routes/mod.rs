use crate::config::Config;
use crate::error::AppError;
use crate::slack::client::SlackClient;
use crate::spotify::client::SpotifyClient;
use crate::spotify::oauth::build_oauth_client;
use crate::{slack, spotify};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use std::sync::Arc;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub spotify: Arc<SpotifyClient>,
    pub slack: SlackClient,
}

impl AppState {
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let oauth_client = build_oauth_client(
            &config.spotify_client_id,
            &config.spotify_client_secret,
            &config.spotify_accounts_base_url,
            &config.spotify_redirect_uri,
        )?;

        let spotify = SpotifyClient::new(
            oauth_client,
            config.spotify_api_base_url.clone(),
            config.spotify_refresh_token.clone(),
        );
        let slack = SlackClient::new(
            config.slack_api_base_url.clone(),
            config.slack_bot_token.clone(),
        );

        Ok(Self {
            config: Arc::new(config),
            spotify: Arc::new(spotify),
            slack,
        })
    }
}

pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .merge(slack::routes::routes())
        .merge(spotify::routes::routes())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "ok": true }))
}

/// Landing page template
#[derive(Template, WebTemplate)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub slack_enabled: bool,
    pub spotify_connected: bool,
}

async fn index(State(state): State<AppState>) -> IndexTemplate {
    IndexTemplate {
        slack_enabled: state.config.slack_client_id.is_some(),
        spotify_connected: state.spotify.is_connected(),
    }
}

/// 302 Found, the status browsers and OAuth providers expect for redirects
pub(crate) fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
