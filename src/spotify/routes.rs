use crate::error::AppError;
use crate::routes::{AppState, found};
use crate::slack::routes::OAuthCallbackQuery;
use crate::spotify::oauth::{
    build_spotify_authorize_url, exchange_code_for_tokens, generate_state_token,
};
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use oauth2::TokenResponse;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/spotify/login", get(login))
        .route("/spotify/oauth/callback", get(oauth_callback))
}

/// Initiates Spotify OAuth flow
///
/// # Endpoint
/// GET /spotify/login
///
/// # Returns
/// 302 redirect to the Spotify authorization page with a fresh state token
pub async fn login(State(state): State<AppState>) -> Response {
    let state_token = generate_state_token();
    let auth_url = build_spotify_authorize_url(state.spotify.oauth_client(), state_token);

    tracing::info!("Redirecting to Spotify authorization");
    found(auth_url.as_str())
}

#[derive(Template, WebTemplate)]
#[template(path = "spotify_connected.html")]
pub struct SpotifyConnectedTemplate {
    pub refresh_token: Option<String>,
}

/// Finish the Spotify connect flow
///
/// # Endpoint
/// GET /spotify/oauth/callback?code=...&state=...
///
/// Exchanges the code and shows the refresh token once. The token is not
/// stored; the operator copies it into `SPOTIFY_REFRESH_TOKEN`.
///
/// # Returns
/// - 200 HTML with the refresh token (or a note that none was returned)
/// - 400 if Spotify reported an error or the code is missing
/// - 500 with the provider message if the exchange fails
pub async fn oauth_callback(
    State(state): State<AppState>,
    Query(params): Query<OAuthCallbackQuery>,
) -> Response {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "Spotify OAuth denied");
        return (
            StatusCode::BAD_REQUEST,
            format!("Spotify OAuth failed: {}", error),
        )
            .into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing Spotify OAuth code.").into_response();
    };

    let tokens = match exchange_code_for_tokens(state.spotify.oauth_client(), &code).await {
        Ok(tokens) => tokens,
        Err(e) => {
            tracing::error!(error = %e, "Spotify OAuth callback failed");
            let message = match e {
                AppError::SpotifyApi(message) => message,
                other => other.to_string(),
            };
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Spotify OAuth failed: {}", message),
            )
                .into_response();
        }
    };

    let refresh_token = tokens.refresh_token().map(|t| t.secret().clone());

    tracing::info!(
        refresh_token_returned = refresh_token.is_some(),
        "Spotify account connected"
    );

    SpotifyConnectedTemplate { refresh_token }.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::tests::base_env;
    use axum::body::Body;
    use axum::http::{Request, header};
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn app_for(accounts_base_url: &str) -> Router {
        let mut env: Vec<(String, String)> = base_env()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env.push((
            "SPOTIFY_ACCOUNTS_BASE_URL".to_string(),
            accounts_base_url.to_string(),
        ));

        let state = AppState::from_config(Config::from_vars(env).unwrap()).unwrap();
        routes().with_state(state)
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn body_string(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_login_redirects_to_spotify() {
        let response = app_for("https://accounts.spotify.com")
            .oneshot(get_request("/spotify/login"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        let location = response.headers()[header::LOCATION].to_str().unwrap();
        assert!(location.starts_with("https://accounts.spotify.com/authorize?"));
        assert!(location.contains("response_type=code"));
        assert!(location.contains("client_id=spotify-id"));
        assert!(location.contains("state="));
    }

    #[tokio::test]
    async fn test_login_uses_fresh_state_each_time() {
        let app = app_for("https://accounts.spotify.com");

        let first = app.clone().oneshot(get_request("/spotify/login")).await.unwrap();
        let second = app.oneshot(get_request("/spotify/login")).await.unwrap();

        assert_ne!(
            first.headers()[header::LOCATION],
            second.headers()[header::LOCATION]
        );
    }

    #[tokio::test]
    async fn test_callback_missing_code() {
        let response = app_for("https://accounts.spotify.com")
            .oneshot(get_request("/spotify/oauth/callback"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_string(response).await, "Missing Spotify OAuth code.");
    }

    #[tokio::test]
    async fn test_callback_reports_provider_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let response = app_for(&server.uri())
            .oneshot(get_request("/spotify/oauth/callback?error=access_denied&state=s"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_string(response).await,
            "Spotify OAuth failed: access_denied"
        );
    }

    #[tokio::test]
    async fn test_callback_escapes_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "refresh_token": "tok<script>alert(1)</script>"
            })))
            .mount(&server)
            .await;

        let response = app_for(&server.uri())
            .oneshot(get_request("/spotify/oauth/callback?code=abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("tok"));
        assert!(!body.contains("<script>"));
    }

    #[tokio::test]
    async fn test_callback_shows_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "expires_in": 3600,
                "refresh_token": "refresh-xyz"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let response = app_for(&server.uri())
            .oneshot(get_request("/spotify/oauth/callback?code=abc&state=s"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_string(response).await;
        assert!(body.contains("refresh-xyz"));
        assert!(body.contains("SPOTIFY_REFRESH_TOKEN"));
    }

    #[tokio::test]
    async fn test_callback_without_refresh_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "access-1",
                "token_type": "Bearer",
                "expires_in": 3600
            })))
            .mount(&server)
            .await;

        let response = app_for(&server.uri())
            .oneshot(get_request("/spotify/oauth/callback?code=abc"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("No refresh token returned"));
    }

    #[tokio::test]
    async fn test_callback_exchange_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "error": "invalid_grant",
                "error_description": "Invalid authorization code"
            })))
            .mount(&server)
            .await;

        let response = app_for(&server.uri())
            .oneshot(get_request("/spotify/oauth/callback?code=expired"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_string(response).await,
            "Spotify OAuth failed: Invalid authorization code"
        );
    }
}
