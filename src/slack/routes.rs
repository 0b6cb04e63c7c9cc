use crate::error::AppError;
use crate::jukebox::router::{Action, route};
use crate::jukebox::workflow::{execute, handle_event};
use crate::routes::{AppState, found};
use crate::slack::events::{
    InboundEvent, MessageEvent, SlackEventRequest, SlashCommand, UrlVerificationResponse,
};
use crate::slack::oauth::build_slack_install_url;
use crate::slack::verification::check_slack_signature;
use crate::spotify::oauth::generate_state_token;
use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Json, Router,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/slack/events", post(handle_slack_events))
        .route("/slack/commands", post(handle_slash_command))
        .route("/slack/install", get(install))
        .route("/slack/oauth/callback", get(oauth_callback))
}

fn verify_request(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<(), AppError> {
    let timestamp = headers
        .get("X-Slack-Request-Timestamp")
        .and_then(|v| v.to_str().ok());
    let signature = headers
        .get("X-Slack-Signature")
        .and_then(|v| v.to_str().ok());

    check_slack_signature(&state.config.slack_signing_secret, timestamp, signature, body)
}

/// Run an event on a background task and post the reply to its channel
fn spawn_reply(state: AppState, event: InboundEvent, action: Option<Action>) {
    tokio::spawn(async move {
        let reply = match action {
            Some(action) => execute(action, &state.config, &state.spotify).await,
            None => handle_event(&event, &state.config, &state.spotify).await,
        };

        let Some(reply) = reply else {
            return;
        };

        if let Err(e) = state.slack.post_message(event.channel_id(), &reply).await {
            tracing::error!(
                channel_id = event.channel_id(),
                error = %e,
                "Failed to deliver jukebox reply"
            );
        }
    });
}

/// Handle Slack events webhook
///
/// # Endpoint
/// POST /slack/events
///
/// # Flow
/// 1. Verify request signature (HMAC-SHA256)
/// 2. Parse event payload
/// 3. Handle url_verification challenge (initial setup)
/// 4. Hand `message` events to the jukebox on a background task
///
/// Slack expects an answer within 3 seconds, so song requests are never
/// awaited here. Redeliveries (`X-Slack-Retry-Num`) are acknowledged and
/// dropped so a slow first attempt doesn't add the song twice.
///
/// # Returns
/// - 200 OK with challenge for url_verification
/// - 200 OK for everything else that passes verification
/// - 401 Unauthorized for invalid signature
/// - 400 Bad Request for invalid payload
pub async fn handle_slack_events(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    verify_request(&state, &headers, &body)?;

    if let Some(retry) = headers.get("X-Slack-Retry-Num") {
        tracing::info!(retry = ?retry, "Ignoring Slack event redelivery");
        return Ok(StatusCode::OK.into_response());
    }

    let event_request: SlackEventRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!("Failed to parse Slack event: {:?}", e);
        AppError::BadRequest(format!("Invalid JSON: {}", e))
    })?;

    match event_request {
        SlackEventRequest::UrlVerification { challenge } => {
            tracing::info!("Handling url_verification challenge");
            Ok(Json(UrlVerificationResponse { challenge }).into_response())
        }

        SlackEventRequest::EventCallback {
            team_id,
            event,
            event_id,
            ..
        } => {
            let Some(message) = MessageEvent::from_slack_event(&event) else {
                tracing::debug!(event_id = %event_id, "Ignoring unsupported event type");
                return Ok(StatusCode::OK.into_response());
            };

            tracing::debug!(
                team_id = %team_id,
                event_id = %event_id,
                channel_id = %message.channel_id,
                "Received message event"
            );

            spawn_reply(state, InboundEvent::Message(message), None);
            Ok(StatusCode::OK.into_response())
        }

        SlackEventRequest::Unsupported => Ok(StatusCode::OK.into_response()),
    }
}

/// Immediate (ephemeral) answer to a slash command
#[derive(Debug, Serialize)]
pub struct SlashCommandResponse {
    pub response_type: &'static str,
    pub text: String,
}

/// Handle Slack slash commands
///
/// # Endpoint
/// POST /slack/commands (form-encoded)
///
/// Always acknowledged right away. Usage help and "not connected" come back
/// in the acknowledgement; song requests run in the background and the
/// result is posted to the channel.
pub async fn handle_slash_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, AppError> {
    verify_request(&state, &headers, &body)?;

    let command: SlashCommand = serde_urlencoded::from_bytes(&body).map_err(|e| {
        tracing::warn!("Failed to parse slash command: {}", e);
        AppError::BadRequest(format!("Invalid slash command payload: {}", e))
    })?;

    tracing::info!(
        command = %command.command,
        channel_id = %command.channel_id,
        user_id = %command.user_id,
        "Received slash command"
    );

    let event = InboundEvent::SlashCommand(command);
    match route(&event, &state.config) {
        Action::Ignore => Ok(StatusCode::OK.into_response()),
        Action::Reply(text) => Ok(Json(SlashCommandResponse {
            response_type: "ephemeral",
            text,
        })
        .into_response()),
        action @ Action::AddSong { .. } => {
            spawn_reply(state, event, Some(action));
            Ok(StatusCode::OK.into_response())
        }
    }
}

/// Redirect to the Slack "Add to Slack" authorize page
///
/// # Endpoint
/// GET /slack/install
///
/// # Returns
/// - 302 to `https://slack.com/oauth/v2/authorize` with a fresh state
/// - 400 if `SLACK_CLIENT_ID` is not configured
pub async fn install(State(state): State<AppState>) -> Result<Response, AppError> {
    let Some(client_id) = state.config.slack_client_id.as_deref() else {
        return Ok((
            StatusCode::BAD_REQUEST,
            "Missing SLACK_CLIENT_ID. Configure it to enable Slack OAuth installation.",
        )
            .into_response());
    };

    let state_token = generate_state_token();
    let redirect_uri = state.config.slack_redirect_uri();
    let install_url = build_slack_install_url(
        client_id,
        &state.config.slack_scopes,
        Some(&redirect_uri),
        Some(&state_token),
    )?;

    tracing::info!("Redirecting to Slack install");
    Ok(found(install_url.as_str()))
}

/// Query parameters Slack appends to the OAuth redirect
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub error: Option<String>,
    pub state: Option<String>,
}

#[derive(Template, WebTemplate)]
#[template(path = "slack_oauth_complete.html")]
pub struct SlackOAuthCompleteTemplate {
    pub code: String,
}

/// Show the Slack authorization code to the operator
///
/// # Endpoint
/// GET /slack/oauth/callback?code=...&state=...
///
/// `state` is not checked against anything.
pub async fn oauth_callback(Query(params): Query<OAuthCallbackQuery>) -> Response {
    if let Some(error) = params.error.filter(|e| !e.is_empty()) {
        tracing::warn!(error = %error, "Slack OAuth denied");
        return (
            StatusCode::BAD_REQUEST,
            format!("Slack OAuth failed: {}", error),
        )
            .into_response();
    }

    let Some(code) = params.code.filter(|c| !c.is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Missing Slack OAuth code.").into_response();
    };

    tracing::info!("Slack OAuth code received");

    SlackOAuthCompleteTemplate { code }.into_response()
}
