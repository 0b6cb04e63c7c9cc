use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application-specific errors with HTTP status code mappings
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Spotify authentication failed: {0}")]
    Authentication(String),

    #[error("Spotify API error: {0}")]
    SpotifyApi(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Slack signature invalid: {0}")]
    SignatureInvalid(String),

    #[error("Slack signature missing")]
    SignatureMissing,

    #[error("Slack signature expired: {0}")]
    SignatureExpired(String),

    #[error("Slack API error: {0}")]
    SlackApi(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match &self {
            AppError::Configuration(msg) => {
                tracing::error!("Configuration error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Server misconfigured")
            }
            AppError::Authentication(msg) => {
                tracing::error!("Spotify authentication failed: {}", msg);
                (StatusCode::BAD_GATEWAY, "Spotify authentication failed")
            }
            AppError::SpotifyApi(msg) => {
                tracing::error!("Spotify API error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Spotify API error")
            }
            AppError::BadRequest(msg) => {
                tracing::warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, msg.as_str())
            }
            AppError::SignatureInvalid(msg) => {
                tracing::warn!("Invalid Slack signature: {}", msg);
                (StatusCode::UNAUTHORIZED, "Invalid signature")
            }
            AppError::SignatureMissing => {
                tracing::warn!("Slack signature headers missing");
                (StatusCode::UNAUTHORIZED, "Missing signature headers")
            }
            AppError::SignatureExpired(msg) => {
                tracing::warn!("Slack signature expired: {}", msg);
                (StatusCode::UNAUTHORIZED, "Signature expired")
            }
            AppError::SlackApi(msg) => {
                tracing::error!("Slack API error: {}", msg);
                (StatusCode::BAD_GATEWAY, "Slack API error")
            }
            AppError::Internal(err) => {
                tracing::error!("Internal error: {:?}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (status, Json(json!({ "error": error_message }))).into_response()
    }
}
