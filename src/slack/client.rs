use crate::error::AppError;
use serde::{Deserialize, Serialize};

/// Minimal Slack Web API client used to post bot replies
#[derive(Debug, Clone)]
pub struct SlackClient {
    http: reqwest::Client,
    api_base_url: String,
    bot_token: String,
}

#[derive(Debug, Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

/// Slack API response envelope (`ok` + optional `error`)
#[derive(Debug, Deserialize)]
struct SlackApiResponse {
    ok: bool,
    error: Option<String>,
}

impl SlackClient {
    pub fn new(api_base_url: impl Into<String>, bot_token: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base_url: api_base_url.into().trim_end_matches('/').to_string(),
            bot_token: bot_token.into(),
        }
    }

    /// Post a message to a channel as the bot
    ///
    /// Calls Slack's `chat.postMessage` API.
    ///
    /// # Errors
    /// - `SlackApi` if the request fails or Slack answers with `ok: false`
    pub async fn post_message(&self, channel_id: &str, text: &str) -> Result<(), AppError> {
        tracing::debug!(channel_id = channel_id, "Posting Slack message");

        let url = format!("{}/chat.postMessage", self.api_base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.bot_token)
            .json(&PostMessageRequest {
                channel: channel_id,
                text,
            })
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to call Slack API: {:?}", e);
                AppError::SlackApi(format!("Failed to call chat.postMessage: {}", e))
            })?;

        let api_response = response.json::<SlackApiResponse>().await.map_err(|e| {
            tracing::error!("Failed to parse Slack API response: {:?}", e);
            AppError::SlackApi(format!("Failed to parse response: {}", e))
        })?;

        if !api_response.ok {
            let error_msg = api_response
                .error
                .unwrap_or_else(|| "Unknown error".to_string());
            tracing::error!(
                channel_id = channel_id,
                error = error_msg,
                "Slack API returned error"
            );
            return Err(AppError::SlackApi(format!(
                "chat.postMessage failed: {}",
                error_msg
            )));
        }

        Ok(())
    }
}
