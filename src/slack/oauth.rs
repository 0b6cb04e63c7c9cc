//! Slack "Add to Slack" install link.
//!
//! The callback only displays the authorization code; exchanging it for a
//! bot token is left to the operator.

use crate::error::AppError;
use reqwest::Url;

pub const SLACK_AUTHORIZE_URL: &str = "https://slack.com/oauth/v2/authorize";

/// Build the Slack OAuth v2 authorize URL
///
/// # Arguments
/// * `client_id` - Slack app client ID
/// * `scopes` - Comma-separated bot scopes, passed through as-is
/// * `redirect_uri` - Omitted from the URL when None
/// * `state` - Opaque value echoed back on the callback; omitted when None
pub fn build_slack_install_url(
    client_id: &str,
    scopes: &str,
    redirect_uri: Option<&str>,
    state: Option<&str>,
) -> Result<Url, AppError> {
    let mut url = Url::parse(SLACK_AUTHORIZE_URL).map_err(|e| AppError::Internal(e.into()))?;

    {
        let mut query = url.query_pairs_mut();
        query.append_pair("client_id", client_id);
        query.append_pair("scope", scopes);

        if let Some(redirect_uri) = redirect_uri {
            query.append_pair("redirect_uri", redirect_uri);
        }

        if let Some(state) = state {
            query.append_pair("state", state);
        }
    }

    Ok(url)
}
