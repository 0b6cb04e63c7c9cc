use crate::error::AppError;
use serde::Deserialize;

/// Netlify mounts the serverless function under this path, so OAuth
/// redirects derived from the deployment `URL` must include it.
const NETLIFY_FUNCTION_PATH: &str = "/.netlify/functions/app";

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    // Required credentials; empty values are reported by `validate`
    #[serde(default)]
    pub slack_bot_token: String,
    #[serde(default)]
    pub slack_signing_secret: String,
    #[serde(default)]
    pub spotify_client_id: String,
    #[serde(default)]
    pub spotify_client_secret: String,
    #[serde(default)]
    pub spotify_playlist_id: String,

    /// Absent until an operator completes `/spotify/login` and stores the
    /// token shown on the callback page.
    pub spotify_refresh_token: Option<String>,

    #[serde(default = "default_command_prefix")]
    pub jukebox_command_prefix: String,
    pub jukebox_channel_id: Option<String>,
    #[serde(default = "default_slash_command")]
    pub jukebox_slash_command: String,

    #[serde(default = "default_market")]
    pub spotify_market: String,

    pub slack_client_id: Option<String>,
    #[serde(default = "default_slack_scopes")]
    pub slack_scopes: String,
    pub slack_oauth_redirect_uri: Option<String>,

    /// Public deployment URL, set by Netlify.
    pub url: Option<String>,

    #[serde(default = "default_spotify_redirect_uri")]
    pub spotify_redirect_uri: String,

    #[serde(default = "default_spotify_api_base_url")]
    pub spotify_api_base_url: String,
    #[serde(default = "default_spotify_accounts_base_url")]
    pub spotify_accounts_base_url: String,
    #[serde(default = "default_slack_api_base_url")]
    pub slack_api_base_url: String,

    #[serde(default = "default_rust_log")]
    pub rust_log: String,
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_command_prefix() -> String {
    "play".to_string()
}

fn default_slash_command() -> String {
    "/jukebox".to_string()
}

fn default_market() -> String {
    "US".to_string()
}

fn default_slack_scopes() -> String {
    "chat:write,channels:history".to_string()
}

fn default_spotify_redirect_uri() -> String {
    "http://localhost:3000/spotify/oauth/callback".to_string()
}

fn default_spotify_api_base_url() -> String {
    "https://api.spotify.com/v1".to_string()
}

fn default_spotify_accounts_base_url() -> String {
    "https://accounts.spotify.com".to_string()
}

fn default_slack_api_base_url() -> String {
    "https://slack.com/api".to_string()
}

fn default_rust_log() -> String {
    "info,slack_jukebox=debug".to_string()
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| AppError::Configuration(format!("Failed to load config: {}", e)))?;
        config.validate()
    }

    /// Load configuration from an explicit set of variables instead of the
    /// process environment. Keys use the usual upper-case env var names.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars.into_iter().map(|(k, v)| (k.into(), v.into()));
        let config = envy::from_iter::<_, Config>(vars)
            .map_err(|e| AppError::Configuration(format!("Failed to load config: {}", e)))?;
        config.validate()
    }

    fn validate(mut self) -> Result<Self, AppError> {
        let required = [
            ("SLACK_BOT_TOKEN", &self.slack_bot_token),
            ("SLACK_SIGNING_SECRET", &self.slack_signing_secret),
            ("SPOTIFY_CLIENT_ID", &self.spotify_client_id),
            ("SPOTIFY_CLIENT_SECRET", &self.spotify_client_secret),
            ("SPOTIFY_PLAYLIST_ID", &self.spotify_playlist_id),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(AppError::Configuration(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        // An empty variable behaves like an unset one
        self.spotify_refresh_token = non_empty(self.spotify_refresh_token);
        self.jukebox_channel_id = non_empty(self.jukebox_channel_id);
        self.slack_client_id = non_empty(self.slack_client_id);
        self.slack_oauth_redirect_uri = non_empty(self.slack_oauth_redirect_uri);
        self.url = non_empty(self.url);

        or_default(&mut self.jukebox_command_prefix, default_command_prefix);
        or_default(&mut self.jukebox_slash_command, default_slash_command);
        or_default(&mut self.spotify_market, default_market);
        or_default(&mut self.slack_scopes, default_slack_scopes);
        or_default(&mut self.spotify_redirect_uri, default_spotify_redirect_uri);

        Ok(self)
    }

    /// Redirect URI registered with the Slack app.
    ///
    /// An explicit `SLACK_OAUTH_REDIRECT_URI` wins, then the Netlify
    /// deployment URL, then the local development callback.
    pub fn slack_redirect_uri(&self) -> String {
        if let Some(uri) = &self.slack_oauth_redirect_uri {
            return uri.clone();
        }

        match &self.url {
            Some(base) => format!(
                "{}{}/slack/oauth/callback",
                base.trim_end_matches('/'),
                NETLIFY_FUNCTION_PATH
            ),
            None => "http://localhost:3000/slack/oauth/callback".to_string(),
        }
    }

    /// Slash commands this app answers to: the fixed default command and the
    /// command prefix, forced to start with `/`.
    pub fn slash_commands(&self) -> [String; 2] {
        let prefix = self.jukebox_command_prefix.trim();
        let prefix_command = if prefix.starts_with('/') {
            prefix.to_string()
        } else {
            format!("/{}", prefix)
        };

        [self.jukebox_slash_command.clone(), prefix_command]
    }

    pub fn spotify_connected(&self) -> bool {
        self.spotify_refresh_token.is_some()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn or_default(value: &mut String, default: fn() -> String) {
    if value.trim().is_empty() {
        *value = default();
    }
}
