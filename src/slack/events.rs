use serde::{Deserialize, Serialize};

/// Top-level Slack Events API request
///
/// Slack sends different types of events:
/// - `url_verification`: Initial challenge when configuring the endpoint
/// - `event_callback`: Actual events like channel messages
///
/// Anything else deserializes to `Unsupported` and is acknowledged without
/// further processing.
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum SlackEventRequest {
    #[serde(rename = "url_verification")]
    UrlVerification { challenge: String },

    #[serde(rename = "event_callback")]
    EventCallback {
        #[serde(default)]
        team_id: String,
        event: SlackEvent,
        #[serde(default)]
        event_id: String,
        #[serde(default)]
        event_time: i64,
    },

    #[serde(other)]
    Unsupported,
}

/// Slack event types we handle
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum SlackEvent {
    #[serde(rename = "message")]
    Message {
        #[serde(default)]
        channel: String,
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        subtype: Option<String>,
        #[serde(default)]
        user: Option<String>,
        #[serde(default)]
        bot_id: Option<String>,
    },

    #[serde(other)]
    Unsupported,
}

/// Response for url_verification challenge
#[derive(Debug, Serialize)]
pub struct UrlVerificationResponse {
    pub challenge: String,
}

/// A channel message as seen by the jukebox
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub text: Option<String>,
    /// Set for edits, joins, bot messages and similar non-user posts
    pub subtype: Option<String>,
    pub user_id: Option<String>,
    /// Present on anything posted with a bot token, including our own replies
    pub bot_id: Option<String>,
}

impl MessageEvent {
    pub fn is_bot_message(&self) -> bool {
        self.bot_id.is_some() || self.subtype.as_deref() == Some("bot_message")
    }

    /// Extract the message fields from an event callback
    pub fn from_slack_event(event: &SlackEvent) -> Option<Self> {
        match event {
            SlackEvent::Message {
                channel,
                text,
                subtype,
                user,
                bot_id,
            } => Some(MessageEvent {
                channel_id: channel.clone(),
                text: text.clone(),
                subtype: subtype.clone(),
                user_id: user.clone(),
                bot_id: bot_id.clone(),
            }),
            SlackEvent::Unsupported => None,
        }
    }
}

/// Slack slash command payload (form-encoded)
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SlashCommand {
    /// The command, including the leading slash (e.g. `/jukebox`)
    pub command: String,
    pub channel_id: String,
    pub user_id: String,
    /// Text after the command
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub team_id: String,
    #[serde(default)]
    pub response_url: String,
}

/// Inbound chat event, already narrowed to the two shapes the router knows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    Message(MessageEvent),
    SlashCommand(SlashCommand),
}

impl InboundEvent {
    pub fn channel_id(&self) -> &str {
        match self {
            InboundEvent::Message(message) => &message.channel_id,
            InboundEvent::SlashCommand(command) => &command.channel_id,
        }
    }
}
