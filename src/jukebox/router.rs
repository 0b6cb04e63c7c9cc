use crate::config::Config;
use crate::jukebox::parser::extract_song_query;
use crate::slack::events::{InboundEvent, MessageEvent, SlashCommand};

pub const NOT_CONNECTED_REPLY: &str =
    "Spotify account is not connected yet. Ask an admin to connect it from the app home page.";

/// What to do with an inbound chat event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Not for us (wrong channel, not a song request, edits, joins...)
    Ignore,
    /// Answer right away without touching Spotify
    Reply(String),
    /// Look the song up and append it to the playlist
    AddSong { query: String },
}

/// Decide how to handle an event. Pure: no I/O, no clock.
pub fn route(event: &InboundEvent, config: &Config) -> Action {
    match event {
        InboundEvent::Message(message) => route_message(message, config),
        InboundEvent::SlashCommand(command) => route_command(command, config),
    }
}

fn route_message(message: &MessageEvent, config: &Config) -> Action {
    // Our own replies come back through the same subscription
    if message.subtype.is_some() || message.is_bot_message() {
        return Action::Ignore;
    }

    let Some(text) = message.text.as_deref().filter(|t| !t.is_empty()) else {
        return Action::Ignore;
    };

    if !channel_allowed(&message.channel_id, config) {
        return Action::Ignore;
    }

    let Some(query) = extract_song_query(text, &config.jukebox_command_prefix) else {
        return Action::Ignore;
    };

    if !config.spotify_connected() {
        return Action::Reply(NOT_CONNECTED_REPLY.to_string());
    }

    Action::AddSong { query }
}

fn route_command(command: &SlashCommand, config: &Config) -> Action {
    let registered = config
        .slash_commands()
        .iter()
        .any(|name| name.eq_ignore_ascii_case(&command.command));
    if !registered {
        return Action::Ignore;
    }

    if !channel_allowed(&command.channel_id, config) {
        return Action::Ignore;
    }

    let query = command.text.trim();
    if query.is_empty() {
        return Action::Reply(usage_reply(&command.command));
    }

    if !config.spotify_connected() {
        return Action::Reply(NOT_CONNECTED_REPLY.to_string());
    }

    Action::AddSong {
        query: query.to_string(),
    }
}

fn channel_allowed(channel_id: &str, config: &Config) -> bool {
    config
        .jukebox_channel_id
        .as_deref()
        .is_none_or(|allowed| allowed == channel_id)
}

pub fn usage_reply(command: &str) -> String {
    format!("Usage: `{command} <song name>`, for example `{command} Bohemian Rhapsody Queen`")
}
