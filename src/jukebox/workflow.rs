use crate::config::Config;
use crate::error::AppError;
use crate::jukebox::router::{Action, route};
use crate::slack::events::InboundEvent;
use crate::spotify::client::{SpotifyClient, Track};

pub const FAILURE_REPLY: &str = "Sorry, something went wrong while talking to Spotify.";

/// Result of a song request that reached Spotify
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added(Track),
    NotFound { query: String },
}

impl AddOutcome {
    pub fn is_added(&self) -> bool {
        matches!(self, AddOutcome::Added(_))
    }

    /// Chat reply for this outcome
    pub fn message(&self) -> String {
        match self {
            AddOutcome::Added(track) => format!(
                "Added *{}* to the jukebox playlist :notes:",
                track.display_name()
            ),
            AddOutcome::NotFound { query } => {
                format!("I couldn't find anything on Spotify for: *{}*", query)
            }
        }
    }
}

/// Find a song and append it to the jukebox playlist
///
/// # Flow
/// 1. Refresh the Spotify access token
/// 2. Search for `query` in `market`, top hit only
/// 3. Append the hit's URI to the playlist
///
/// A search without hits is `AddOutcome::NotFound`, not an error. Nothing
/// is retried.
///
/// # Errors
/// - `Authentication` if the refresh token is missing or rejected
/// - `SpotifyApi` if search or playlist update fails
pub async fn add_song(
    spotify: &SpotifyClient,
    query: &str,
    playlist_id: &str,
    market: &str,
) -> Result<AddOutcome, AppError> {
    spotify.refresh_access_token().await?;

    let Some(track) = spotify.search_track(query, market).await? else {
        tracing::info!(query = query, "No Spotify match for song request");
        return Ok(AddOutcome::NotFound {
            query: query.to_string(),
        });
    };

    spotify
        .add_track_to_playlist(playlist_id, &track.uri)
        .await?;

    tracing::info!(
        query = query,
        track_uri = %track.uri,
        track = %track.display_name(),
        "Added track to jukebox playlist"
    );

    Ok(AddOutcome::Added(track))
}

/// Carry out a routed action and produce the chat reply, if any
///
/// Workflow failures are logged here and turned into a fallback reply.
pub async fn execute(action: Action, config: &Config, spotify: &SpotifyClient) -> Option<String> {
    match action {
        Action::Ignore => None,
        Action::Reply(text) => Some(text),
        Action::AddSong { query } => {
            match add_song(
                spotify,
                &query,
                &config.spotify_playlist_id,
                &config.spotify_market,
            )
            .await
            {
                Ok(outcome) => Some(outcome.message()),
                Err(e) => {
                    tracing::error!(query = %query, error = %e, "Song request failed");
                    Some(FAILURE_REPLY.to_string())
                }
            }
        }
    }
}

/// Route an inbound event and run it to completion
pub async fn handle_event(
    event: &InboundEvent,
    config: &Config,
    spotify: &SpotifyClient,
) -> Option<String> {
    let action = route(event, config);
    tracing::debug!(channel_id = event.channel_id(), action = ?action, "Routed chat event");
    execute(action, config, spotify).await
}
