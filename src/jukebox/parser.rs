use regex::Regex;

/// Extract the song query from a chat message
///
/// A song request is the command prefix at the very start of the message,
/// followed by at least one whitespace character and the search text. The
/// prefix matches case-insensitively and is taken literally, so prefixes
/// such as `+1` or `play?` are safe.
///
/// # Arguments
/// * `text` - Raw message text
/// * `prefix` - Configured command prefix (e.g. `play`)
///
/// # Returns
/// The trimmed query, or None if the message is not a song request or the
/// query is blank
///
/// # Examples
/// ```
/// use slack_jukebox::jukebox::parser::extract_song_query;
///
/// assert_eq!(
///     extract_song_query("PLAY Numb Linkin Park", "play"),
///     Some("Numb Linkin Park".to_string())
/// );
/// assert_eq!(extract_song_query("playfoo", "play"), None);
/// ```
pub fn extract_song_query(text: &str, prefix: &str) -> Option<String> {
    let normalized = text.trim();
    if normalized.is_empty() {
        return None;
    }

    let pattern = Regex::new(&format!(r"(?i)^{}\s+", regex::escape(prefix))).ok()?;
    let matched = pattern.find(normalized)?;

    let query = normalized[matched.end()..].trim();
    if query.is_empty() {
        return None;
    }

    Some(query.to_string())
}
