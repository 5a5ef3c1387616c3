//! Video identity extraction from links

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

use crate::error::{VideoError, VideoResult};

const VIDEO_ID_PATTERN: &str = r"^[A-Za-z0-9_-]{11}$";

static VIDEO_ID_RE: LazyLock<Option<Regex>> = LazyLock::new(|| Regex::new(VIDEO_ID_PATTERN).ok());

/// Path prefixes that carry the id as the next path segment
const ID_PATH_PREFIXES: &[&str] = &["embed", "shorts", "live", "v"];

fn is_video_id(candidate: &str) -> bool {
    if let Some(re) = VIDEO_ID_RE.as_ref() {
        return re.is_match(candidate);
    }
    candidate.len() == 11
        && candidate
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_youtube_host(host: &str) -> bool {
    let host = host.trim_start_matches("www.").trim_start_matches("m.");
    host == "youtube.com" || host == "youtube-nocookie.com" || host == "music.youtube.com"
}

/// Canonical 11-character id of a YouTube link (or a bare id)
pub fn extract_video_id(input: &str) -> VideoResult<String> {
    let input = input.trim();
    if input.is_empty() {
        return Err(VideoError::InvalidInput("empty link".to_string()));
    }

    if is_video_id(input) {
        return Ok(input.to_string());
    }

    let with_scheme = if input.contains("://") {
        input.to_string()
    } else {
        format!("https://{}", input)
    };

    let url = Url::parse(&with_scheme)
        .map_err(|_| VideoError::InvalidInput(input.to_string()))?;
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let mut segments = url.path_segments().into_iter().flatten().filter(|s| !s.is_empty());

    let candidate = if host == "youtu.be" || host == "www.youtu.be" {
        segments.next().map(String::from)
    } else if is_youtube_host(&host) {
        match segments.next() {
            Some("watch") => url
                .query_pairs()
                .find(|(k, _)| k == "v")
                .map(|(_, v)| v.into_owned()),
            Some(prefix) if ID_PATH_PREFIXES.contains(&prefix) => segments.next().map(String::from),
            _ => None,
        }
    } else {
        None
    };

    match candidate {
        Some(id) if is_video_id(&id) => Ok(id),
        _ => Err(VideoError::InvalidInput(input.to_string())),
    }
}

/// Canonical watch link for an id
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}
