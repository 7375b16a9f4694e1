// Player-page scrape - reads `ytInitialPlayerResponse` from the watch page
//
// The watch page embeds the player response as a JS assignment. We find the
// marker, cut the balanced JSON object out of the page, and pick the highest
// bitrate audio-only stream that already carries a plain URL (ciphered
// entries only have `signatureCipher` and are skipped).

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use super::errors::ResolveError;
use super::models::{default_thumbnail_url, watch_url, StreamMethod, StreamResult};
use super::traits::{HttpFetcher, StreamStrategy};

lazy_static! {
    static ref PLAYER_RESPONSE_RE: Regex =
        Regex::new(r"ytInitialPlayerResponse\s*=\s*\{").expect("valid marker regex");
}

/// Audio-only entry from `streamingData`
#[derive(Debug, Clone, PartialEq)]
pub struct AudioCandidate {
    pub url: String,
    pub mime_type: String,
    pub bitrate: u64,
}

pub struct PlayerPageStrategy {
    fetcher: Arc<dyn HttpFetcher>,
    timeout: Duration,
}

impl PlayerPageStrategy {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, timeout: Duration) -> Self {
        Self { fetcher, timeout }
    }
}

/// Cut the player response JSON text out of a watch page
///
/// Returns `None` when the marker is missing or the object never closes.
pub fn extract_player_response(html: &str) -> Option<&str> {
    let found = PLAYER_RESPONSE_RE.find(html)?;
    let start = found.end() - 1;
    let bytes = html.as_bytes();

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&html[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Audio-only entries with a direct URL, non-adaptive list first
pub fn audio_candidates(player_response: &Value) -> Vec<AudioCandidate> {
    let streaming = &player_response["streamingData"];

    ["formats", "adaptiveFormats"]
        .iter()
        .filter_map(|key| streaming[*key].as_array())
        .flatten()
        .filter_map(|f| {
            let mime_type = f["mimeType"].as_str()?;
            if !mime_type.starts_with("audio/") {
                return None;
            }
            let url = f["url"].as_str().filter(|u| !u.is_empty())?;
            Some(AudioCandidate {
                url: url.to_string(),
                mime_type: mime_type.to_string(),
                bitrate: f["bitrate"].as_u64().unwrap_or(0),
            })
        })
        .collect()
}

/// Highest bitrate wins; the first of equal maxima is kept
pub fn select_best_audio(candidates: &[AudioCandidate]) -> Option<&AudioCandidate> {
    candidates.iter().fold(None, |best, c| match best {
        Some(b) if b.bitrate >= c.bitrate => Some(b),
        _ => Some(c),
    })
}

fn length_seconds(details: &Value) -> u64 {
    match &details["lengthSeconds"] {
        Value::String(s) => s.parse().unwrap_or(0),
        other => other.as_u64().unwrap_or(0),
    }
}

/// Build a stream result from a full watch page
pub fn parse_watch_page(html: &str, video_id: &str) -> Result<StreamResult, ResolveError> {
    let raw = extract_player_response(html).ok_or_else(|| {
        ResolveError::NoUsableStream("ytInitialPlayerResponse not found in page".to_string())
    })?;
    let player_response: Value = serde_json::from_str(raw)?;

    let candidates = audio_candidates(&player_response);
    let best = select_best_audio(&candidates).ok_or_else(|| {
        ResolveError::NoUsableStream("no audio-only format with a direct URL".to_string())
    })?;

    tracing::debug!(
        "[PlayerPage] Picked {} at {} bps out of {} candidates for {}",
        best.mime_type,
        best.bitrate,
        candidates.len(),
        video_id
    );

    let details = &player_response["videoDetails"];

    Ok(StreamResult {
        stream_url: best.url.clone(),
        title: details["title"].as_str().unwrap_or("Unknown").to_string(),
        duration_seconds: length_seconds(details),
        thumbnail_url: default_thumbnail_url(video_id),
        method: StreamMethod::PlayerPageScrape,
    })
}

#[async_trait]
impl StreamStrategy for PlayerPageStrategy {
    fn name(&self) -> &'static str {
        "player-page"
    }

    fn method(&self) -> StreamMethod {
        StreamMethod::PlayerPageScrape
    }

    async fn resolve(&self, video_id: &str) -> Result<StreamResult, ResolveError> {
        let html = self.fetcher.get_text(&watch_url(video_id), self.timeout).await?;
        tracing::debug!("[PlayerPage] Fetched {} bytes for {}", html.len(), video_id);
        parse_watch_page(&html, video_id)
    }
}
