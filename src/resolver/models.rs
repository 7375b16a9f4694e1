// Data models for stream resolution

use serde::{Deserialize, Serialize};
use std::fmt;

use super::diagnostics::BlockingReason;

/// Which strategy produced a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamMethod {
    /// yt-dlp with best-audio format selection
    PrimaryExtractor,
    /// `ytInitialPlayerResponse` scraped from the watch page
    PlayerPageScrape,
    /// Invidious-compatible mirror instance
    MirrorApi,
}

impl fmt::Display for StreamMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PrimaryExtractor => write!(f, "primary_extractor"),
            Self::PlayerPageScrape => write!(f, "player_page_scrape"),
            Self::MirrorApi => write!(f, "mirror_api"),
        }
    }
}

/// A playable audio stream for one video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamResult {
    pub stream_url: String,
    pub title: String,
    pub duration_seconds: u64,
    pub thumbnail_url: String,
    pub method: StreamMethod,
}

/// Every strategy failed for a video
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionFailure {
    /// Methods tried, in attempt order
    pub attempted: Vec<StreamMethod>,
    pub last_error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<BlockingReason>,
}

impl fmt::Display for ResolutionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no stream after {} attempt(s)", self.attempted.len())?;

        if !self.last_error.is_empty() {
            write!(f, ": {}", self.last_error)?;
        }

        if let Some(reason) = &self.reason {
            write!(f, " ({})", reason.description())?;
        }

        Ok(())
    }
}

/// Canonical watch page URL for a video identifier
pub fn watch_url(video_id: &str) -> String {
    format!("https://www.youtube.com/watch?v={}", video_id)
}

/// Thumbnail URL derived from the identifier alone
pub fn default_thumbnail_url(video_id: &str) -> String {
    format!("https://i.ytimg.com/vi/{}/hqdefault.jpg", video_id)
}
