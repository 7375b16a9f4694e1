// Blocking diagnostics - explains why a strategy could not get a stream
//
// Error text from yt-dlp, the watch page and mirrors is sniffed for known
// patterns. The result only feeds log lines and the failure payload; it never
// changes which strategy runs next.

use serde::{Deserialize, Serialize};

/// Reasons why upstream refused to hand out a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockingReason {
    /// HTTP 403 Forbidden
    Http403Forbidden,

    /// 429 or similar throttling
    RateLimited,

    /// Bot check / captcha
    BotDetection,

    /// Login required to confirm age
    AgeRestricted,

    /// Not available in the server's country
    GeoBlocked,

    PrivateVideo,

    /// Deleted, removed or never existed
    VideoUnavailable,

    /// Connection refused, timeout, unreachable host
    NetworkTimeout,

    Unknown,
}

impl BlockingReason {
    /// Check if a different strategy or mirror has a chance to succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::PrivateVideo | Self::VideoUnavailable)
    }

    /// Human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Http403Forbidden => "Access denied (HTTP 403)",
            Self::RateLimited => "Rate limited by upstream",
            Self::BotDetection => "Bot detection triggered",
            Self::AgeRestricted => "Age-restricted content",
            Self::GeoBlocked => "Geographic restriction",
            Self::PrivateVideo => "Private video",
            Self::VideoUnavailable => "Video unavailable",
            Self::NetworkTimeout => "Network timeout or unreachable upstream",
            Self::Unknown => "Unknown reason",
        }
    }
}

/// Analyze error message and return blocking reason
pub fn diagnose_error(error: &str) -> Option<BlockingReason> {
    if error.trim().is_empty() {
        return None;
    }

    let lower = error.to_lowercase();

    if lower.contains("age-restricted")
        || lower.contains("sign in to confirm your age")
        || lower.contains("age_verification")
    {
        return Some(BlockingReason::AgeRestricted);
    }

    if lower.contains("private video") || lower.contains("video is private") {
        return Some(BlockingReason::PrivateVideo);
    }

    if lower.contains("video unavailable")
        || lower.contains("video has been removed")
        || lower.contains("no longer available")
    {
        return Some(BlockingReason::VideoUnavailable);
    }

    if lower.contains("not available in your country") || lower.contains("blocked in your country") {
        return Some(BlockingReason::GeoBlocked);
    }

    if lower.contains("http error 429") || lower.contains("rate limit") || lower.contains("too many requests") {
        return Some(BlockingReason::RateLimited);
    }

    if lower.contains("not a bot")
        || lower.contains("captcha")
        || lower.contains("unusual traffic")
    {
        return Some(BlockingReason::BotDetection);
    }

    if lower.contains("http error 403") || lower.contains("forbidden") {
        return Some(BlockingReason::Http403Forbidden);
    }

    if lower.contains("timeout")
        || lower.contains("timed out")
        || lower.contains("connection refused")
        || lower.contains("network unreachable")
        || lower.contains("error sending request")
    {
        return Some(BlockingReason::NetworkTimeout);
    }

    Some(BlockingReason::Unknown)
}
