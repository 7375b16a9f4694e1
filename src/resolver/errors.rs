// Error types for stream resolution strategies

use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    /// yt-dlp binary could not be started
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Network error, timeout or non-2xx answer from an upstream service
    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    /// Upstream answered but offered nothing playable
    #[error("No usable stream: {0}")]
    NoUsableStream(String),

    /// Response body could not be decoded
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Subprocess failed for an unclassified reason
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

// Classifies raw tool output (stderr) into a variant
//
// yt-dlp echoes the video id and URL, so bare status codes are never
// matched; content verdicts are checked before transport ones.
impl From<String> for ResolveError {
    fn from(s: String) -> Self {
        let lower = s.to_lowercase();

        if lower.contains("requested format is not available")
            || lower.contains("video unavailable")
            || lower.contains("private video")
        {
            return Self::NoUsableStream(s);
        }

        if lower.contains("no such file") || lower.contains("command not found") {
            return Self::ToolNotFound(s);
        }

        if lower.contains("timeout") || lower.contains("timed out") {
            return Self::UpstreamUnavailable(s);
        }

        if lower.contains("http error 429")
            || lower.contains("http error 403")
            || lower.contains("unable to download webpage")
            || lower.contains("connection refused")
            || lower.contains("connection reset")
        {
            return Self::UpstreamUnavailable(s);
        }

        if lower.contains("json") || lower.contains("parse") {
            return Self::ParseError(s);
        }

        Self::ExecutionError(s)
    }
}

impl From<reqwest::Error> for ResolveError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Self::ParseError(e.to_string())
        } else {
            Self::UpstreamUnavailable(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ResolveError {
    fn from(e: serde_json::Error) -> Self {
        Self::ParseError(format!("Invalid JSON: {}", e))
    }
}
