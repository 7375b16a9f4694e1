// Primary extractor - native `yt-dlp` binary
//
// Asks yt-dlp for the best audio-only format and reads the resolved media URL
// from its JSON dump. Nothing is downloaded.

use async_trait::async_trait;
use serde_json::Value;

use super::errors::ResolveError;
use super::models::{watch_url, StreamMethod, StreamResult};
use super::traits::StreamStrategy;
use super::utils::{find_ytdlp, run_output_with_timeout};

/// yt-dlp invocation settings
#[derive(Debug, Clone)]
pub struct YtDlpConfig {
    /// Explicit binary path; auto-detected when absent
    pub binary: Option<String>,
    /// Hard limit for the whole subprocess
    pub timeout_seconds: u64,
    /// SOCKS5/HTTP proxy URL
    pub proxy: Option<String>,
}

impl Default for YtDlpConfig {
    fn default() -> Self {
        Self {
            binary: None,
            timeout_seconds: 10,
            proxy: None,
        }
    }
}

impl YtDlpConfig {
    pub fn with_binary(mut self, binary: Option<String>) -> Self {
        self.binary = binary;
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }
}

pub struct YtDlpStrategy {
    ytdlp_path: String,
    config: YtDlpConfig,
}

impl YtDlpStrategy {
    pub fn new(config: YtDlpConfig) -> Self {
        Self {
            ytdlp_path: find_ytdlp(config.binary.as_deref()),
            config,
        }
    }

    pub fn binary(&self) -> &str {
        &self.ytdlp_path
    }

    /// Build command arguments
    fn build_args(&self, video_id: &str) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "bestaudio".to_string(),
            "--dump-json".to_string(),
            "--flat-playlist".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            self.config.timeout_seconds.to_string(),
        ];

        if let Some(proxy) = &self.config.proxy {
            args.push("--proxy".to_string());
            args.push(proxy.clone());
        }

        args.push(watch_url(video_id));
        args
    }

    /// Map the JSON dump onto a stream result
    fn parse_json(stdout: &[u8]) -> Result<StreamResult, ResolveError> {
        let json_str = String::from_utf8_lossy(stdout);
        let json: Value = serde_json::from_str(json_str.trim())?;

        let stream_url = json["url"]
            .as_str()
            .filter(|u| !u.is_empty())
            .or_else(|| {
                json["requested_formats"][0]["url"]
                    .as_str()
                    .filter(|u| !u.is_empty())
            })
            .ok_or_else(|| {
                ResolveError::NoUsableStream("yt-dlp returned no media URL".to_string())
            })?
            .to_string();

        Ok(StreamResult {
            stream_url,
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            duration_seconds: json["duration"].as_f64().map_or(0, |d| d.max(0.0) as u64),
            thumbnail_url: json["thumbnail"].as_str().unwrap_or("").to_string(),
            method: StreamMethod::PrimaryExtractor,
        })
    }
}

#[async_trait]
impl StreamStrategy for YtDlpStrategy {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    fn method(&self) -> StreamMethod {
        StreamMethod::PrimaryExtractor
    }

    async fn resolve(&self, video_id: &str) -> Result<StreamResult, ResolveError> {
        let args = self.build_args(video_id);
        tracing::debug!("[yt-dlp] Running: {} {}", self.ytdlp_path, args.join(" "));

        let output =
            run_output_with_timeout(&self.ytdlp_path, &args, self.config.timeout_seconds).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ResolveError::from(stderr.trim().to_string()));
        }

        Self::parse_json(&output.stdout)
    }
}
