// Server configuration, read from the environment

use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Invidious-compatible instances tried in order when everything else fails
pub const DEFAULT_MIRROR_INSTANCES: &[&str] = &[
    "https://inv.nadeko.net",
    "https://invidious.nerdvpn.de",
    "https://yewtu.be",
];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// yt-dlp binary; auto-detected when absent
    pub ytdlp_path: Option<String>,
    pub extractor_timeout_secs: u64,
    pub scrape_timeout_secs: u64,
    pub mirror_timeout_secs: u64,
    pub mirror_instances: Vec<String>,
    /// SOCKS5/HTTP proxy for every outbound call
    pub proxy: Option<String>,
    /// Fill `audioUrl` on listing endpoints
    pub inline_audio_urls: bool,
    pub default_region: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            ytdlp_path: None,
            extractor_timeout_secs: 10,
            scrape_timeout_secs: 10,
            mirror_timeout_secs: 5,
            mirror_instances: DEFAULT_MIRROR_INSTANCES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            proxy: None,
            inline_audio_urls: false,
            default_region: "IN".to_string(),
        }
    }
}

impl ServerConfig {
    /// Read configuration from process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (env in production)
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let mirror_instances = match get("MIRROR_INSTANCES") {
            Some(list) => list
                .split(',')
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            None => defaults.mirror_instances,
        };

        Ok(Self {
            host: parse_or("HOST", get("HOST"), defaults.host)?,
            port: parse_or("PORT", get("PORT"), defaults.port)?,
            ytdlp_path: get("YTDLP_PATH"),
            extractor_timeout_secs: parse_timeout(
                "EXTRACTOR_TIMEOUT_SECS",
                get("EXTRACTOR_TIMEOUT_SECS"),
                defaults.extractor_timeout_secs,
            )?,
            scrape_timeout_secs: parse_timeout(
                "SCRAPE_TIMEOUT_SECS",
                get("SCRAPE_TIMEOUT_SECS"),
                defaults.scrape_timeout_secs,
            )?,
            mirror_timeout_secs: parse_timeout(
                "MIRROR_TIMEOUT_SECS",
                get("MIRROR_TIMEOUT_SECS"),
                defaults.mirror_timeout_secs,
            )?,
            mirror_instances,
            proxy: get("PROXY"),
            inline_audio_urls: match get("INLINE_AUDIO_URLS") {
                Some(v) => parse_flag("INLINE_AUDIO_URLS", &v)?,
                None => defaults.inline_audio_urls,
            },
            default_region: get("DEFAULT_REGION")
                .map(|r| r.to_uppercase())
                .unwrap_or(defaults.default_region),
        })
    }

    pub fn with_ytdlp_path(mut self, path: Option<String>) -> Self {
        self.ytdlp_path = path;
        self
    }

    pub fn with_inline_audio_urls(mut self, enabled: bool) -> Self {
        self.inline_audio_urls = enabled;
        self
    }
}

fn parse_or<T>(key: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        Some(value) => match value.parse() {
            Ok(parsed) => Ok(parsed),
            Err(e) => Err(ConfigError::InvalidValue {
                key,
                reason: e.to_string(),
                value,
            }),
        },
        None => Ok(default),
    }
}

/// Seconds, at least one
fn parse_timeout(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match parse_or(key, raw, default)? {
        0 => Err(ConfigError::InvalidValue {
            key,
            value: "0".to_string(),
            reason: "timeout must be at least 1 second".to_string(),
        }),
        secs => Ok(secs),
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
