// Mirror API fallback - Invidious-compatible instances
//
// Last resort. Instances are tried once each, in configured order; the first
// one that lists a progressive stream wins.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use super::errors::ResolveError;
use super::models::{StreamMethod, StreamResult};
use super::traits::{HttpFetcher, StreamStrategy};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct MirrorVideo {
    title: Option<String>,
    length_seconds: Option<u64>,
    format_streams: Vec<MirrorStream>,
    video_thumbnails: Vec<MirrorThumbnail>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MirrorStream {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct MirrorThumbnail {
    url: String,
}

pub struct MirrorStrategy {
    fetcher: Arc<dyn HttpFetcher>,
    instances: Vec<String>,
    timeout: Duration,
}

impl MirrorStrategy {
    pub fn new(fetcher: Arc<dyn HttpFetcher>, instances: Vec<String>, timeout: Duration) -> Self {
        Self {
            fetcher,
            instances,
            timeout,
        }
    }

    pub fn instances(&self) -> &[String] {
        &self.instances
    }

    fn video_url(base: &str, video_id: &str) -> String {
        format!("{}/api/v1/videos/{}", base.trim_end_matches('/'), video_id)
    }

    /// Map one instance's answer onto a stream result
    fn parse_response(body: &str) -> Result<StreamResult, ResolveError> {
        let video: MirrorVideo = serde_json::from_str(body)?;

        let stream_url = video
            .format_streams
            .first()
            .map(|s| s.url.as_str())
            .filter(|u| !u.is_empty())
            .ok_or_else(|| ResolveError::NoUsableStream("empty formatStreams".to_string()))?
            .to_string();

        // Highest resolution is listed last
        let thumbnail_url = video
            .video_thumbnails
            .last()
            .map(|t| t.url.clone())
            .unwrap_or_default();

        Ok(StreamResult {
            stream_url,
            title: video.title.unwrap_or_else(|| "Unknown".to_string()),
            duration_seconds: video.length_seconds.unwrap_or(0),
            thumbnail_url,
            method: StreamMethod::MirrorApi,
        })
    }
}

#[async_trait]
impl StreamStrategy for MirrorStrategy {
    fn name(&self) -> &'static str {
        "mirror"
    }

    fn method(&self) -> StreamMethod {
        StreamMethod::MirrorApi
    }

    async fn resolve(&self, video_id: &str) -> Result<StreamResult, ResolveError> {
        let mut last_error =
            ResolveError::NoUsableStream("no mirror instances configured".to_string());

        for base in &self.instances {
            let url = Self::video_url(base, video_id);
            tracing::debug!("[Mirror] Trying instance: {}", base);

            let attempt = match self.fetcher.get_text(&url, self.timeout).await {
                Ok(body) => Self::parse_response(&body),
                Err(e) => Err(e),
            };

            match attempt {
                Ok(result) => {
                    tracing::info!("[Mirror] ✓ Stream found on {}", base);
                    return Ok(result);
                }
                Err(e) => {
                    tracing::debug!("[Mirror] ✗ {} skipped: {}", base, e);
                    last_error = e;
                }
            }
        }

        Err(last_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Answers by URL prefix; anything unknown is a connection error
    struct ScriptedMirrors {
        answers: Vec<(&'static str, &'static str)>,
        requested: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl HttpFetcher for ScriptedMirrors {
        async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, ResolveError> {
            assert_eq!(timeout, Duration::from_secs(5));
            self.requested.lock().unwrap().push(url.to_string());
            self.answers
                .iter()
                .find(|(prefix, _)| url.starts_with(prefix))
                .map(|(_, body)| body.to_string())
                .ok_or_else(|| ResolveError::UpstreamUnavailable(format!("connection refused: {}", url)))
        }
    }

    fn mirrors(answers: Vec<(&'static str, &'static str)>) -> Arc<ScriptedMirrors> {
        Arc::new(ScriptedMirrors {
            answers,
            requested: Mutex::new(Vec::new()),
        })
    }

    fn strategy(fetcher: Arc<ScriptedMirrors>, instances: &[&str]) -> MirrorStrategy {
        MirrorStrategy::new(
            fetcher,
            instances.iter().map(|s| s.to_string()).collect(),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_skips_failing_instances() {
        let fetcher = mirrors(vec![(
            "https://three.example",
            r#"{"formatStreams":[{"url":"X"}],"videoThumbnails":[{"url":"A"},{"url":"B"}]}"#,
        )]);
        let strategy = strategy(
            fetcher.clone(),
            &["https://one.example", "https://two.example/", "https://three.example"],
        );

        let result = strategy.resolve("vid").await.unwrap();

        assert_eq!(result.stream_url, "X");
        assert_eq!(result.thumbnail_url, "B");
        assert_eq!(result.method, StreamMethod::MirrorApi);
        assert_eq!(
            *fetcher.requested.lock().unwrap(),
            vec![
                "https://one.example/api/v1/videos/vid",
                "https://two.example/api/v1/videos/vid",
                "https://three.example/api/v1/videos/vid",
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_streams_and_garbage_are_skipped() {
        let fetcher = mirrors(vec![
            ("https://empty.example", r#"{"formatStreams":[]}"#),
            ("https://garbage.example", "<html>502 Bad Gateway</html>"),
            (
                "https://good.example",
                r#"{"title":"Song","lengthSeconds":180,"formatStreams":[{"url":"first"},{"url":"second"}]}"#,
            ),
        ]);
        let strategy = strategy(
            fetcher,
            &["https://empty.example", "https://garbage.example", "https://good.example"],
        );

        let result = strategy.resolve("vid").await.unwrap();

        assert_eq!(result.stream_url, "first");
        assert_eq!(result.title, "Song");
        assert_eq!(result.duration_seconds, 180);
        assert_eq!(result.thumbnail_url, "");
    }

    #[tokio::test]
    async fn test_all_instances_failing_reports_last_error() {
        let fetcher = mirrors(vec![("https://empty.example", r#"{"formatStreams":[]}"#)]);
        let strategy = strategy(fetcher, &["https://down.example", "https://empty.example"]);

        let err = strategy.resolve("vid").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoUsableStream(_)));
    }

    #[tokio::test]
    async fn test_no_instances() {
        let strategy = strategy(mirrors(vec![]), &[]);
        assert!(strategy.resolve("vid").await.is_err());
    }
}
