// Helper functions shared by the strategies

use async_trait::async_trait;
use std::process::{Command as StdCommand, Output, Stdio};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;

use super::errors::ResolveError;
use super::traits::HttpFetcher;

/// Desktop Chrome UA; the watch page serves a stripped document to unknown agents
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36";

/// Run command with timeout, collecting stdout and stderr
///
/// The child is killed when the deadline passes.
pub async fn run_output_with_timeout(
    program: &str,
    args: &[String],
    timeout_secs: u64,
) -> Result<Output, ResolveError> {
    let mut child = TokioCommand::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                ResolveError::ToolNotFound(format!("{}: {}", program, e))
            }
            _ => ResolveError::ExecutionError(format!("Failed to start {}: {}", program, e)),
        })?;

    let mut stdout_pipe = child.stdout.take().ok_or_else(|| {
        ResolveError::ExecutionError(format!("Failed to capture stdout from {}", program))
    })?;
    let mut stderr_pipe = child.stderr.take().ok_or_else(|| {
        ResolveError::ExecutionError(format!("Failed to capture stderr from {}", program))
    })?;

    let stdout_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stdout_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });
    let stderr_task = tokio::spawn(async move {
        let mut buf = Vec::new();
        stderr_pipe.read_to_end(&mut buf).await.map(|_| buf)
    });

    match timeout(Duration::from_secs(timeout_secs), child.wait()).await {
        Ok(status) => {
            let status = status.map_err(|e| {
                ResolveError::ExecutionError(format!("Failed to wait for {}: {}", program, e))
            })?;
            let stdout = join_pipe(stdout_task, "stdout").await?;
            let stderr = join_pipe(stderr_task, "stderr").await?;
            Ok(Output { status, stdout, stderr })
        }
        Err(_) => {
            let _ = child.kill().await;
            stdout_task.abort();
            stderr_task.abort();
            Err(ResolveError::UpstreamUnavailable(format!(
                "{} timed out after {}s",
                program, timeout_secs
            )))
        }
    }
}

async fn join_pipe(
    task: tokio::task::JoinHandle<std::io::Result<Vec<u8>>>,
    label: &str,
) -> Result<Vec<u8>, ResolveError> {
    task.await
        .map_err(|e| ResolveError::ExecutionError(format!("{} task failed: {}", label, e)))?
        .map_err(|e| ResolveError::ExecutionError(format!("Failed to read {}: {}", label, e)))
}

/// Find yt-dlp executable
///
/// An explicit path wins; then common install locations, then `which`.
pub fn find_ytdlp(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    let common_paths = [
        "/opt/homebrew/bin/yt-dlp",
        "/usr/local/bin/yt-dlp",
        "/usr/bin/yt-dlp",
    ];

    for path in common_paths {
        if std::path::Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            let path = String::from_utf8_lossy(&output.stdout);
            let trimmed = path.trim();
            if !trimmed.is_empty() {
                return trimmed.to_string();
            }
        }
    }

    // Last resort: hope it's in PATH
    "yt-dlp".to_string()
}

/// Build an HTTP client with a browser UA and optional proxy
pub fn build_http_client(proxy: Option<&str>) -> Result<reqwest::Client, ResolveError> {
    client_builder(proxy)?
        .build()
        .map_err(|e| ResolveError::ExecutionError(format!("Failed to build HTTP client: {}", e)))
}

fn client_builder(proxy: Option<&str>) -> Result<reqwest::ClientBuilder, ResolveError> {
    let builder = reqwest::Client::builder().user_agent(BROWSER_USER_AGENT);

    match proxy {
        Some(proxy_url) => {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                ResolveError::ExecutionError(format!("Invalid proxy URL {}: {}", proxy_url, e))
            })?;
            Ok(builder.proxy(proxy))
        }
        None => Ok(builder),
    }
}

/// `HttpFetcher` backed by a shared reqwest client
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: reqwest::Client,
}

impl ReqwestFetcher {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, ResolveError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .timeout(timeout)
            .send()
            .await?
            .error_for_status()?;

        Ok(response.text().await?)
    }
}
