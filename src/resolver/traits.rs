// Strategy and HTTP seams used by the resolver

use async_trait::async_trait;
use std::time::Duration;

use super::errors::ResolveError;
use super::models::{StreamMethod, StreamResult};

/// One self-contained way of turning a video id into a stream
#[async_trait]
pub trait StreamStrategy: Send + Sync {
    /// Name of the strategy (for logging)
    fn name(&self) -> &'static str;

    /// Method tag put on results and failures
    fn method(&self) -> StreamMethod;

    /// Resolve a playable audio stream
    async fn resolve(&self, video_id: &str) -> Result<StreamResult, ResolveError>;
}

/// Plain GET returning the body as text
///
/// Non-2xx statuses are errors. Implementations apply the per-call timeout.
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    async fn get_text(&self, url: &str, timeout: Duration) -> Result<String, ResolveError>;
}
