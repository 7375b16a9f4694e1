// Stream resolver - turns a video id into a playable audio URL
//
// Three strategies, always in this order:
// - yt-dlp with best-audio selection
// - scrape of the watch page's embedded player response
// - Invidious-compatible mirror instances
//
// Strategy failures are values, not panics; the orchestrator logs them and
// moves on. Only full exhaustion reaches the caller.

pub mod diagnostics;
pub mod errors;
pub mod mirror;
pub mod models;
pub mod orchestrator;
pub mod player_page;
pub mod traits;
pub mod utils;
pub mod ytdlp;

use std::sync::Arc;
use std::time::Duration;

use crate::config::ServerConfig;

pub use diagnostics::{diagnose_error, BlockingReason};
pub use errors::ResolveError;
pub use mirror::MirrorStrategy;
pub use models::{ResolutionFailure, StreamMethod, StreamResult};
pub use orchestrator::StreamResolver;
pub use player_page::PlayerPageStrategy;
pub use traits::{HttpFetcher, StreamStrategy};
pub use utils::ReqwestFetcher;
pub use ytdlp::{YtDlpConfig, YtDlpStrategy};

/// Build the production chain from server configuration
pub fn build_resolver(
    config: &ServerConfig,
    client: reqwest::Client,
) -> StreamResolver {
    let fetcher: Arc<dyn HttpFetcher> = Arc::new(ReqwestFetcher::new(client));

    let ytdlp = YtDlpStrategy::new(
        YtDlpConfig::default()
            .with_binary(config.ytdlp_path.clone())
            .with_timeout(config.extractor_timeout_secs)
            .with_proxy(config.proxy.clone()),
    );
    tracing::info!("[Resolver] Using yt-dlp at {}", ytdlp.binary());

    let player_page = PlayerPageStrategy::new(
        fetcher.clone(),
        Duration::from_secs(config.scrape_timeout_secs),
    );

    let mirror = MirrorStrategy::new(
        fetcher,
        config.mirror_instances.clone(),
        Duration::from_secs(config.mirror_timeout_secs),
    );
    tracing::info!("[Resolver] {} mirror instance(s) configured", mirror.instances().len());

    StreamResolver::new()
        .with_strategy(Box::new(ytdlp))
        .with_strategy(Box::new(player_page))
        .with_strategy(Box::new(mirror))
}
