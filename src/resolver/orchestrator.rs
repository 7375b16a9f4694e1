// StreamResolver - ordered fallback across strategies
//
// Strategies run strictly in the order they were added. The first success
// short-circuits; every failure is logged with a diagnosed reason and the
// next strategy is tried. Nothing is retried and nothing runs in parallel.

use super::diagnostics::diagnose_error;
use super::models::{ResolutionFailure, StreamResult};
use super::traits::StreamStrategy;

pub struct StreamResolver {
    strategies: Vec<Box<dyn StreamStrategy>>,
}

impl StreamResolver {
    pub fn new() -> Self {
        Self {
            strategies: Vec::new(),
        }
    }

    pub fn add_strategy(&mut self, strategy: Box<dyn StreamStrategy>) {
        self.strategies.push(strategy);
    }

    pub fn with_strategy(mut self, strategy: Box<dyn StreamStrategy>) -> Self {
        self.add_strategy(strategy);
        self
    }

    /// Names of configured strategies, in attempt order
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }

    pub async fn resolve(&self, video_id: &str) -> Result<StreamResult, ResolutionFailure> {
        let mut attempted = Vec::with_capacity(self.strategies.len());
        let mut last_error = String::from("no strategies configured");

        for strategy in &self.strategies {
            tracing::info!("[Resolver] Trying {} for {}", strategy.name(), video_id);
            attempted.push(strategy.method());

            match strategy.resolve(video_id).await {
                Ok(result) => {
                    tracing::info!("[Resolver] ✓ {} resolved {}", strategy.name(), video_id);
                    return Ok(result);
                }
                Err(e) => {
                    let message = e.to_string();
                    let reason = diagnose_error(&message);
                    tracing::warn!(
                        reason = ?reason,
                        retryable = reason.map_or(true, |r| r.is_retryable()),
                        "[Resolver] ✗ {} failed for {}: {}",
                        strategy.name(),
                        video_id,
                        message
                    );
                    last_error = message;
                }
            }
        }

        let failure = ResolutionFailure {
            reason: diagnose_error(&last_error),
            attempted,
            last_error,
        };
        tracing::error!("[Resolver] {} exhausted: {}", video_id, failure);
        Err(failure)
    }

    /// Stream URL from the first strategy only, for list enrichment
    pub async fn quick_url(&self, video_id: &str) -> Option<String> {
        let primary = self.strategies.first()?;

        match primary.resolve(video_id).await {
            Ok(result) => Some(result.stream_url),
            Err(e) => {
                tracing::debug!("[Resolver] Quick URL via {} failed for {}: {}", primary.name(), video_id, e);
                None
            }
        }
    }
}

impl Default for StreamResolver {
    fn default() -> Self {
        Self::new()
    }
}
