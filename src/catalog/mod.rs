// Music catalog - search and chart lookups against the metadata provider

pub mod models;
pub mod ytmusic;

use async_trait::async_trait;
use thiserror::Error;

pub use models::{normalize_items, ArtistRef, CatalogItem, TrackSummary};
pub use ytmusic::YtMusicClient;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Catalog request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Catalog bootstrap failed: missing {0}")]
    Bootstrap(String),

    #[error("Catalog response malformed: {0}")]
    Decode(String),
}

/// Search/chart provider, injected into the HTTP layer
#[async_trait]
pub trait MusicCatalog: Send + Sync {
    /// At most `limit` raw items for `query`, localized to `region`
    async fn search(
        &self,
        query: &str,
        limit: usize,
        region: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError>;
}
