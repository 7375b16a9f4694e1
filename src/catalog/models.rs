// Catalog data models and response normalization

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistRef {
    pub name: String,
}

/// Raw item as the provider returns it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogItem {
    /// Albums, artists and playlists have no video id
    pub video_id: Option<String>,
    pub title: String,
    pub artists: Vec<ArtistRef>,
}

/// Track as served to the frontend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackSummary {
    pub title: String,
    pub video_id: String,
    pub artists: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_url: Option<String>,
}

/// Drop non-playable items and flatten artist names, keeping order
pub fn normalize_items(items: Vec<CatalogItem>) -> Vec<TrackSummary> {
    items
        .into_iter()
        .filter_map(|item| {
            let video_id = item.video_id.filter(|id| !id.is_empty())?;
            Some(TrackSummary {
                title: item.title,
                video_id,
                artists: item.artists.into_iter().map(|a| a.name).collect(),
                audio_url: None,
            })
        })
        .collect()
}
