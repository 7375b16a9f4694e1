// YouTube Music InnerTube client
//
// Bootstraps API key and client version from the music.youtube.com landing
// page once, then talks to `youtubei/v1/search` with the WEB_REMIX client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE, ORIGIN, REFERER};
use serde_json::{json, Value};
use std::time::Duration;
use tokio::sync::OnceCell;

use super::models::{ArtistRef, CatalogItem};
use super::{CatalogError, MusicCatalog};

const MUSIC_ORIGIN: &str = "https://music.youtube.com";

/// Biases search towards songs
const SONGS_FILTER_PARAMS: &str = "EgWKAQIIAWoKEAkQBRAKEAMQBA%3D%3D";

const ARTIST_PAGE_TYPE: &str = "MUSIC_PAGE_TYPE_ARTIST";

/// Upper bound on result pages fetched for one search
const MAX_SEARCH_PAGES: usize = 5;

/// One page of search results plus the token for the next one
#[derive(Debug, Default)]
pub(crate) struct SearchPage {
    pub items: Vec<CatalogItem>,
    pub continuation: Option<String>,
}

#[derive(Debug, Clone)]
struct Bootstrap {
    api_key: String,
    client_version: String,
    visitor_data: Option<String>,
}

pub struct YtMusicClient {
    http: reqwest::Client,
    bootstrap: OnceCell<Bootstrap>,
    timeout: Duration,
}

impl YtMusicClient {
    pub fn new(proxy: Option<&str>, timeout: Duration) -> Result<Self, CatalogError> {
        let mut headers = HeaderMap::new();
        headers.insert(ORIGIN, HeaderValue::from_static(MUSIC_ORIGIN));
        headers.insert(REFERER, HeaderValue::from_static("https://music.youtube.com/"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let mut builder = reqwest::Client::builder()
            .user_agent(crate::resolver::utils::BROWSER_USER_AGENT)
            .default_headers(headers);

        if let Some(proxy_url) = proxy {
            builder = builder.proxy(reqwest::Proxy::all(proxy_url)?);
        }

        Ok(Self {
            http: builder.build()?,
            bootstrap: OnceCell::new(),
            timeout,
        })
    }

    async fn bootstrap(&self) -> Result<&Bootstrap, CatalogError> {
        self.bootstrap
            .get_or_try_init(|| async {
                let html = self
                    .http
                    .get(MUSIC_ORIGIN)
                    .timeout(self.timeout)
                    .send()
                    .await?
                    .error_for_status()?
                    .text()
                    .await?;

                let api_key = parse_ytcfg_value(&html, "INNERTUBE_API_KEY")
                    .ok_or_else(|| CatalogError::Bootstrap("INNERTUBE_API_KEY".to_string()))?;
                let client_version = parse_ytcfg_value(&html, "INNERTUBE_CLIENT_VERSION")
                    .ok_or_else(|| CatalogError::Bootstrap("INNERTUBE_CLIENT_VERSION".to_string()))?;

                tracing::debug!("[YtMusic] Bootstrapped client version {}", client_version);

                Ok::<_, CatalogError>(Bootstrap {
                    api_key,
                    client_version,
                    visitor_data: parse_ytcfg_value(&html, "VISITOR_DATA"),
                })
            })
            .await
    }

    async fn search_raw(&self, query: &str, region: &str) -> Result<Value, CatalogError> {
        let b = self.bootstrap().await?;
        let body = json!({
            "context": client_context(b, region),
            "query": query,
            "params": SONGS_FILTER_PARAMS,
        });
        self.post_search(b, &body).await
    }

    async fn search_continue(&self, token: &str, region: &str) -> Result<Value, CatalogError> {
        let b = self.bootstrap().await?;
        let body = json!({
            "context": client_context(b, region),
            "continuation": token,
        });
        self.post_search(b, &body).await
    }

    async fn post_search(&self, b: &Bootstrap, body: &Value) -> Result<Value, CatalogError> {
        let url = format!(
            "{}/youtubei/v1/search?key={}&prettyPrint=false",
            MUSIC_ORIGIN, b.api_key
        );

        let mut request = self
            .http
            .post(url)
            .timeout(self.timeout)
            .header("X-Youtube-Client-Name", "67")
            .header("X-Youtube-Client-Version", b.client_version.as_str());

        if let Some(v) = b.visitor_data.as_deref() {
            request = request.header("X-Goog-Visitor-Id", v);
        }

        let value = request
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(value)
    }
}

fn client_context(b: &Bootstrap, region: &str) -> Value {
    json!({
        "client": {
            "clientName": "WEB_REMIX",
            "clientVersion": b.client_version,
            "hl": "en",
            "gl": region,
        }
    })
}

#[async_trait]
impl MusicCatalog for YtMusicClient {
    async fn search(
        &self,
        query: &str,
        limit: usize,
        region: &str,
    ) -> Result<Vec<CatalogItem>, CatalogError> {
        tracing::debug!("[YtMusic] search {:?} (limit {}, region {})", query, limit, region);
        let first = parse_search_page(&self.search_raw(query, region).await?)?;
        let mut items = first.items;
        let mut token = first.continuation;
        let mut pages = 1;

        while items.len() < limit && pages < MAX_SEARCH_PAGES {
            let Some(next) = token.take() else { break };
            let page = parse_search_page(&self.search_continue(&next, region).await?)?;
            pages += 1;
            tracing::debug!("[YtMusic] continuation page {} added {} items", pages, page.items.len());

            if page.items.is_empty() {
                break;
            }
            items.extend(page.items);
            token = page.continuation;
        }

        items.truncate(limit);
        Ok(items)
    }
}

/// Items and next-page token from a search or continuation response
pub(crate) fn parse_search_page(response: &Value) -> Result<SearchPage, CatalogError> {
    if response.get("contents").is_none() && response.get("continuationContents").is_none() {
        return Err(CatalogError::Decode("search response has no contents".to_string()));
    }

    Ok(SearchPage {
        items: extract_items(response),
        continuation: extract_continuation_token(response),
    })
}

/// Reads `"KEY":"value"` out of the inline ytcfg payload
fn parse_ytcfg_value(html: &str, key: &str) -> Option<String> {
    let needle = format!("\"{}\":\"", key);
    let start = html.find(&needle)? + needle.len();
    let rest = &html[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string()).filter(|v| !v.is_empty())
}

/// First `nextContinuationData` or `continuationCommand` token in the response
fn extract_continuation_token(v: &Value) -> Option<String> {
    let token = v
        .pointer("/nextContinuationData/continuation")
        .or_else(|| v.pointer("/continuationEndpoint/continuationCommand/token"))
        .and_then(Value::as_str);
    if let Some(token) = token {
        return Some(token.to_string());
    }

    match v {
        Value::Array(a) => a.iter().find_map(extract_continuation_token),
        Value::Object(o) => o.values().find_map(extract_continuation_token),
        _ => None,
    }
}

/// Collect every `musicResponsiveListItemRenderer`, in document order
pub(crate) fn extract_items(response: &Value) -> Vec<CatalogItem> {
    let mut out = Vec::new();
    scan_value(response, &mut out);
    out
}

fn scan_value(v: &Value, out: &mut Vec<CatalogItem>) {
    if let Some(item) = v.get("musicResponsiveListItemRenderer").and_then(parse_list_item) {
        out.push(item);
    }

    match v {
        Value::Array(a) => a.iter().for_each(|x| scan_value(x, out)),
        Value::Object(o) => o.values().for_each(|x| scan_value(x, out)),
        _ => {}
    }
}

fn parse_list_item(r: &Value) -> Option<CatalogItem> {
    let title = r
        .pointer("/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")
        .and_then(Value::as_str)?
        .to_string();

    let video_id = r
        .pointer("/playlistItemData/videoId")
        .or_else(|| r.pointer("/navigationEndpoint/watchEndpoint/videoId"))
        .or_else(|| {
            r.pointer(
                "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/navigationEndpoint/watchEndpoint/videoId",
            )
        })
        .and_then(Value::as_str)
        .map(str::to_string);

    let runs = r
        .pointer("/flexColumns/1/musicResponsiveListItemFlexColumnRenderer/text/runs")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    Some(CatalogItem {
        video_id,
        title,
        artists: extract_artists(runs),
    })
}

/// Runs linking to an artist page; the first run when none are linked
fn extract_artists(runs: &[Value]) -> Vec<ArtistRef> {
    let linked: Vec<ArtistRef> = runs
        .iter()
        .filter(|run| {
            run.pointer(
                "/navigationEndpoint/browseEndpoint/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType",
            )
            .and_then(Value::as_str)
                == Some(ARTIST_PAGE_TYPE)
        })
        .filter_map(|run| run["text"].as_str())
        .map(|name| ArtistRef { name: name.to_string() })
        .collect();

    if !linked.is_empty() {
        return linked;
    }

    runs.first()
        .and_then(|run| run["text"].as_str())
        .filter(|t| !t.trim().is_empty())
        .map(|name| vec![ArtistRef { name: name.to_string() }])
        .unwrap_or_default()
}
