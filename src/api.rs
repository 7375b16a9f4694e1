// HTTP surface: routes, shared state and JSON error mapping

use axum::{
    async_trait,
    extract::{rejection::QueryRejection, FromRequestParts, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::catalog::{normalize_items, CatalogError, MusicCatalog, TrackSummary};
use crate::config::ServerConfig;
use crate::resolver::{ResolutionFailure, StreamResolver, StreamResult};

const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 50;

/// Catalog query that stands in for a chart endpoint
const TRENDING_QUERY: &str = "trending";

const STREAM_UNAVAILABLE_HINT: &str = "All stream sources failed. The video may be private, \
     region-locked or removed; otherwise update yt-dlp on the server and try again later.";

/// Shared state injected into every handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn MusicCatalog>,
    pub resolver: Arc<StreamResolver>,
    pub config: Arc<ServerConfig>,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    UpstreamUnavailable(String),

    #[error("Could not resolve a playable audio stream")]
    StreamUnavailable(ResolutionFailure),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            Self::StreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        tracing::error!("[Api] Catalog failure: {}", e);
        match e {
            CatalogError::Decode(_) => Self::Internal(e.to_string()),
            _ => Self::UpstreamUnavailable(e.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::StreamUnavailable(failure) => json!({
                "error": self.to_string(),
                "hint": STREAM_UNAVAILABLE_HINT,
                "attempted": failure.attempted,
                "lastError": failure.last_error,
            }),
            _ => json!({ "error": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

type ApiResult<T> = Result<T, ApiError>;

/// `Query` that rejects with the JSON error body
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    query: Option<String>,
    q: Option<String>,
    limit: Option<String>,
    region: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PlayParams {
    id: Option<String>,
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/trending", get(trending))
        .route("/search", get(search))
        .route("/play", get(play))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn home() -> Json<serde_json::Value> {
    Json(json!({ "message": "Youtify music app api" }))
}

async fn trending(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Vec<TrackSummary>>> {
    let limit = parse_limit(params.limit.as_deref())?;
    let region = region_or_default(params.region.as_deref(), &state.config);
    tracing::debug!("[Api] trending region={} limit={}", region, limit);

    let items = state.catalog.search(TRENDING_QUERY, limit, &region).await?;
    Ok(Json(finish_listing(&state, normalize_items(items)).await))
}

async fn search(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<ListParams>,
) -> ApiResult<Json<Vec<TrackSummary>>> {
    let query = params
        .query
        .as_deref()
        .or(params.q.as_deref())
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query parameter is required".to_string()))?;
    let limit = parse_limit(params.limit.as_deref())?;
    let region = region_or_default(params.region.as_deref(), &state.config);
    tracing::debug!("[Api] search {:?} region={} limit={}", query, region, limit);

    let items = state.catalog.search(query, limit, &region).await?;
    Ok(Json(finish_listing(&state, normalize_items(items)).await))
}

async fn play(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<PlayParams>,
) -> ApiResult<Json<StreamResult>> {
    let video_id = params
        .id
        .or(params.video_id)
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Missing required parameter: id".to_string()))?;

    state
        .resolver
        .resolve(&video_id)
        .await
        .map(Json)
        .map_err(ApiError::StreamUnavailable)
}

fn parse_limit(raw: Option<&str>) -> ApiResult<usize> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_LIMIT);
    };

    match raw.parse::<usize>() {
        Ok(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
        _ => Err(ApiError::BadRequest(format!(
            "limit must be an integer between 1 and {}",
            MAX_LIMIT
        ))),
    }
}

fn region_or_default(raw: Option<&str>, config: &ServerConfig) -> String {
    raw.map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| config.default_region.clone())
}

/// Fill `audioUrl` from the primary extractor when enabled
async fn finish_listing(state: &AppState, mut tracks: Vec<TrackSummary>) -> Vec<TrackSummary> {
    if state.config.inline_audio_urls {
        for track in &mut tracks {
            track.audio_url = state.resolver.quick_url(&track.video_id).await;
        }
    }
    tracks
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ArtistRef, CatalogItem};
    use crate::resolver::errors::ResolveError;
    use crate::resolver::orchestrator::tests::FakeStrategy;
    use crate::resolver::StreamMethod;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use tower::ServiceExt;

    #[derive(Default)]
    struct FakeCatalog {
        fail: bool,
        malformed: bool,
        calls: AtomicUsize,
        last_args: Mutex<Option<(String, usize, String)>>,
    }

    #[async_trait]
    impl MusicCatalog for FakeCatalog {
        async fn search(
            &self,
            query: &str,
            limit: usize,
            region: &str,
        ) -> Result<Vec<CatalogItem>, CatalogError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_args.lock().unwrap() = Some((query.to_string(), limit, region.to_string()));

            if self.fail {
                return Err(CatalogError::Bootstrap("INNERTUBE_API_KEY".to_string()));
            }
            if self.malformed {
                return Err(CatalogError::Decode("search response has no contents".to_string()));
            }

            Ok(vec![
                CatalogItem {
                    video_id: Some("vid1".to_string()),
                    title: "First".to_string(),
                    artists: vec![ArtistRef { name: "Alice".to_string() }],
                },
                CatalogItem {
                    video_id: None,
                    title: "An Album".to_string(),
                    artists: vec![],
                },
            ])
        }
    }

    struct TestContext {
        catalog: Arc<FakeCatalog>,
        state: AppState,
    }

    impl TestContext {
        fn new(catalog: FakeCatalog, resolver: StreamResolver, config: ServerConfig) -> Self {
            let catalog = Arc::new(catalog);
            Self {
                state: AppState {
                    catalog: catalog.clone(),
                    resolver: Arc::new(resolver),
                    config: Arc::new(config),
                },
                catalog,
            }
        }

        fn simple() -> Self {
            Self::new(FakeCatalog::default(), StreamResolver::new(), ServerConfig::default())
        }

        async fn get(&self, uri: &str) -> (StatusCode, Value) {
            let response = build_router(self.state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            let status = response.status();
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            (status, serde_json::from_slice(&bytes).unwrap())
        }

        fn catalog_calls(&self) -> usize {
            self.catalog.calls.load(Ordering::SeqCst)
        }
    }

    fn failing_chain() -> StreamResolver {
        let (primary, _) = FakeStrategy::failing(
            StreamMethod::PrimaryExtractor,
            ResolveError::ToolNotFound("yt-dlp".into()),
        );
        let (scrape, _) = FakeStrategy::failing(
            StreamMethod::PlayerPageScrape,
            ResolveError::NoUsableStream("marker missing".into()),
        );
        let (mirror, _) = FakeStrategy::failing(
            StreamMethod::MirrorApi,
            ResolveError::UpstreamUnavailable("connection refused".into()),
        );
        StreamResolver::new()
            .with_strategy(primary)
            .with_strategy(scrape)
            .with_strategy(mirror)
    }

    #[tokio::test]
    async fn home_returns_banner() {
        let ctx = TestContext::simple();
        let (status, body) = ctx.get("/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["message"].as_str().unwrap().contains("Youtify"));
    }

    #[tokio::test]
    async fn search_without_query_is_bad_request() {
        let ctx = TestContext::simple();

        for uri in ["/search", "/search?query=", "/search?q=%20%20&limit=5"] {
            let (status, body) = ctx.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body.get("error").is_some());
        }
        assert_eq!(ctx.catalog_calls(), 0);
    }

    #[tokio::test]
    async fn search_accepts_q_alias_and_filters_items() {
        let ctx = TestContext::simple();

        let (status, body) = ctx.get("/search?q=daft%20punk&limit=3&region=us").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            serde_json::json!([{ "title": "First", "videoId": "vid1", "artists": ["Alice"] }])
        );
        assert_eq!(
            *ctx.catalog.last_args.lock().unwrap(),
            Some(("daft punk".to_string(), 3, "US".to_string()))
        );
    }

    #[tokio::test]
    async fn search_rejects_bad_limit() {
        let ctx = TestContext::simple();

        for uri in ["/search?query=x&limit=ten", "/search?query=x&limit=0", "/search?query=x&limit=500"] {
            let (status, body) = ctx.get(uri).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
            assert!(body["error"].as_str().unwrap().contains("limit"));
        }
        assert_eq!(ctx.catalog_calls(), 0);
    }

    #[tokio::test]
    async fn malformed_query_string_is_json_bad_request() {
        let ctx = TestContext::simple();

        for uri in ["/search?query=a&query=b", "/trending?limit=1&limit=2", "/play?id=a&id=b"] {
            let response = build_router(ctx.state.clone())
                .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();

            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
            assert_eq!(
                response.headers()[axum::http::header::CONTENT_TYPE],
                "application/json",
                "{}",
                uri
            );
            let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert!(body["error"].as_str().unwrap().contains("duplicate field"), "{}", uri);
        }
        assert_eq!(ctx.catalog_calls(), 0);
    }

    #[tokio::test]
    async fn trending_uses_defaults() {
        let ctx = TestContext::simple();

        let (status, body) = ctx.get("/trending").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
        assert_eq!(
            *ctx.catalog.last_args.lock().unwrap(),
            Some(("trending".to_string(), 10, "IN".to_string()))
        );
    }

    #[tokio::test]
    async fn catalog_failure_is_bad_gateway() {
        let ctx = TestContext::new(
            FakeCatalog { fail: true, ..Default::default() },
            StreamResolver::new(),
            ServerConfig::default(),
        );

        let (status, body) = ctx.get("/trending?region=GB").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(body["error"].as_str().unwrap().contains("INNERTUBE_API_KEY"));
    }

    #[tokio::test]
    async fn malformed_catalog_response_is_internal_error() {
        let ctx = TestContext::new(
            FakeCatalog { malformed: true, ..Default::default() },
            StreamResolver::new(),
            ServerConfig::default(),
        );

        let (status, body) = ctx.get("/search?query=x").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body["error"].as_str().unwrap().contains("no contents"));
    }

    #[tokio::test]
    async fn listing_inlines_audio_urls_when_enabled() {
        let (primary, primary_calls) = FakeStrategy::ok(StreamMethod::PrimaryExtractor, "https://audio/1");
        let (mirror, mirror_calls) = FakeStrategy::ok(StreamMethod::MirrorApi, "https://mirror/1");
        let ctx = TestContext::new(
            FakeCatalog::default(),
            StreamResolver::new().with_strategy(primary).with_strategy(mirror),
            ServerConfig::default().with_inline_audio_urls(true),
        );

        let (status, body) = ctx.get("/search?query=x").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body[0]["audioUrl"], "https://audio/1");
        assert_eq!(primary_calls.load(Ordering::SeqCst), 1);
        assert_eq!(mirror_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn play_returns_primary_result() {
        let (primary, _) = FakeStrategy::ok(StreamMethod::PrimaryExtractor, "https://audio/abc");
        let (scrape, scrape_calls) = FakeStrategy::ok(StreamMethod::PlayerPageScrape, "https://page/abc");
        let ctx = TestContext::new(
            FakeCatalog::default(),
            StreamResolver::new().with_strategy(primary).with_strategy(scrape),
            ServerConfig::default(),
        );

        let (status, body) = ctx.get("/play?id=abc").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["streamUrl"], "https://audio/abc");
        assert_eq!(body["method"], "primary_extractor");
        assert_eq!(scrape_calls.load(Ordering::SeqCst), 0);
        assert_eq!(ctx.catalog_calls(), 0);
    }

    #[tokio::test]
    async fn play_exhaustion_is_service_unavailable() {
        let ctx = TestContext::new(FakeCatalog::default(), failing_chain(), ServerConfig::default());

        let (status, body) = ctx.get("/play?videoId=abc").await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert!(body.get("error").is_some());
        assert!(body.get("hint").is_some());
        assert_eq!(
            body["attempted"],
            serde_json::json!(["primary_extractor", "player_page_scrape", "mirror_api"])
        );
    }

    #[tokio::test]
    async fn play_without_id_is_bad_request() {
        let ctx = TestContext::new(FakeCatalog::default(), failing_chain(), ServerConfig::default());
        let (status, body) = ctx.get("/play").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.get("error").is_some());
    }
}
