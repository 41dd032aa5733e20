//! HTTP server for the image relay
//!
//! `/` answers a liveness probe; every other path is relayed through the
//! cache, and any failure is answered with a placeholder image.

use crate::config::RelayConfig;
use crate::error::{RelayError, Result};
use crate::fetch::ImageFetcher;
use crate::placeholder;
use axum::{
    body::Body,
    extract::State,
    http::{header, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use file_image_cache::{CachedImage, ImageCache};
use std::sync::Arc;
use tokio_util::io::ReaderStream;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Shared state for the HTTP server
pub struct ServerState {
    pub config: RelayConfig,
    pub cache: ImageCache,
    pub fetcher: ImageFetcher,
}

impl ServerState {
    pub fn new(config: RelayConfig, cache: ImageCache, fetcher: ImageFetcher) -> Self {
        Self {
            config,
            cache,
            fetcher,
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/", get(liveness).fallback(method_not_allowed))
        .route("/{*path}", get(relay_image).fallback(method_not_allowed))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Liveness endpoint
async fn liveness() -> &'static str {
    "image-relay is running"
}

/// Reject anything that is not a GET before touching cache or network.
async fn method_not_allowed(method: Method, uri: Uri) -> Response {
    warn!(method = %method, uri = %uri, "Method not allowed");
    (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed").into_response()
}

/// Relay one image request through the cache.
async fn relay_image(State(state): State<SharedState>, uri: Uri) -> Response {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    match serve_image(&state, &target).await {
        Ok(response) => response,
        Err(e) => {
            warn!(target = %target, error = %e, "Relay failed, serving placeholder");
            placeholder_response(&state.config, &e)
        }
    }
}

/// Serve from cache, falling back to an upstream fetch and ingest.
async fn serve_image(state: &ServerState, target: &str) -> Result<Response> {
    if let Some(cached) = state.cache.open(target).await {
        return Ok(image_response(cached, "HIT"));
    }

    let upstream = state.fetcher.fetch(target).await?;
    let fresh = state
        .cache
        .ingest(
            target,
            &upstream.content_type,
            upstream.declared_len,
            upstream.response.bytes_stream(),
        )
        .await?;

    Ok(image_response(fresh, "MISS"))
}

/// Stream a cached payload with its stored metadata.
fn image_response(cached: CachedImage, cache_header: &str) -> Response {
    let stream = ReaderStream::new(cached.file);
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, cached.meta.content_type)
        .header(header::CONTENT_LENGTH, cached.meta.size)
        .header(header::CACHE_CONTROL, "public, max-age=86400")
        .header("X-Cache", cache_header)
        .body(Body::from_stream(stream))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

/// Render a failure as a placeholder image response.
fn placeholder_response(config: &RelayConfig, error: &RelayError) -> Response {
    let svg = placeholder::render(config, &error.to_string());
    Response::builder()
        .status(error.status())
        .header(header::CONTENT_TYPE, "image/svg+xml; charset=utf-8")
        .header(header::CACHE_CONTROL, "no-store")
        .body(Body::from(svg))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
