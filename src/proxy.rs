//! Inbound oEmbed proxy endpoint.
//!
//! The browser never talks to the oEmbed provider directly; it asks this
//! endpoint, which validates the URL, makes a single best-effort upstream
//! request, and instructs clients to cache the result. Validation runs
//! before any outbound request so the endpoint cannot be used as an open
//! proxy.
//!
//! Routes:
//! - `GET /twitter-oembed/?url=...` — canonical path (trailing slash kept to
//!   avoid 308 redirects on deployments that enforce one)
//! - `GET /api/twitter-oembed?url=...` — historical duplicate, same handler
//! - `GET /health`

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use http::{header, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::normalize::{is_likely_post_url, normalize_post_url};

/// The provider's unauthenticated oEmbed endpoint. The script is omitted
/// because the widget loader fetches it itself.
pub const UPSTREAM_OEMBED_URL: &str = "https://publish.twitter.com/oembed";

/// Rendered width requested from the provider.
pub const OEMBED_MAX_WIDTH: u32 = 550;

/// Client cache policy: fresh for an hour, serveable 24h stale while
/// revalidating.
pub const CACHE_CONTROL_VALUE: &str = "public, max-age=3600, stale-while-revalidate=86400";

/// The endpoint's closed error set, mapped onto HTTP statuses.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProxyError {
    /// The `url` parameter did not survive the validity gate.
    #[error("Invalid tweet url")]
    InvalidUrl,
    /// The upstream oEmbed provider errored or was unreachable.
    #[error("oEmbed fetch failed")]
    UpstreamFailed,
}

impl ProxyError {
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl => StatusCode::BAD_REQUEST,
            Self::UpstreamFailed => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.to_string(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Raw upstream result, before policy is applied.
#[derive(Debug, Clone)]
pub struct UpstreamReply {
    pub status: StatusCode,
    /// Trimmed snippet; may legitimately be empty.
    pub html: String,
}

/// Seam to the oEmbed provider. `Err` covers transport failures and
/// malformed bodies; a well-formed non-success response comes back as a
/// reply with that status.
#[async_trait]
pub trait OembedUpstream: Send + Sync {
    async fn fetch_oembed(&self, canonical_url: &str) -> Result<UpstreamReply>;
}

/// Build the full upstream request URL for a canonical post URL.
#[must_use]
pub fn build_oembed_request_url(endpoint: &str, canonical_url: &str) -> String {
    format!(
        "{}?url={}&omit_script=1&dnt=1&maxwidth={}",
        endpoint,
        urlencoding::encode(canonical_url),
        OEMBED_MAX_WIDTH
    )
}

#[derive(Debug, Deserialize)]
struct UpstreamPayload {
    html: Option<String>,
}

/// `reqwest`-backed upstream client.
pub struct HttpUpstream {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpUpstream {
    pub fn new() -> Result<Self> {
        Self::with_endpoint(UPSTREAM_OEMBED_URL)
    }

    /// Point at a different endpoint (tests, local stubs).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl OembedUpstream for HttpUpstream {
    async fn fetch_oembed(&self, canonical_url: &str) -> Result<UpstreamReply> {
        let url = build_oembed_request_url(&self.endpoint, canonical_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Ok(UpstreamReply {
                status,
                html: String::new(),
            });
        }

        let payload: UpstreamPayload = response.json().await?;
        Ok(UpstreamReply {
            status,
            html: payload.html.unwrap_or_default().trim().to_string(),
        })
    }
}

/// The endpoint's decision logic, separated from the HTTP glue so it can be
/// exercised with a scripted upstream.
///
/// Even an empty snippet is a success: the client falls back to a plain
/// link, which is not this endpoint's concern.
pub async fn proxy_oembed(
    upstream: &dyn OembedUpstream,
    raw_url: &str,
) -> Result<String, ProxyError> {
    let canonical = normalize_post_url(raw_url);
    if canonical.is_empty() || !is_likely_post_url(&canonical) {
        return Err(ProxyError::InvalidUrl);
    }

    let reply = upstream.fetch_oembed(&canonical).await.map_err(|e| {
        warn!(error = %e, "oEmbed upstream unreachable");
        ProxyError::UpstreamFailed
    })?;

    if !reply.status.is_success() {
        warn!(status = %reply.status, "oEmbed upstream returned non-success");
        return Err(ProxyError::UpstreamFailed);
    }

    Ok(reply.html)
}

#[derive(Clone)]
struct ProxyAppState {
    upstream: Arc<dyn OembedUpstream>,
}

#[derive(Debug, Deserialize)]
struct OembedQuery {
    #[serde(default)]
    url: String,
}

#[derive(Debug, Serialize)]
struct OembedBody {
    html: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

async fn oembed_handler(
    State(state): State<ProxyAppState>,
    Query(query): Query<OembedQuery>,
) -> Response {
    match proxy_oembed(state.upstream.as_ref(), &query.url).await {
        Ok(html) => (
            [(header::CACHE_CONTROL, CACHE_CONTROL_VALUE)],
            Json(OembedBody { html }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}

/// Assemble the proxy router over a given upstream.
pub fn build_router(upstream: Arc<dyn OembedUpstream>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/twitter-oembed/", get(oembed_handler))
        .route("/api/twitter-oembed", get(oembed_handler))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(ProxyAppState { upstream })
}

/// Bind and serve the proxy endpoint until shutdown.
pub async fn serve(addr: &str, upstream: Arc<dyn OembedUpstream>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let local = listener.local_addr()?;
    info!(addr = %local, "oEmbed proxy listening");
    axum::serve(listener, build_router(upstream)).await?;
    Ok(())
}
