//! oEmbed fetching with a process-wide, populate-once cache.
//!
//! The cache is an explicitly constructed object handed to every call site by
//! the composition root, not a module-level global. Semantics are unchanged
//! from the original subsystem: one entry per canonical URL for the lifetime
//! of the process, never evicted, an empty string meaning "fetch attempted,
//! no content" and never retried.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use http::StatusCode;
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Path of the site's caching proxy endpoint (trailing slash avoids a 308
/// redirect on deployments that enforce one).
pub const OEMBED_PROXY_PATH: &str = "/twitter-oembed/";

/// Shared canonical-URL → HTML snippet cache.
///
/// Writes are single-assignment per key: the first value stored for a URL
/// wins, so racing instances cannot observe a change. Cloned handles share
/// one underlying map.
#[derive(Debug, Clone, Default)]
pub struct OEmbedCache {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl OEmbedCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, canonical_url: &str) -> Option<String> {
        self.entries.read().await.get(canonical_url).cloned()
    }

    pub async fn contains(&self, canonical_url: &str) -> bool {
        self.entries.read().await.contains_key(canonical_url)
    }

    /// Store a snippet unless the key is already populated.
    pub async fn insert(&self, canonical_url: &str, html: String) {
        self.entries
            .write()
            .await
            .entry(canonical_url.to_string())
            .or_insert(html);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

/// Reply from the proxy endpoint, before cache policy is applied.
#[derive(Debug, Clone)]
pub struct OEmbedReply {
    pub status: StatusCode,
    /// Trimmed snippet; empty when the endpoint had nothing to offer.
    pub html: String,
}

/// Transport to the proxy endpoint. The production implementation speaks
/// HTTP; tests substitute scripted replies and count calls.
///
/// `Err` means transport failure (connection refused, reset, malformed body)
/// as opposed to a well-formed non-success response.
#[async_trait]
pub trait OEmbedTransport: Send + Sync {
    async fn get(&self, canonical_url: &str) -> Result<OEmbedReply>;
}

#[derive(Debug, Deserialize)]
struct ProxyPayload {
    html: Option<String>,
}

/// `reqwest`-backed transport against a site origin.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// `base_url` is the site origin, e.g. `https://grillekstraklasa.pl`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl OEmbedTransport for HttpTransport {
    async fn get(&self, canonical_url: &str) -> Result<OEmbedReply> {
        let url = format!(
            "{}{}?url={}",
            self.base_url,
            OEMBED_PROXY_PATH,
            urlencoding::encode(canonical_url)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            return Ok(OEmbedReply {
                status,
                html: String::new(),
            });
        }

        let payload: ProxyPayload = response.json().await?;
        Ok(OEmbedReply {
            status,
            html: payload.html.unwrap_or_default().trim().to_string(),
        })
    }
}

/// What a fetch produced, and how.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Best-available snippet; empty when nothing is displayable.
    pub html: String,
    /// Served from the cache without I/O.
    pub from_cache: bool,
    /// The cache now holds an authoritative entry for this URL. False on
    /// transport failure, where the caller proceeds on the widget script
    /// alone and a later mount may try again.
    pub oembed_ok: bool,
}

/// Cache-first oEmbed fetcher: at most one outbound attempt per distinct
/// canonical URL, no retries, no backoff.
pub struct OEmbedFetcher {
    cache: OEmbedCache,
    transport: Arc<dyn OEmbedTransport>,
}

impl OEmbedFetcher {
    pub fn new(cache: OEmbedCache, transport: Arc<dyn OEmbedTransport>) -> Self {
        Self { cache, transport }
    }

    #[must_use]
    pub fn cache(&self) -> &OEmbedCache {
        &self.cache
    }

    /// Resolve the snippet for a canonical URL.
    ///
    /// The cache is authoritative once populated, even when the cached value
    /// is empty. A non-success proxy response caches the empty string: "no
    /// enhancement available" is a fact, not an error — the controller alone
    /// decides whether that plus a failed script load amounts to an error.
    #[instrument(skip_all, fields(url = %canonical_url))]
    pub async fn fetch(&self, canonical_url: &str) -> FetchOutcome {
        if let Some(html) = self.cache.get(canonical_url).await {
            debug!("oEmbed cache hit");
            return FetchOutcome {
                html,
                from_cache: true,
                oembed_ok: true,
            };
        }

        match self.transport.get(canonical_url).await {
            Ok(reply) if reply.status.is_success() => {
                self.cache.insert(canonical_url, reply.html.clone()).await;
                FetchOutcome {
                    html: reply.html,
                    from_cache: false,
                    oembed_ok: true,
                }
            }
            Ok(reply) => {
                warn!(status = %reply.status, "oEmbed proxy returned non-success; caching empty snippet");
                self.cache.insert(canonical_url, String::new()).await;
                FetchOutcome {
                    html: String::new(),
                    from_cache: false,
                    oembed_ok: false,
                }
            }
            Err(e) => {
                // Transport failure: leave the cache unpopulated so a later
                // mount may attempt again; this one relies on the widget
                // script for content.
                warn!(error = %e, "oEmbed transport failed");
                FetchOutcome {
                    html: String::new(),
                    from_cache: false,
                    oembed_ok: false,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Scripted transport that counts outbound calls.
    struct CountingTransport {
        calls: AtomicUsize,
        reply: Result<OEmbedReply, String>,
    }

    impl CountingTransport {
        fn ok(html: &str) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Ok(OEmbedReply {
                    status: StatusCode::OK,
                    html: html.to_string(),
                }),
            }
        }

        fn status(status: StatusCode) -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Ok(OEmbedReply {
                    status,
                    html: String::new(),
                }),
            }
        }

        fn failing() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                reply: Err("connection refused".to_string()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OEmbedTransport for CountingTransport {
        async fn get(&self, _canonical_url: &str) -> Result<OEmbedReply> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(msg) => Err(anyhow::anyhow!(msg.clone())),
            }
        }
    }

    const URL: &str = "https://twitter.com/u/status/1";

    #[tokio::test]
    async fn second_fetch_is_served_from_cache() {
        let transport = Arc::new(CountingTransport::ok("<blockquote>t</blockquote>"));
        let fetcher = OEmbedFetcher::new(OEmbedCache::new(), transport.clone());

        let first = fetcher.fetch(URL).await;
        let second = fetcher.fetch(URL).await;

        assert_eq!(transport.call_count(), 1);
        assert!(!first.from_cache);
        assert!(second.from_cache);
        assert_eq!(first.html, second.html);
    }

    #[tokio::test]
    async fn distinct_urls_fetch_independently() {
        let transport = Arc::new(CountingTransport::ok("<p>x</p>"));
        let fetcher = OEmbedFetcher::new(OEmbedCache::new(), transport.clone());

        fetcher.fetch("https://twitter.com/a/status/1").await;
        fetcher.fetch("https://twitter.com/b/status/2").await;

        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn non_success_status_caches_empty_snippet() {
        let transport = Arc::new(CountingTransport::status(StatusCode::INTERNAL_SERVER_ERROR));
        let cache = OEmbedCache::new();
        let fetcher = OEmbedFetcher::new(cache.clone(), transport.clone());

        let outcome = fetcher.fetch(URL).await;
        assert!(!outcome.oembed_ok);
        assert_eq!(outcome.html, "");
        assert_eq!(cache.get(URL).await, Some(String::new()));

        // The empty entry is authoritative; no second attempt.
        let again = fetcher.fetch(URL).await;
        assert!(again.from_cache);
        assert!(again.oembed_ok);
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn transport_failure_leaves_cache_unpopulated() {
        let transport = Arc::new(CountingTransport::failing());
        let cache = OEmbedCache::new();
        let fetcher = OEmbedFetcher::new(cache.clone(), transport.clone());

        let outcome = fetcher.fetch(URL).await;
        assert!(!outcome.oembed_ok);
        assert!(!cache.contains(URL).await);

        // Not authoritative, so a later mount tries again.
        fetcher.fetch(URL).await;
        assert_eq!(transport.call_count(), 2);
    }

    #[tokio::test]
    async fn cache_writes_are_single_assignment() {
        let cache = OEmbedCache::new();
        cache.insert(URL, "first".to_string()).await;
        cache.insert(URL, "second".to_string()).await;
        assert_eq!(cache.get(URL).await, Some("first".to_string()));
        assert_eq!(cache.len().await, 1);
    }
}
