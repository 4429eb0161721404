//! In-memory cache of extracted page content.
//!
//! Keyed by the page URL with its fragment removed, so `page#a` and
//! `page#b` share one entry. Uses [`moka`] for async-friendly caching with
//! TTL expiry and bounded capacity.

use std::time::Duration;

use moka::future::Cache;
use url::Url;

use crate::types::PageContent;

/// Maximum number of cached pages.
const MAX_CACHE_ENTRIES: u64 = 100;

/// TTL-bounded cache of [`PageContent`] by URL.
///
/// A TTL of zero disables caching: lookups always miss and inserts are
/// dropped.
#[derive(Clone)]
pub struct PageCache {
    inner: Option<Cache<String, PageContent>>,
}

impl PageCache {
    /// Create a cache whose entries live for `ttl_seconds`.
    pub fn new(ttl_seconds: u64) -> Self {
        let inner = (ttl_seconds > 0).then(|| {
            Cache::builder()
                .max_capacity(MAX_CACHE_ENTRIES)
                .time_to_live(Duration::from_secs(ttl_seconds))
                .build()
        });
        Self { inner }
    }

    /// Look up cached content for `url`.
    pub async fn get(&self, url: &str) -> Option<PageContent> {
        let cache = self.inner.as_ref()?;
        let hit = cache.get(&cache_key(url)).await;
        if hit.is_some() {
            tracing::trace!(url, "page cache hit");
        }
        hit
    }

    /// Cache `content` under `url`.
    pub async fn insert(&self, url: &str, content: PageContent) {
        if let Some(cache) = &self.inner {
            cache.insert(cache_key(url), content).await;
        }
    }

    /// Whether caching is enabled at all.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }
}

impl std::fmt::Debug for PageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageCache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

fn cache_key(url: &str) -> String {
    match Url::parse(url.trim()) {
        Ok(mut parsed) => {
            parsed.set_fragment(None);
            parsed.into()
        }
        Err(_) => url.trim().to_string(),
    }
}
