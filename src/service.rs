//! Search, resolve, and fetch on top of one shared result store.
//!
//! [`LookupService`] is the caller-level policy around the extraction
//! pipeline: it supplies markup, substitutes a placeholder when nothing
//! could be extracted, and turns an ID back into a result or page text.

use std::sync::Arc;

use serde::Serialize;
use serp_extract::content::extract_content;
use serp_extract::pipeline::ID_PREFIX;
use serp_extract::source::search_url;
use serp_extract::{
    ExtractError, Extractor, MarkupSource, PageCache, PageContent, ResultStore, SearchResult,
};
use url::Url;

use crate::config::LookupConfig;
use crate::error::{LookupError, Result};

/// Snapshot of the result store for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Records currently held.
    pub entries: usize,
    /// Capacity enforced by cleanup.
    pub max_entries: usize,
    /// Record lifetime in seconds.
    pub ttl_seconds: u64,
}

/// The lookup service.
///
/// Owns the result store behind an [`Arc`] so a [`StoreJanitor`] can share
/// it.
///
/// [`StoreJanitor`]: crate::janitor::StoreJanitor
pub struct LookupService<S> {
    config: LookupConfig,
    origin: Url,
    extractor: Extractor,
    store: Arc<ResultStore>,
    pages: PageCache,
    source: S,
}

impl<S: MarkupSource> LookupService<S> {
    /// Build a service over `source`.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::Config`] or [`LookupError::Extract`] if the
    /// configuration is invalid.
    pub fn new(config: LookupConfig, source: S) -> Result<Self> {
        config.validate()?;
        let origin = config.extract.origin_url()?;
        let extractor = Extractor::new(config.extract.clone())?;
        let store = Arc::new(ResultStore::new(&config.store));
        let pages = PageCache::new(config.http.page_cache_ttl_seconds);
        Ok(Self {
            config,
            origin,
            extractor,
            store,
            pages,
            source,
        })
    }

    /// The shared result store.
    pub fn store(&self) -> &Arc<ResultStore> {
        &self.store
    }

    /// The configuration this service was built with.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }

    /// Fetch the results page for `query` and extract from it.
    ///
    /// `num_results` defaults to the configured value.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidRequest`] for a blank query, or the
    /// transport or parse error that stopped the search.
    pub async fn search(&self, query: &str, num_results: Option<usize>) -> Result<Vec<SearchResult>> {
        let query = validate_query(query)?;
        let n = num_results.unwrap_or(self.config.default_num_results);
        if n == 0 {
            return Ok(Vec::new());
        }
        tracing::trace!(query, n, "search");
        let markup = self.source.search_page(query).await?;
        self.search_markup(query, &markup, Some(n))
    }

    /// Extract from markup the caller already holds.
    ///
    /// When the pipeline finds nothing, a single placeholder result pointing
    /// at the results page for `query` is stored and returned instead.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError::InvalidRequest`] for a blank query, or
    /// [`ExtractError::Parse`] for markup with no elements.
    pub fn search_markup(
        &self,
        query: &str,
        markup: &str,
        num_results: Option<usize>,
    ) -> Result<Vec<SearchResult>> {
        let query = validate_query(query)?;
        let n = num_results.unwrap_or(self.config.default_num_results);
        let results = self.extractor.extract(markup, n, self.store.as_ref())?;
        if !results.is_empty() || n == 0 {
            tracing::debug!(count = results.len(), "search extracted results");
            return Ok(results);
        }

        tracing::debug!("no results extracted; storing placeholder");
        let placeholder = SearchResult {
            id: self.store.generate_id(ID_PREFIX),
            title: format!("Search results for \"{query}\""),
            link: search_url(&self.origin, query).into(),
            snippet: format!("No individual results could be extracted for \"{query}\"."),
        };
        self.store.put(placeholder.clone());
        Ok(vec![placeholder])
    }

    /// Look up a stored result by ID, after a cleanup pass.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NotFound`] for expired and unknown IDs alike.
    pub fn resolve(&self, id: &str) -> Result<SearchResult> {
        self.store.cleanup();
        self.store
            .get(id)
            .ok_or_else(|| ExtractError::NotFound(id.to_owned()).into())
    }

    /// Fetch and extract the page a stored result links to.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::NotFound`] for an unknown ID,
    /// [`ExtractError::NoLink`] if the result has no link, or the transport
    /// or content error that stopped the fetch.
    pub async fn fetch(&self, id: &str) -> Result<PageContent> {
        let result = self.resolve(id)?;
        if !result.has_link() {
            return Err(ExtractError::NoLink(id.to_owned()).into());
        }
        if let Some(cached) = self.pages.get(&result.link).await {
            return Ok(cached);
        }

        let html = self.source.page(&result.link).await?;
        let content = extract_content(&html, &result.link, self.config.http.max_page_chars)?;
        self.pages.insert(&result.link, content.clone()).await;
        Ok(content)
    }

    /// Current store occupancy and bounds.
    pub fn stats(&self) -> StoreStats {
        StoreStats {
            entries: self.store.len(),
            max_entries: self.store.max_entries(),
            ttl_seconds: self.store.ttl().as_secs(),
        }
    }
}

fn validate_query(query: &str) -> Result<&str> {
    let trimmed = query.trim();
    if trimmed.is_empty() {
        return Err(LookupError::InvalidRequest("query must not be empty".into()));
    }
    Ok(trimmed)
}
