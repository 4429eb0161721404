//! Where markup comes from.
//!
//! The pipeline itself never touches the network. A [`MarkupSource`]
//! supplies the results page for a query and the raw HTML of a linked
//! page; [`HttpSource`] does both over HTTP with browser-like headers.

use std::future::Future;
use std::time::Duration;

use rand::seq::SliceRandom;
use url::Url;

use crate::config::{ExtractConfig, HttpConfig};
use crate::error::ExtractError;

/// Realistic browser User-Agent strings, rotated per client.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:133.0) Gecko/20100101 Firefox/133.0",
];

/// Supplies markup for the pipeline.
///
/// Implementations must be `Send + Sync` so one source can serve
/// concurrent requests.
pub trait MarkupSource: Send + Sync {
    /// Fetch the results page for `query`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the page cannot be retrieved.
    fn search_page(&self, query: &str) -> impl Future<Output = Result<String, ExtractError>> + Send;

    /// Fetch the raw HTML at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Http`] if the page cannot be retrieved.
    fn page(&self, url: &str) -> impl Future<Output = Result<String, ExtractError>> + Send;
}

/// Build the results-page URL for `query` on `origin`.
pub fn search_url(origin: &Url, query: &str) -> Url {
    let mut url = origin.clone();
    url.set_path("/search");
    url.set_fragment(None);
    url.query_pairs_mut()
        .clear()
        .append_pair("q", query)
        .append_pair("setlang", "en");
    url
}

/// [`MarkupSource`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpSource {
    client: reqwest::Client,
    origin: Url,
}

impl HttpSource {
    /// Build a source for the origin in `extract`, using the timeout and
    /// User-Agent from `http`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] for an invalid origin, or
    /// [`ExtractError::Http`] if the client cannot be constructed.
    pub fn new(extract: &ExtractConfig, http: &HttpConfig) -> Result<Self, ExtractError> {
        let origin = extract.origin_url()?;
        let ua = match &http.user_agent {
            Some(custom) => custom.clone(),
            None => random_user_agent().to_owned(),
        };

        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(Duration::from_secs(http.timeout_seconds))
            .user_agent(ua)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| ExtractError::Http(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client, origin })
    }

    async fn get_text(&self, url: &str) -> Result<String, ExtractError> {
        let response = self
            .client
            .get(url)
            .header("Accept", "text/html,application/xhtml+xml")
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| ExtractError::Http(format!("request failed: {e}")))?
            .error_for_status()
            .map_err(|e| ExtractError::Http(format!("bad status: {e}")))?;

        let body = response
            .text()
            .await
            .map_err(|e| ExtractError::Http(format!("response read failed: {e}")))?;
        tracing::trace!(bytes = body.len(), "response received");
        Ok(body)
    }
}

impl MarkupSource for HttpSource {
    async fn search_page(&self, query: &str) -> Result<String, ExtractError> {
        tracing::trace!(query, "fetching results page");
        self.get_text(search_url(&self.origin, query).as_str()).await
    }

    async fn page(&self, url: &str) -> Result<String, ExtractError> {
        let parsed = Url::parse(url)
            .map_err(|e| ExtractError::Http(format!("invalid URL {url:?}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ExtractError::Http(format!(
                "unsupported scheme {:?}",
                parsed.scheme()
            )));
        }
        tracing::trace!(url, "fetching page");
        self.get_text(parsed.as_str()).await
    }
}

/// Pick a User-Agent from the rotation list.
pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin() -> Url {
        Url::parse("https://www.bing.com").expect("origin")
    }

    #[test]
    fn search_url_encodes_query() {
        let url = search_url(&origin(), "rust & tokio");
        assert_eq!(
            url.as_str(),
            "https://www.bing.com/search?q=rust+%26+tokio&setlang=en"
        );
    }

    #[test]
    fn search_url_ignores_origin_path() {
        let base = Url::parse("https://www.bing.com/some/path?x=1#frag").expect("origin");
        let url = search_url(&base, "q");
        assert_eq!(url.as_str(), "https://www.bing.com/search?q=q&setlang=en");
    }

    #[test]
    fn random_user_agent_from_list() {
        assert!(USER_AGENTS.contains(&random_user_agent()));
    }

    #[test]
    fn build_source_with_defaults() {
        let source = HttpSource::new(&ExtractConfig::default(), &HttpConfig::default());
        assert!(source.is_ok());
    }

    #[test]
    fn build_source_rejects_bad_origin() {
        let extract = ExtractConfig {
            origin: "ftp://files.example.com".into(),
            ..Default::default()
        };
        let err = HttpSource::new(&extract, &HttpConfig::default()).unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)));
    }

    #[tokio::test]
    async fn page_rejects_non_http_scheme() {
        let source = HttpSource::new(&ExtractConfig::default(), &HttpConfig::default())
            .expect("source");
        let err = source.page("file:///etc/passwd").await.unwrap_err();
        assert!(err.to_string().contains("unsupported scheme"));
    }

    #[test]
    fn source_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpSource>();
    }

    #[tokio::test]
    #[ignore] // Live test: run with `cargo test -- --ignored`
    async fn live_search_page() {
        let source = HttpSource::new(&ExtractConfig::default(), &HttpConfig::default())
            .expect("source");
        let html = source.search_page("rust programming language").await;
        assert!(html.is_ok_and(|h| h.contains("<html")));
    }
}
