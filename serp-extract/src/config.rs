//! Extraction, store, and transport configuration with sensible defaults.
//!
//! Every section deserialises with `#[serde(default)]` so a partial TOML
//! table only overrides the fields it names.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::ExtractError;

/// Configuration for the extraction pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Origin that relative result links are resolved against.
    pub origin: String,
    /// Maximum snippet length in characters, whatever the snippet's source.
    pub snippet_max_chars: usize,
    /// Anchor texts shorter than this are replaced by a nearby heading
    /// during the last-resort pass.
    pub min_anchor_title_chars: usize,
    /// Maximum length of a title derived from a block's leading text.
    pub leading_title_chars: usize,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            origin: "https://www.bing.com".into(),
            snippet_max_chars: 300,
            min_anchor_title_chars: 5,
            leading_title_chars: 80,
        }
    }
}

impl ExtractConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - `origin` must be an absolute `http`/`https` URL with a host
    /// - `snippet_max_chars`, `min_anchor_title_chars` and `leading_title_chars`
    ///   must be greater than 0
    pub fn validate(&self) -> Result<(), ExtractError> {
        self.origin_url()?;
        if self.snippet_max_chars == 0 {
            return Err(ExtractError::Config(
                "snippet_max_chars must be greater than 0".into(),
            ));
        }
        if self.min_anchor_title_chars == 0 {
            return Err(ExtractError::Config(
                "min_anchor_title_chars must be greater than 0".into(),
            ));
        }
        if self.leading_title_chars == 0 {
            return Err(ExtractError::Config(
                "leading_title_chars must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Parse [`origin`](Self::origin) into a [`Url`].
    pub fn origin_url(&self) -> Result<Url, ExtractError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ExtractError::Config(format!("invalid origin {:?}: {e}", self.origin)))?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(ExtractError::Config(format!(
                "origin must be an http(s) URL with a host, got {:?}",
                self.origin
            )));
        }
        Ok(url)
    }
}

/// Configuration for the ephemeral result store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Maximum age of a stored result, measured from insertion.
    pub ttl_seconds: u64,
    /// Maximum number of results retained after a cleanup pass.
    pub max_entries: usize,
    /// How often the background janitor runs a cleanup pass.
    pub cleanup_interval_seconds: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 3600,
            max_entries: 1000,
            cleanup_interval_seconds: 300,
        }
    }
}

impl StoreConfig {
    /// Validates this configuration. All three values must be non-zero.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.ttl_seconds == 0 {
            return Err(ExtractError::Config(
                "ttl_seconds must be greater than 0".into(),
            ));
        }
        if self.max_entries == 0 {
            return Err(ExtractError::Config(
                "max_entries must be greater than 0".into(),
            ));
        }
        if self.cleanup_interval_seconds == 0 {
            return Err(ExtractError::Config(
                "cleanup_interval_seconds must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}

/// Configuration for fetching markup over HTTP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Per-request timeout in seconds.
    pub timeout_seconds: u64,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
    /// How long fetched page content is cached, in seconds. 0 disables caching.
    pub page_cache_ttl_seconds: u64,
    /// Maximum characters of page text returned by a fetch.
    pub max_page_chars: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 8,
            user_agent: None,
            page_cache_ttl_seconds: 600,
            max_page_chars: 100_000,
        }
    }
}

impl HttpConfig {
    /// Validates this configuration.
    pub fn validate(&self) -> Result<(), ExtractError> {
        if self.timeout_seconds == 0 {
            return Err(ExtractError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.max_page_chars == 0 {
            return Err(ExtractError::Config(
                "max_page_chars must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
