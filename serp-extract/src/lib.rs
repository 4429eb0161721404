//! # serp-extract
//!
//! Fault-tolerant extraction of search results from a results page, plus an
//! ephemeral, ID-addressable store for what was extracted.
//!
//! ## Design
//!
//! - Result blocks are found by a prioritised list of structural strategies;
//!   each field (title, link, snippet) has its own fallback cascade
//! - Ads, pagination, and notices are rejected by structure, never by text
//! - Redirect-wrapper links are left empty rather than guessed at
//! - Links are made absolute and stripped of tracking parameters, then
//!   deduplicated within a run
//! - A coarse anchor pass runs only when every strategy comes up empty
//! - Accepted results are handed to a [`ResultSink`]; [`ResultStore`] keeps
//!   them under TTL and capacity bounds so "result 3" can be resolved later
//!
//! ## Security
//!
//! - No network listeners; this is a library
//! - Queries are logged only at trace level
//! - Result IDs carry a random component and cannot be enumerated

pub mod cache;
pub mod config;
pub mod content;
pub mod error;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod types;

pub use cache::PageCache;
pub use config::{ExtractConfig, HttpConfig, StoreConfig};
pub use error::{ExtractError, Result};
pub use pipeline::Extractor;
pub use source::{HttpSource, MarkupSource};
pub use store::{CleanupReport, ResultSink, ResultStore};
pub use types::{PageContent, SearchResult};

/// Extract up to `num_results` results from `markup`.
///
/// Builds a one-off [`Extractor`] from `config`; prefer holding an
/// [`Extractor`] when extracting repeatedly.
///
/// # Errors
///
/// Returns [`ExtractError::Config`] for an invalid `config`, or
/// [`ExtractError::Parse`] if `markup` has no element markup at all. A page
/// that simply has no results yields `Ok(vec![])`.
///
/// # Examples
///
/// ```
/// use serp_extract::{ExtractConfig, ResultStore};
///
/// let html = r#"<ol id="b_results"><li class="b_algo">
///     <h2><a href="https://www.rust-lang.org/">Rust</a></h2>
///     <div class="b_caption"><p>A language empowering everyone.</p></div>
/// </li></ol>"#;
///
/// let store = ResultStore::default();
/// let results = serp_extract::extract(html, 5, &ExtractConfig::default(), &store)?;
/// assert_eq!(results[0].title, "Rust");
/// assert_eq!(store.get(&results[0].id).as_ref(), Some(&results[0]));
/// # Ok::<(), serp_extract::ExtractError>(())
/// ```
pub fn extract<S: ResultSink + ?Sized>(
    markup: &str,
    num_results: usize,
    config: &ExtractConfig,
    sink: &S,
) -> Result<Vec<SearchResult>> {
    Extractor::new(config.clone())?.extract(markup, num_results, sink)
}
