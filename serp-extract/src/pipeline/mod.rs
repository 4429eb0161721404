//! Extraction pipeline: cascading block strategies, dedup, last-resort pass.
//!
//! # Pipeline
//!
//! 1. Try each [`BlockStrategy`] in priority order, scanning its matches in
//!    document order
//! 2. Skip advertisements, pagination, and message blocks ([`classify`])
//! 3. Resolve title, link, and snippet through their cascades ([`fields`])
//! 4. Normalise the link against the page origin ([`url_normalize`])
//! 5. Reject blocks with nothing at all; backfill missing title/snippet
//! 6. Drop candidates whose link was already accepted in this run
//! 7. Assign an ID, hand the record to the [`ResultSink`], append
//! 8. If nothing was accepted, run the last-resort anchor pass ([`fallback`])
//!
//! Stops as soon as the requested number of results is reached. Finding
//! nothing is not an error; only markup with no elements at all is.

pub mod classify;
pub mod fallback;
pub mod fields;
pub mod strategy;
pub mod url_normalize;

use std::collections::HashSet;

use scraper::{ElementRef, Html};
use url::Url;

use crate::config::ExtractConfig;
use crate::error::ExtractError;
use crate::store::ResultSink;
use crate::types::SearchResult;

use classify::{classify, BlockKind};
use fallback::AnchorPass;
use fields::{Candidate, ExtractContext, FieldSelectors};
use strategy::{default_strategies, BlockStrategy};
use url_normalize::{display_host, normalize_link};

/// Prefix for every ID generated by the pipeline.
pub const ID_PREFIX: &str = "result";

/// A compiled extraction pipeline.
///
/// Compiling selectors is the expensive part, so build one `Extractor` and
/// reuse it across pages.
#[derive(Debug)]
pub struct Extractor {
    config: ExtractConfig,
    origin: Url,
    strategies: Vec<BlockStrategy>,
    selectors: FieldSelectors,
    anchors: AnchorPass,
}

impl Extractor {
    /// Build a pipeline with the built-in strategy list.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Config`] for an invalid config, or
    /// [`ExtractError::Parse`] if a built-in selector fails to compile.
    pub fn new(config: ExtractConfig) -> Result<Self, ExtractError> {
        Self::with_strategies(config, default_strategies()?)
    }

    /// Build a pipeline with a caller-supplied strategy list, tried in order.
    ///
    /// # Errors
    ///
    /// Same as [`Extractor::new`].
    pub fn with_strategies(
        config: ExtractConfig,
        strategies: Vec<BlockStrategy>,
    ) -> Result<Self, ExtractError> {
        config.validate()?;
        let origin = config.origin_url()?;
        Ok(Self {
            config,
            origin,
            strategies,
            selectors: FieldSelectors::new()?,
            anchors: AnchorPass::new()?,
        })
    }

    /// The configuration this pipeline was built with.
    pub fn config(&self) -> &ExtractConfig {
        &self.config
    }

    /// Extract up to `num_results` results from `markup`, in document order.
    ///
    /// Each accepted result gets an ID from `sink` and is handed to
    /// [`ResultSink::store`] before being appended to the output.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] if `markup` is empty or contains no
    /// element markup at all. Every other input yields `Ok`, possibly empty.
    pub fn extract<S: ResultSink + ?Sized>(
        &self,
        markup: &str,
        num_results: usize,
        sink: &S,
    ) -> Result<Vec<SearchResult>, ExtractError> {
        if num_results == 0 {
            return Ok(Vec::new());
        }
        ensure_markup(markup)?;
        tracing::trace!(bytes = markup.len(), num_results, "extracting results");

        let document = Html::parse_document(markup);
        let ctx = ExtractContext {
            origin: &self.origin,
            config: &self.config,
            selectors: &self.selectors,
        };
        let mut run = Run::new(num_results, sink);

        for (index, strategy) in self.strategies.iter().enumerate() {
            if run.is_full() {
                break;
            }
            let before = run.len();
            let earlier = &self.strategies[..index];

            for block in document.select(&strategy.container) {
                if run.is_full() {
                    break;
                }
                let kind = classify(block);
                if kind != BlockKind::Result {
                    tracing::trace!(strategy = strategy.name, ?kind, "skipping block");
                    continue;
                }
                if covered_by(block, earlier) {
                    continue;
                }
                let candidate = strategy.extractor.extract(block, &ctx);
                run.accept(candidate, &ctx);
            }

            tracing::debug!(
                strategy = strategy.name,
                accepted = run.len() - before,
                "strategy finished"
            );
        }

        if run.len() == 0 {
            self.anchors.run(&document, &ctx, &mut run);
            tracing::debug!(accepted = run.len(), "last-resort anchor pass finished");
        }

        Ok(run.finish())
    }
}

/// Accumulates accepted results for one extraction run.
pub(crate) struct Run<'s, S: ?Sized> {
    limit: usize,
    sink: &'s S,
    results: Vec<SearchResult>,
    seen_links: HashSet<String>,
}

impl<'s, S: ResultSink + ?Sized> Run<'s, S> {
    fn new(limit: usize, sink: &'s S) -> Self {
        Self {
            limit,
            sink,
            results: Vec::new(),
            seen_links: HashSet::new(),
        }
    }

    pub(crate) fn is_full(&self) -> bool {
        self.results.len() >= self.limit
    }

    fn len(&self) -> usize {
        self.results.len()
    }

    /// Normalise, backfill, dedup, and store a candidate.
    ///
    /// Returns `true` if the candidate was accepted.
    pub(crate) fn accept(&mut self, candidate: Candidate, ctx: &ExtractContext<'_>) -> bool {
        let link = normalize_link(&candidate.link, ctx.origin);

        if candidate.title.is_empty() && link.is_empty() && candidate.snippet.is_empty() {
            tracing::trace!("rejecting empty block");
            return false;
        }
        if !link.is_empty() && self.seen_links.contains(&link) {
            tracing::trace!(%link, "skipping duplicate link");
            return false;
        }

        let host = display_host(&link).unwrap_or_else(|| link.clone());
        let title = if !candidate.title.is_empty() {
            candidate.title
        } else if !link.is_empty() {
            format!("Result from {host}")
        } else if !candidate.leading_text.is_empty() {
            candidate.leading_text
        } else {
            format!("Result {}", self.results.len() + 1)
        };
        let snippet = if !candidate.snippet.is_empty() {
            candidate.snippet
        } else if !link.is_empty() {
            format!("Result from {host}")
        } else {
            title.clone()
        };

        let record = SearchResult {
            id: self.sink.generate_id(ID_PREFIX),
            title,
            link,
            snippet,
        };
        self.sink.store(record.clone());
        if record.has_link() {
            self.seen_links.insert(record.link.clone());
        }
        self.results.push(record);
        true
    }

    fn finish(self) -> Vec<SearchResult> {
        self.results
    }
}

/// Reject input the HTML parser would only turn into an empty document.
fn ensure_markup(markup: &str) -> Result<(), ExtractError> {
    let trimmed = markup.trim();
    if trimmed.is_empty() {
        return Err(ExtractError::Parse("markup is empty".into()));
    }
    if !trimmed.contains('<') {
        return Err(ExtractError::Parse("markup contains no elements".into()));
    }
    Ok(())
}

/// Whether a higher-priority strategy already owns one of `block`'s ancestors.
fn covered_by(block: ElementRef<'_>, earlier: &[BlockStrategy]) -> bool {
    !earlier.is_empty()
        && block
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| earlier.iter().any(|s| s.container.matches(&ancestor)))
}
