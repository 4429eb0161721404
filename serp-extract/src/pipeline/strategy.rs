//! Prioritised block strategies.
//!
//! A strategy pairs a container selector (one template variant's "this
//! subtree is one result") with a [`BlockExtractor`] that turns a matched
//! block into a [`Candidate`]. Strategies are tried in list order; a new
//! template variant is a new list entry.

use scraper::{ElementRef, Selector};

use crate::error::ExtractError;

use super::fields::{self, compile, Candidate, ExtractContext};

/// Turns one matched block into a candidate result.
pub trait BlockExtractor: Send + Sync {
    /// Resolve the block's fields. Never fails; missing fields stay empty.
    fn extract(&self, block: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Candidate;
}

/// The standard cascade: heading anchor, compact title, prominent anchor,
/// bare heading.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBlock;

impl BlockExtractor for StandardBlock {
    fn extract(&self, block: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Candidate {
        fields::resolve_block(block, ctx)
    }
}

/// Answer and featured-snippet cards.
///
/// These carry their headline and body in dedicated containers; the
/// standard cascade fills in anything those leave empty.
pub struct AnswerBlock {
    title: Selector,
    body: Selector,
}

impl AnswerBlock {
    /// Compile the answer-card selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] if a selector fails to compile.
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            title: compile(".b_focusLabel, .b_entityTitle, .b_ans_title")?,
            body: compile(".b_focusTextLarge, .b_focusTextMedium, .b_focusTextSmall, .b_entitySubTitle, .b_paractl")?,
        })
    }
}

impl BlockExtractor for AnswerBlock {
    fn extract(&self, block: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Candidate {
        let mut candidate = fields::resolve_block(block, ctx);
        if let Some(title) = fields::first_text(block, &self.title) {
            candidate.title = title;
        }
        if let Some(body) = fields::first_text(block, &self.body) {
            candidate.snippet = fields::truncate_chars(&body, ctx.config.snippet_max_chars);
        }
        candidate
    }
}

/// One entry in the prioritised strategy list.
pub struct BlockStrategy {
    /// Short name used in logs.
    pub name: &'static str,
    /// Matches the container of one result in this template variant.
    pub container: Selector,
    /// Resolves a matched container into a candidate.
    pub extractor: Box<dyn BlockExtractor>,
}

impl BlockStrategy {
    /// Build a strategy from a CSS container selector.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] if `container` fails to compile.
    pub fn new(
        name: &'static str,
        container: &str,
        extractor: impl BlockExtractor + 'static,
    ) -> Result<Self, ExtractError> {
        Ok(Self {
            name,
            container: compile(container)?,
            extractor: Box::new(extractor),
        })
    }
}

impl std::fmt::Debug for BlockStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockStrategy")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// The built-in strategies, most specific first.
///
/// 1. Standard algorithmic results.
/// 2. Answer / featured cards.
/// 3. Grouped results rendered inside a card deck.
///
/// # Errors
///
/// Returns [`ExtractError::Parse`] if a built-in selector fails to compile.
pub fn default_strategies() -> Result<Vec<BlockStrategy>, ExtractError> {
    Ok(vec![
        BlockStrategy::new("algorithmic", "li.b_algo, div.b_algo", StandardBlock)?,
        BlockStrategy::new("answer", "li.b_ans, div.b_ans, .b_top .b_ans", AnswerBlock::new()?)?,
        BlockStrategy::new("card", ".b_cards .b_card, .b_slidebar .slide", StandardBlock)?,
    ])
}
