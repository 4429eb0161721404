//! Field resolution cascades for a single result block.
//!
//! Each field is resolved by trying structural patterns from most to least
//! specific until one yields something:
//!
//! | Level | Title                          | Link                         |
//! |-------|--------------------------------|------------------------------|
//! | 1     | heading anchor (`h2 a`)        | heading anchor               |
//! | 2     | compact title container        | compact layout anchor        |
//! | 3     | any prominent anchor           | any anchor with a usable URL |
//! | 4     | bare heading text              | heading's own attributes     |
//!
//! Snippets come from the caption paragraph, the caption, a line-clamped
//! summary, and finally the block's own text with the title removed.

use scraper::{ElementRef, Selector};
use url::Url;

use crate::config::ExtractConfig;
use crate::error::ExtractError;

use super::url_normalize::is_redirect_wrapper;

/// Attributes a link may live in. Richer cards and redirect variants move
/// the destination out of `href`.
const LINK_ATTRS: &[&str] = &["href", "data-href", "data-url"];

/// Compiled selectors shared by every block extractor.
#[derive(Debug)]
pub struct FieldSelectors {
    heading_anchor: Selector,
    compact_title: Selector,
    compact_anchor: Selector,
    prominent_anchor: Selector,
    heading: Selector,
    caption_paragraph: Selector,
    caption: Selector,
    line_clamp: Selector,
}

impl FieldSelectors {
    /// Compile the field selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Parse`] if a selector fails to compile.
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            heading_anchor: compile("h2 a, h3 a")?,
            compact_title: compile(".b_tpcn .tptt, .b_title .tptt, .b_algoheader .tptt")?,
            compact_anchor: compile(".b_tpcn a, .b_title a, .b_algoheader a")?,
            prominent_anchor: compile("a[href], a[data-href], a[data-url]")?,
            heading: compile("h2, h3")?,
            caption_paragraph: compile(".b_caption p")?,
            caption: compile(".b_caption")?,
            line_clamp: compile("[class*=\"b_lineclamp\"], .b_algoSlug")?,
        })
    }

    pub(crate) fn heading(&self) -> &Selector {
        &self.heading
    }

    pub(crate) fn caption(&self) -> &Selector {
        &self.caption
    }

    pub(crate) fn caption_paragraph(&self) -> &Selector {
        &self.caption_paragraph
    }
}

/// Shared, read-only state for one extraction run.
pub struct ExtractContext<'a> {
    /// Origin that relative links are resolved against.
    pub origin: &'a Url,
    /// Pipeline limits.
    pub config: &'a ExtractConfig,
    /// Compiled field selectors.
    pub selectors: &'a FieldSelectors,
}

/// Fields resolved from one block, before normalisation and backfill.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Candidate {
    /// Resolved title, possibly empty.
    pub title: String,
    /// Raw link as found in the markup, possibly empty.
    pub link: String,
    /// Resolved snippet, possibly empty.
    pub snippet: String,
    /// Leading text of the block, used to backfill a missing title.
    pub leading_text: String,
}

/// What a single anchor contributes to link resolution.
pub(crate) enum LinkLookup {
    /// A usable destination.
    Found(String),
    /// The anchor only points at a redirect wrapper.
    Rejected,
    /// Nothing link-like here; keep looking.
    Absent,
}

/// Resolve the title through the four-level cascade.
pub fn resolve_title(block: ElementRef<'_>, ctx: &ExtractContext<'_>) -> String {
    let s = ctx.selectors;
    [&s.heading_anchor, &s.compact_title, &s.prominent_anchor, &s.heading]
        .into_iter()
        .find_map(|sel| first_text(block, sel))
        .unwrap_or_default()
}

/// Resolve the link through the same structural order as the title.
///
/// The first anchor carrying any link decides: a usable URL is returned as
/// found; a redirect wrapper yields an empty link rather than a guess.
pub fn resolve_link(block: ElementRef<'_>, ctx: &ExtractContext<'_>) -> String {
    let s = ctx.selectors;
    for sel in [&s.heading_anchor, &s.compact_anchor, &s.prominent_anchor, &s.heading] {
        for el in block.select(sel) {
            match link_of(el, ctx.origin) {
                LinkLookup::Found(link) => return link,
                LinkLookup::Rejected => {
                    tracing::trace!("link rejected: redirect wrapper");
                    return String::new();
                }
                LinkLookup::Absent => {}
            }
        }
    }
    String::new()
}

/// Resolve the snippet: caption paragraph, caption, line-clamped summary,
/// then the block's text minus `title`. Every source is capped at
/// `snippet_max_chars`.
pub fn resolve_snippet(block: ElementRef<'_>, title: &str, ctx: &ExtractContext<'_>) -> String {
    let s = ctx.selectors;
    let text = [&s.caption_paragraph, &s.caption, &s.line_clamp]
        .into_iter()
        .find_map(|sel| first_text(block, sel))
        .unwrap_or_else(|| {
            let text = element_text(block);
            if title.is_empty() {
                text
            } else {
                collapse_whitespace(&text.replacen(title, "", 1))
            }
        });
    truncate_chars(&text, ctx.config.snippet_max_chars)
}

/// Run the full standard cascade over a block.
pub fn resolve_block(block: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Candidate {
    let title = resolve_title(block, ctx);
    let link = resolve_link(block, ctx);
    let snippet = resolve_snippet(block, &title, ctx);
    let leading_text = truncate_chars(&element_text(block), ctx.config.leading_title_chars);
    Candidate {
        title,
        link,
        snippet,
        leading_text,
    }
}

/// Text of the first element matching `sel` that has any, whitespace-collapsed.
pub(crate) fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope
        .select(sel)
        .map(element_text)
        .find(|text| !text.is_empty())
}

/// All text under `el`, with runs of whitespace collapsed to single spaces.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<Vec<_>>().join(" "))
}

/// Best link carried by a single element, checked attribute by attribute.
pub(crate) fn link_of(el: ElementRef<'_>, origin: &Url) -> LinkLookup {
    let mut saw_redirect = false;
    for attr in LINK_ATTRS {
        let Some(value) = el.value().attr(attr).map(str::trim) else {
            continue;
        };
        if is_pseudo_link(value) {
            continue;
        }
        if is_redirect_wrapper(value, origin) {
            saw_redirect = true;
            continue;
        }
        return LinkLookup::Found(value.to_string());
    }
    if saw_redirect {
        LinkLookup::Rejected
    } else {
        LinkLookup::Absent
    }
}

/// Empty values, in-page anchors, and script pseudo-URLs.
pub(crate) fn is_pseudo_link(value: &str) -> bool {
    value.is_empty()
        || value.starts_with('#')
        || value
            .get(..11)
            .is_some_and(|scheme| scheme.eq_ignore_ascii_case("javascript:"))
}

/// Collapse all whitespace runs to single spaces and trim.
pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cap `text` at `max_chars` characters, appending `...` when cut.
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.truncate(cut.trim_end().len());
    cut.push_str("...");
    cut
}

pub(crate) fn compile(css: &str) -> Result<Selector, ExtractError> {
    Selector::parse(css).map_err(|e| ExtractError::Parse(format!("invalid selector {css:?}: {e:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn with_block<F: FnOnce(ElementRef<'_>, &ExtractContext<'_>)>(html: &str, f: F) {
        let doc = Html::parse_document(html);
        let block_sel = Selector::parse(".blk").expect("selector");
        let block = doc.select(&block_sel).next().expect("block present");
        let origin = Url::parse("https://www.bing.com").expect("origin");
        let config = ExtractConfig::default();
        let selectors = FieldSelectors::new().expect("selectors");
        let ctx = ExtractContext {
            origin: &origin,
            config: &config,
            selectors: &selectors,
        };
        f(block, &ctx);
    }

    #[test]
    fn title_from_heading_anchor() {
        with_block(
            r#"<div class="blk"><h2><a href="https://a.com/">Heading Link</a></h2><a href="https://b.com/">Other</a></div>"#,
            |block, ctx| {
                assert_eq!(resolve_title(block, ctx), "Heading Link");
                assert_eq!(resolve_link(block, ctx), "https://a.com/");
            },
        );
    }

    #[test]
    fn title_from_compact_layout() {
        with_block(
            r#"<div class="blk"><div class="b_tpcn"><a class="tilk" href="https://c.com/page"><div class="tptt">Compact Title</div></a></div></div>"#,
            |block, ctx| {
                assert_eq!(resolve_title(block, ctx), "Compact Title");
                assert_eq!(resolve_link(block, ctx), "https://c.com/page");
            },
        );
    }

    #[test]
    fn title_from_prominent_anchor() {
        with_block(
            r#"<div class="blk"><span>prefix</span><a href="/local">Anchor Title</a></div>"#,
            |block, ctx| {
                assert_eq!(resolve_title(block, ctx), "Anchor Title");
                assert_eq!(resolve_link(block, ctx), "/local");
            },
        );
    }

    #[test]
    fn title_from_bare_heading() {
        with_block(
            r#"<div class="blk"><h3>Plain Heading</h3><p>body</p></div>"#,
            |block, ctx| {
                assert_eq!(resolve_title(block, ctx), "Plain Heading");
                assert_eq!(resolve_link(block, ctx), "");
            },
        );
    }

    #[test]
    fn alternate_attribute_used_when_href_missing() {
        with_block(
            r#"<div class="blk"><h2><a data-href="https://card.example.com/">Card</a></h2></div>"#,
            |block, ctx| {
                assert_eq!(resolve_link(block, ctx), "https://card.example.com/");
            },
        );
    }

    #[test]
    fn alternate_attribute_used_when_href_is_redirect() {
        with_block(
            r#"<div class="blk"><h2><a href="https://www.bing.com/ck/a?u=abc" data-url="https://real.example.com/">Card</a></h2></div>"#,
            |block, ctx| {
                assert_eq!(resolve_link(block, ctx), "https://real.example.com/");
            },
        );
    }

    #[test]
    fn redirect_only_link_left_empty() {
        with_block(
            r#"<div class="blk"><h2><a href="https://www.bing.com/ck/a?!&&p=xyz">Wrapped</a></h2><a href="https://elsewhere.com/">Cached</a></div>"#,
            |block, ctx| {
                assert_eq!(resolve_link(block, ctx), "");
                assert_eq!(resolve_title(block, ctx), "Wrapped");
            },
        );
    }

    #[test]
    fn pseudo_links_skipped() {
        with_block(
            r##"<div class="blk"><a href="#">More</a><a href="javascript:void(0)">Menu</a><a href="https://ok.com/">Real</a></div>"##,
            |block, ctx| {
                assert_eq!(resolve_link(block, ctx), "https://ok.com/");
            },
        );
    }

    #[test]
    fn snippet_prefers_caption_paragraph() {
        with_block(
            r#"<div class="blk"><h2>T</h2><div class="b_caption"><div class="meta">meta</div><p>The paragraph.</p></div></div>"#,
            |block, ctx| {
                assert_eq!(resolve_snippet(block, "T", ctx), "The paragraph.");
            },
        );
    }

    #[test]
    fn snippet_falls_back_to_caption_text() {
        with_block(
            r#"<div class="blk"><h2>T</h2><div class="b_caption">Caption   text only</div></div>"#,
            |block, ctx| {
                assert_eq!(resolve_snippet(block, "T", ctx), "Caption text only");
            },
        );
    }

    #[test]
    fn snippet_falls_back_to_line_clamp() {
        with_block(
            r#"<div class="blk"><h2>T</h2><div class="b_lineclamp3">Clamped summary</div></div>"#,
            |block, ctx| {
                assert_eq!(resolve_snippet(block, "T", ctx), "Clamped summary");
            },
        );
    }

    #[test]
    fn snippet_from_block_text_without_title() {
        with_block(
            r#"<div class="blk"><h2>My Title</h2><span>Loose description here</span></div>"#,
            |block, ctx| {
                assert_eq!(
                    resolve_snippet(block, "My Title", ctx),
                    "Loose description here"
                );
            },
        );
    }

    #[test]
    fn snippet_from_caption_paragraph_is_capped() {
        let long = "word ".repeat(2000);
        let html = format!(
            r#"<div class="blk"><h2>T</h2><div class="b_caption"><p>{long}</p></div></div>"#
        );
        with_block(&html, |block, ctx| {
            let snippet = resolve_snippet(block, "T", ctx);
            assert!(snippet.starts_with("word word"));
            assert!(snippet.ends_with("..."));
            assert!(snippet.chars().count() <= ctx.config.snippet_max_chars + 3);
        });
    }

    #[test]
    fn snippet_from_line_clamp_is_capped() {
        let long = "x".repeat(500);
        let html = format!(r#"<div class="blk"><div class="b_lineclamp2">{long}</div></div>"#);
        with_block(&html, |block, ctx| {
            let snippet = resolve_snippet(block, "", ctx);
            assert_eq!(snippet.chars().count(), ctx.config.snippet_max_chars + 3);
        });
    }

    #[test]
    fn snippet_from_block_text_is_capped() {
        let long = "word ".repeat(200);
        let html = format!(r#"<div class="blk"><h2>T</h2><span>{long}</span></div>"#);
        with_block(&html, |block, ctx| {
            let snippet = resolve_snippet(block, "T", ctx);
            assert!(snippet.ends_with("..."));
            assert!(snippet.chars().count() <= ctx.config.snippet_max_chars + 3);
        });
    }

    #[test]
    fn truncate_chars_respects_multibyte() {
        let text = "é".repeat(10);
        let cut = truncate_chars(&text, 4);
        assert_eq!(cut, "éééé...");
    }

    #[test]
    fn truncate_chars_short_text_untouched() {
        assert_eq!(truncate_chars("short", 10), "short");
    }

    #[test]
    fn pseudo_link_detection() {
        assert!(is_pseudo_link(""));
        assert!(is_pseudo_link("#top"));
        assert!(is_pseudo_link("JavaScript:void(0)"));
        assert!(!is_pseudo_link("/path"));
    }
}
