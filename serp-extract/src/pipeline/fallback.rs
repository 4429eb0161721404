//! Last-resort pass: coarse anchor extraction.
//!
//! Runs only when no block strategy accepted anything. Every anchor inside a
//! known result-bearing container becomes a provisional result, minus
//! navigation (page anchors, script links, links back into the search).

use scraper::{ElementRef, Html, Selector};

use crate::error::ExtractError;
use crate::store::ResultSink;

use super::classify::{classify, BlockKind};
use super::fields::{self, compile, Candidate, ExtractContext, LinkLookup};
use super::url_normalize::{display_host, is_same_site_search, normalize_link};
use super::Run;

/// How far up from an anchor to look for a heading or caption.
const MAX_ANCESTOR_DEPTH: usize = 4;

/// Anchors inside containers that hold results on known page layouts.
#[derive(Debug)]
pub(crate) struct AnchorPass {
    anchors: Selector,
    any_anchor: Selector,
}

impl AnchorPass {
    pub(crate) fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            anchors: compile(
                "#b_results a, #b_content a, main a, [role=\"main\"] a, #links a, #search a",
            )?,
            any_anchor: compile("a[href], a[data-href], a[data-url]")?,
        })
    }

    /// Walk every qualifying anchor until `run` is full.
    pub(crate) fn run<S: ResultSink + ?Sized>(
        &self,
        document: &Html,
        ctx: &ExtractContext<'_>,
        run: &mut Run<'_, S>,
    ) {
        for anchor in document.select(&self.anchors) {
            if run.is_full() {
                break;
            }
            if classify(anchor) != BlockKind::Result {
                continue;
            }
            if let Some(candidate) = self.anchor_candidate(anchor, ctx) {
                run.accept(candidate, ctx);
            }
        }
    }

    /// Build a candidate from one anchor, or `None` if it is navigation.
    fn anchor_candidate(&self, anchor: ElementRef<'_>, ctx: &ExtractContext<'_>) -> Option<Candidate> {
        let LinkLookup::Found(raw) = fields::link_of(anchor, ctx.origin) else {
            tracing::trace!("skipping anchor without a usable link");
            return None;
        };
        if is_same_site_search(&raw, ctx.origin) {
            tracing::trace!(link = %raw, "skipping navigation anchor");
            return None;
        }

        let link = normalize_link(&raw, ctx.origin);
        let host = display_host(&link).unwrap_or_else(|| link.clone());

        let mut title = fields::element_text(anchor);
        if title.chars().count() < ctx.config.min_anchor_title_chars {
            if let Some(heading) =
                self.nearest(anchor, |el| fields::first_text(el, ctx.selectors.heading()))
            {
                title = heading;
            } else if title.is_empty() {
                title = format!("Result from {host}");
            }
        }

        let snippet = self
            .nearest(anchor, |el| {
                fields::first_text(el, ctx.selectors.caption_paragraph())
                    .or_else(|| fields::first_text(el, ctx.selectors.caption()))
            })
            .map(|text| fields::truncate_chars(&text, ctx.config.snippet_max_chars))
            .unwrap_or_else(|| format!("Result from {host}"));

        Some(Candidate {
            title,
            link,
            snippet,
            leading_text: String::new(),
        })
    }

    /// First value `probe` yields for the anchor's ancestors, nearest first.
    ///
    /// Stops at the first ancestor holding more than one link, since its
    /// headings and captions belong to other results.
    fn nearest<F>(&self, anchor: ElementRef<'_>, probe: F) -> Option<String>
    where
        F: Fn(ElementRef<'_>) -> Option<String>,
    {
        anchor
            .ancestors()
            .filter_map(ElementRef::wrap)
            .take(MAX_ANCESTOR_DEPTH)
            .take_while(|el| el.select(&self.any_anchor).nth(1).is_none())
            .find_map(probe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ExtractConfig;
    use crate::pipeline::fields::FieldSelectors;
    use url::Url;

    fn candidate_for(html: &str) -> Option<Candidate> {
        let doc = Html::parse_document(html);
        let sel = Selector::parse("a.target").expect("selector");
        let anchor = doc.select(&sel).next().expect("anchor");
        let origin = Url::parse("https://www.bing.com").expect("origin");
        let config = ExtractConfig::default();
        let selectors = FieldSelectors::new().expect("selectors");
        let ctx = ExtractContext {
            origin: &origin,
            config: &config,
            selectors: &selectors,
        };
        AnchorPass::new().expect("compile").anchor_candidate(anchor, &ctx)
    }

    #[test]
    fn plain_anchor_becomes_candidate() {
        let c = candidate_for(
            r#"<div id="b_results"><a class="target" href="https://docs.example.com/guide?utm_medium=x">Getting started guide</a></div>"#,
        )
        .expect("candidate");
        assert_eq!(c.title, "Getting started guide");
        assert_eq!(c.link, "https://docs.example.com/guide");
        assert_eq!(c.snippet, "Result from docs.example.com");
    }

    #[test]
    fn short_anchor_text_replaced_by_heading() {
        let c = candidate_for(
            r#"<div id="b_results"><div><h3>Rust Documentation</h3><a class="target" href="https://doc.rust-lang.org/">Go</a></div></div>"#,
        )
        .expect("candidate");
        assert_eq!(c.title, "Rust Documentation");
    }

    #[test]
    fn snippet_from_ancestor_caption() {
        let c = candidate_for(
            r#"<div id="b_results"><div><a class="target" href="https://a.example.com/">A long enough title</a><div class="b_caption"><p>Caption text</p></div></div></div>"#,
        )
        .expect("candidate");
        assert_eq!(c.snippet, "Caption text");
    }

    #[test]
    fn caption_of_a_neighbouring_result_not_borrowed() {
        let c = candidate_for(
            r#"<div id="b_results">
                <div><a href="https://one.example.com/">First result title</a><div class="b_caption"><p>First caption</p></div></div>
                <div><a class="target" href="https://two.example.com/">Second result title</a></div>
            </div>"#,
        )
        .expect("candidate");
        assert_eq!(c.snippet, "Result from two.example.com");
    }

    #[test]
    fn alternate_attribute_used_when_href_is_not_a_link() {
        let c = candidate_for(
            r##"<div id="b_results"><a class="target" href="#" data-url="https://real.example.com/page">Real page title</a></div>"##,
        )
        .expect("candidate");
        assert_eq!(c.link, "https://real.example.com/page");

        let c = candidate_for(
            r#"<div id="b_results"><a class="target" href="javascript:void(0)" data-href="https://card.example.com/">Card result</a></div>"#,
        )
        .expect("candidate");
        assert_eq!(c.link, "https://card.example.com/");
    }

    #[test]
    fn alternate_attribute_used_when_href_is_redirect() {
        let c = candidate_for(
            r#"<div id="b_results"><a class="target" href="/ck/a?!&&p=abc" data-url="https://real.example.com/page">Wrapped result</a></div>"#,
        )
        .expect("candidate");
        assert_eq!(c.link, "https://real.example.com/page");
    }

    #[test]
    fn redirect_only_anchor_rejected() {
        assert!(candidate_for(
            r#"<div id="b_results"><a class="target" href="https://www.bing.com/ck/a?u=abc">Wrapped only</a></div>"#
        )
        .is_none());
    }

    #[test]
    fn navigation_anchors_rejected() {
        assert!(candidate_for(r##"<main><a class="target" href="#top">Back to top</a></main>"##).is_none());
        assert!(candidate_for(r#"<main><a class="target" href="javascript:void(0)">Menu</a></main>"#).is_none());
        assert!(candidate_for(r#"<main><a class="target" href="/search?q=rust+book">rust book</a></main>"#).is_none());
        assert!(candidate_for(r#"<main><a class="target">No link</a></main>"#).is_none());
    }
}
