//! Structural classification of candidate blocks.
//!
//! Advertisements, pagination controls, and informational messages share
//! container markup with real results. They are told apart by class and
//! role on the block or any of its ancestors, never by their text.

use scraper::ElementRef;

const AD_CLASSES: &[&str] = &[
    "b_ad",
    "b_adTop",
    "b_adBottom",
    "b_adLastChild",
    "b_adSlug",
    "result--ad",
];

const PAGINATION_CLASSES: &[&str] = &["b_pag", "sb_pagN", "sb_pagP", "pagination"];

const MESSAGE_CLASSES: &[&str] = &["b_msg", "b_no", "b_algoMsg"];

/// What a matched block actually is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A genuine result block.
    Result,
    /// Sponsored content.
    Advertisement,
    /// Page navigation ("Next", page numbers).
    Pagination,
    /// Informational notice ("Including results for…", "No results").
    Message,
}

/// Classify a block by its own and its ancestors' class and role.
pub fn classify(block: ElementRef<'_>) -> BlockKind {
    std::iter::once(block)
        .chain(block.ancestors().filter_map(ElementRef::wrap))
        .map(classify_element)
        .find(|kind| *kind != BlockKind::Result)
        .unwrap_or(BlockKind::Result)
}

fn classify_element(el: ElementRef<'_>) -> BlockKind {
    let value = el.value();
    let has_any = |names: &[&str]| value.classes().any(|c| names.contains(&c));

    if has_any(AD_CLASSES) || value.attr("data-ad").is_some() {
        BlockKind::Advertisement
    } else if has_any(PAGINATION_CLASSES) || value.attr("role") == Some("navigation") {
        BlockKind::Pagination
    } else if has_any(MESSAGE_CLASSES) || matches!(value.attr("role"), Some("alert" | "status")) {
        BlockKind::Message
    } else {
        BlockKind::Result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn kind_of(html: &str) -> BlockKind {
        let doc = Html::parse_document(html);
        let sel = Selector::parse(".target").expect("selector");
        let block = doc.select(&sel).next().expect("target present");
        classify(block)
    }

    #[test]
    fn plain_block_is_result() {
        assert_eq!(
            kind_of(r#"<ol id="b_results"><li class="b_algo target">x</li></ol>"#),
            BlockKind::Result
        );
    }

    #[test]
    fn ad_class_on_block() {
        assert_eq!(
            kind_of(r#"<li class="b_algo b_adTop target">x</li>"#),
            BlockKind::Advertisement
        );
    }

    #[test]
    fn ad_class_on_ancestor() {
        assert_eq!(
            kind_of(r#"<ol><li class="b_ad"><ul><li class="b_algo target">x</li></ul></li></ol>"#),
            BlockKind::Advertisement
        );
    }

    #[test]
    fn pagination_by_class_and_role() {
        assert_eq!(
            kind_of(r#"<li class="b_pag"><a class="target">2</a></li>"#),
            BlockKind::Pagination
        );
        assert_eq!(
            kind_of(r#"<div role="navigation"><a class="target">Next</a></div>"#),
            BlockKind::Pagination
        );
    }

    #[test]
    fn message_block() {
        assert_eq!(
            kind_of(r#"<li class="b_algo b_msg target">Including results for rust</li>"#),
            BlockKind::Message
        );
    }

    #[test]
    fn ad_text_alone_does_not_classify() {
        assert_eq!(
            kind_of(r#"<li class="b_algo target">Ad: buy now</li>"#),
            BlockKind::Result
        );
    }
}
