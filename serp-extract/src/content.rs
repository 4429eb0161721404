//! Readable-text extraction for a linked page.
//!
//! Walks the DOM of the main content area, skipping boilerplate subtrees
//! (scripts, styles, navigation, page chrome), and returns plain text with
//! paragraph breaks preserved.

use scraper::{ElementRef, Html, Node, Selector};

use crate::error::{ExtractError, Result};
use crate::types::PageContent;

/// Subtrees whose text is never content.
const BOILERPLATE: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "noscript", "svg", "iframe", "form",
    "template",
];

/// Elements that start a new line of text.
const BLOCK_ELEMENTS: &[&str] = &[
    "p", "div", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "br", "tr", "section",
    "article", "main", "blockquote", "pre", "table", "dd", "dt",
];

/// Main-content containers, most specific first.
const CONTENT_ROOTS: &[&str] = &["article", "main", "[role=\"main\"]", "#content", "body"];

const TRUNCATION_MARKER: &str = "\n\n[Content truncated]";

/// Extract readable text from `html`, capped at `max_chars` characters.
///
/// # Errors
///
/// Returns [`ExtractError::Parse`] if no content root yields any text.
pub fn extract_content(html: &str, url: &str, max_chars: usize) -> Result<PageContent> {
    let document = Html::parse_document(html);

    let text = CONTENT_ROOTS
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .filter_map(|sel| document.select(&sel).next())
        .map(|root| {
            let mut raw = String::new();
            collect_text(root, &mut raw);
            normalise_whitespace(&raw)
        })
        .find(|text| !text.is_empty())
        .ok_or_else(|| ExtractError::Parse("no extractable content found".into()))?;

    let text = truncate_to_limit(&text, max_chars);
    let word_count = text.split_whitespace().count();
    tracing::debug!(url, word_count, "extracted page content");

    Ok(PageContent {
        url: url.to_owned(),
        title: page_title(&document),
        text,
        word_count,
    })
}

/// `<title>`, or the first `<h1>` when the head has none.
fn page_title(document: &Html) -> String {
    ["title", "h1"]
        .iter()
        .filter_map(|css| Selector::parse(css).ok())
        .filter_map(|sel| {
            document
                .select(&sel)
                .next()
                .map(|el| el.text().collect::<Vec<_>>().join(" "))
        })
        .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" "))
        .find(|t| !t.is_empty())
        .unwrap_or_default()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                let name = element.name();
                if BOILERPLATE.contains(&name) {
                    continue;
                }
                let block = BLOCK_ELEMENTS.contains(&name);
                if block {
                    out.push('\n');
                }
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

/// Collapse spaces within lines and keep at most one blank line between
/// paragraphs.
fn normalise_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut blank_run = 0usize;
    for line in text.lines() {
        let line = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.is_empty() {
            blank_run += 1;
            continue;
        }
        if !out.is_empty() {
            out.push_str(if blank_run > 1 { "\n\n" } else { "\n" });
        }
        out.push_str(&line);
        blank_run = 0;
    }
    out
}

fn truncate_to_limit(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_owned(),
        Some((end, _)) => {
            let mut truncated = text[..end].trim_end().to_owned();
            truncated.push_str(TRUNCATION_MARKER);
            truncated
        }
    }
}
