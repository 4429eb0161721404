//! Core types for extracted results and fetched page content.

use serde::{Deserialize, Serialize};
use std::time::Instant;

/// A single search hit extracted from a result page.
///
/// Immutable once accepted by the pipeline. `title` is always non-empty
/// and at least one of `link` / `snippet` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Opaque identifier, unique for the lifetime of the process.
    pub id: String,
    /// Human-readable label for the hit.
    pub title: String,
    /// Absolute, normalised URL, or empty when no plausible link was found.
    pub link: String,
    /// Descriptive text, length-capped.
    pub snippet: String,
}

impl SearchResult {
    /// Returns `true` if the result carries a dereferenceable link.
    pub fn has_link(&self) -> bool {
        !self.link.is_empty()
    }
}

/// A [`SearchResult`] as held by the store, stamped with its insertion time.
///
/// The stamp is the sole basis for expiry and capacity eviction and is not
/// part of the public result shape.
#[derive(Debug, Clone)]
pub struct StoredResult {
    /// The stored record.
    pub result: SearchResult,
    /// When the record was (last) inserted.
    pub inserted_at: Instant,
    /// Insertion sequence number; breaks ties between equal timestamps.
    pub(crate) seq: u64,
}

/// Extracted readable content from a fetched web page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageContent {
    /// The URL that was fetched.
    pub url: String,
    /// The page title extracted from HTML.
    pub title: String,
    /// Cleaned, readable text content with HTML boilerplate stripped.
    pub text: String,
    /// Number of words in the extracted text.
    pub word_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_result_construction() {
        let result = SearchResult {
            id: "result-1".into(),
            title: "Example".into(),
            link: "https://example.com/".into(),
            snippet: "An example page".into(),
        };
        assert_eq!(result.title, "Example");
        assert!(result.has_link());
    }

    #[test]
    fn search_result_without_link() {
        let result = SearchResult {
            id: "result-2".into(),
            title: "Answer".into(),
            link: String::new(),
            snippet: "42".into(),
        };
        assert!(!result.has_link());
    }

    #[test]
    fn search_result_json_shape_has_no_timestamp() {
        let result = SearchResult {
            id: "result-3".into(),
            title: "Test".into(),
            link: "https://test.com/".into(),
            snippet: "snippet".into(),
        };
        let json = serde_json::to_value(&result).expect("serialize");
        let obj = json.as_object().expect("object");
        assert_eq!(obj.len(), 4);
        assert!(obj.contains_key("id"));
        assert!(!obj.contains_key("timestamp"));
    }

    #[test]
    fn page_content_construction() {
        let page = PageContent {
            url: "https://example.com".into(),
            title: "Example".into(),
            text: "Hello world".into(),
            word_count: 2,
        };
        assert_eq!(page.word_count, 2);
        assert_eq!(page.title, "Example");
    }
}
