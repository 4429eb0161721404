//! Link normalisation for extracted results.
//!
//! Resolves relative links against the result page's origin and strips
//! tracking query parameters, so equivalent links compare equal during
//! deduplication. Also recognises the result page's own redirect wrappers
//! and search-navigation links, neither of which is a real result.

use url::Url;

/// Tracking query parameters that are stripped during normalisation.
const TRACKING_PARAMS: &[&str] = &[
    "utm_source",
    "utm_medium",
    "utm_campaign",
    "utm_term",
    "utm_content",
    "utm_id",
    "fbclid",
    "gclid",
    "msclkid",
    "yclid",
    "mc_cid",
    "mc_eid",
    "ref",
    "si",
    "feature",
];

/// Path prefixes of redirect wrappers that hide the real destination.
const REDIRECT_PATHS: &[&str] = &["/ck/a", "/aclick", "/aclk", "/url"];

/// Normalise an extracted link against the page `origin`.
///
/// 1. Absolute links are kept; `//host/path` gets the origin's scheme;
///    `/path` and bare `path` are resolved against the origin root.
/// 2. Known tracking parameters (UTM, fbclid, gclid, msclkid, …) are removed.
///    Remaining parameters keep their order.
///
/// An empty input yields an empty output. If the link cannot be parsed at
/// any stage, the trimmed input is returned unchanged.
///
/// # Examples
///
/// ```
/// use serp_extract::pipeline::url_normalize::normalize_link;
/// use url::Url;
///
/// let origin = Url::parse("https://example.com").unwrap();
/// assert_eq!(normalize_link("/foo?utm_source=x", &origin), "https://example.com/foo");
/// assert_eq!(normalize_link("//cdn.example.com/a", &origin), "https://cdn.example.com/a");
/// ```
pub fn normalize_link(raw: &str, origin: &Url) -> String {
    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }

    let Some(mut parsed) = resolve(raw, origin) else {
        return raw.to_string();
    };

    strip_tracking_params(&mut parsed);
    parsed.to_string()
}

/// Returns `true` if `raw` points at one of the result page's own redirect
/// wrappers rather than at a destination.
pub fn is_redirect_wrapper(raw: &str, origin: &Url) -> bool {
    let Some(parsed) = resolve(raw.trim(), origin) else {
        return false;
    };
    same_site(&parsed, origin)
        && REDIRECT_PATHS
            .iter()
            .any(|prefix| path_has_prefix(parsed.path(), prefix))
}

/// Returns `true` if `raw` is a link back into the result page's own search
/// (pagination, related searches, refinements).
pub fn is_same_site_search(raw: &str, origin: &Url) -> bool {
    let Some(parsed) = resolve(raw.trim(), origin) else {
        return false;
    };
    same_site(&parsed, origin) && path_has_prefix(parsed.path(), "/search")
}

/// Host of a normalised link, without a leading `www.`.
pub fn display_host(link: &str) -> Option<String> {
    let parsed = Url::parse(link).ok()?;
    let host = parsed.host_str()?;
    Some(host.strip_prefix("www.").unwrap_or(host).to_string())
}

fn resolve(raw: &str, origin: &Url) -> Option<Url> {
    if raw.is_empty() {
        return None;
    }
    if let Some(rest) = raw.strip_prefix("//") {
        return Url::parse(&format!("{}://{rest}", origin.scheme())).ok();
    }
    if raw.starts_with('/') {
        return origin.join(raw).ok();
    }
    match Url::parse(raw) {
        Ok(absolute) => Some(absolute),
        Err(url::ParseError::RelativeUrlWithoutBase) => origin.join(&format!("/{raw}")).ok(),
        Err(_) => None,
    }
}

fn strip_tracking_params(url: &mut Url) {
    if url.query().is_none() {
        return;
    }

    let params: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    let kept: Vec<&(String, String)> = params
        .iter()
        .filter(|(key, _)| {
            let k = key.to_lowercase();
            !TRACKING_PARAMS.contains(&k.as_str())
        })
        .collect();

    if kept.len() == params.len() {
        return;
    }
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    }
}

fn same_site(url: &Url, origin: &Url) -> bool {
    match (url.host_str(), origin.host_str()) {
        (Some(a), Some(b)) => bare_host(a).eq_ignore_ascii_case(bare_host(b)),
        _ => false,
    }
}

fn bare_host(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}

fn path_has_prefix(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}
