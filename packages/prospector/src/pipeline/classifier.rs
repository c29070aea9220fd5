//! Listing-URL classification heuristic.
//!
//! Precision-over-recall: a false positive costs one wasted enrichment
//! call, a false negative is an invisible miss. Both are acceptable
//! operating characteristics here, so the rules stay deliberately blunt.

/// Path tokens that mark non-listing infrastructure pages.
const EXCLUDE_TOKENS: &[&str] = &[
    "/about",
    "/contact",
    "/privacy",
    "/terms",
    "/faq",
    "/help",
    "/login",
    "/register",
];

/// Path tokens that mark a probable per-item listing page.
const INCLUDE_TOKENS: &[&str] = &[
    "/listing",
    "/property",
    "/car",
    "/vehicle",
    "/house",
    "/apartment",
    "/lot",
    "/auction",
    "/bid",
    "/sale",
    "/hammer",
    "/item",
];

/// Decide whether a discovered URL looks like an individual listing page.
///
/// Exclusion tokens veto unconditionally; otherwise a URL is accepted if
/// its path carries an inclusion token or a fully numeric path segment
/// (a proxy for a per-item identifier). Unparseable URLs are rejected.
pub fn is_listing_url(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };

    let path = parsed.path().to_lowercase();

    if EXCLUDE_TOKENS.iter().any(|token| path.contains(token)) {
        return false;
    }

    if INCLUDE_TOKENS.iter().any(|token| path.contains(token)) {
        return true;
    }

    has_numeric_segment(&path)
}

fn has_numeric_segment(path: &str) -> bool {
    path.split('/')
        .any(|segment| !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit()))
}
