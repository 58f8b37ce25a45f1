//! URL identity: how a URL maps to a pairing path, a dedup key and a file name.
//!
//! Pages on the reference and test sites are paired by their relative path,
//! never by absolute URL. Everything in this module is pure so the crawl
//! frontier and the artifact writer agree on identity without sharing state.

use url::Url;
use xxhash_rust::xxh3::xxh3_64;

/// Extensions that never denote a crawlable HTML document
const NON_DOCUMENT_EXTENSIONS: &[&str] = &[
    ".jpg", ".jpeg", ".png", ".gif", ".svg", ".webp", ".ico", ".bmp", ".css", ".js", ".mjs",
    ".pdf", ".mp4", ".mp3", ".webm", ".ogg", ".wav", ".avi", ".mov", ".zip", ".rar", ".gz",
    ".tar", ".7z", ".woff", ".woff2", ".ttf", ".eot",
];

/// Link schemes that never lead to a page
const NON_DOCUMENT_SCHEMES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Characters that may not appear in a file name on common filesystems
const ILLEGAL_PATH_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Number of hex characters kept from the query hash
const QUERY_HASH_LEN: usize = 8;

/// Path component of a URL with the trailing slash removed (root stays `/`).
fn canonical_path(url: &Url) -> &str {
    let path = url.path();
    if path.len() > 1 {
        path.trim_end_matches('/')
    } else {
        path
    }
}

/// Relative path of `url` used for artifact naming.
///
/// The leading slash is dropped and an empty path becomes `index`. A query
/// string is appended after `_`, or replaced by a short hash of itself when
/// `hash_query` is set so long query strings cannot blow up file names.
#[must_use]
pub fn relative_path(url: &Url, hash_query: bool) -> String {
    let mut path = canonical_path(url).trim_start_matches('/').to_string();
    if path.is_empty() {
        path.push_str("index");
    }

    if let Some(query) = url.query().filter(|q| !q.is_empty()) {
        path.push('_');
        if hash_query {
            let digest = format!("{:016x}", xxh3_64(query.as_bytes()));
            path.push_str(&digest[..QUERY_HASH_LEN]);
        } else {
            path.push_str(query);
        }
    }

    path
}

/// Path plus query exactly as requested, used to build the paired test-site URL.
#[must_use]
pub fn request_relative_url(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

/// Identity of a logical page within one phase.
///
/// Only the path takes part unless `pair_by_query` is set, in which case a
/// non-empty query is appended after `?`.
#[must_use]
pub fn dedup_key(url: &Url, pair_by_query: bool) -> String {
    let path = canonical_path(url);
    match url.query().filter(|q| pair_by_query && !q.is_empty()) {
        Some(query) => format!("{path}?{query}"),
        None => path.to_string(),
    }
}

/// Replace filesystem-illegal characters with `_`.
///
/// Distinct inputs can collide (`a/b` and `a_b`); this is a known limitation.
#[must_use]
pub fn sanitize(path: &str) -> String {
    path.chars()
        .map(|c| if ILLEGAL_PATH_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// Whether a raw link target can lead to an HTML document worth crawling.
#[must_use]
pub fn is_crawlable_link(href: &str) -> bool {
    let lowered = href.trim().to_ascii_lowercase();
    if NON_DOCUMENT_SCHEMES.iter().any(|s| lowered.starts_with(s)) {
        return false;
    }
    match Url::parse(&lowered) {
        Ok(url) => is_crawlable_document(&url),
        // Relative hrefs are resolved by the caller; only the extension matters here
        Err(_) => !has_non_document_extension(lowered.split(['?', '#']).next().unwrap_or("")),
    }
}

/// Whether an absolute URL points to an HTML document.
#[must_use]
pub fn is_crawlable_document(url: &Url) -> bool {
    if !matches!(url.scheme(), "http" | "https") {
        return false;
    }
    !has_non_document_extension(&url.path().to_ascii_lowercase())
}

fn has_non_document_extension(path: &str) -> bool {
    NON_DOCUMENT_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
