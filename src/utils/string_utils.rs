//! String helpers for log cells
//!
//! Metric log rows are single CSV lines, so every free-form value written to
//! them goes through these helpers first.

/// Collapse every run of whitespace (newlines included) into a single space.
///
/// ```
/// # use dualcrawl::utils::string_utils::flatten_whitespace;
/// assert_eq!(flatten_whitespace("a\n  b\r\n\tc "), "a b c");
/// ```
#[must_use]
pub fn flatten_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
