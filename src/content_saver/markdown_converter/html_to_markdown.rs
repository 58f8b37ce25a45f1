//! `htmd` converter setup and post-processing.

use htmd::HtmlToMarkdown;
use regex::Regex;
use std::sync::LazyLock;

static WRAPPER_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)</?div[^>]*>").expect("WRAPPER_TAG_RE: hardcoded regex is valid")
});

/// Converter used for every page
#[must_use]
pub fn create_converter() -> HtmlToMarkdown {
    HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "head"])
        .build()
}

/// Remove `<div>`/`</div>` tags left in converted text.
#[must_use]
pub fn strip_wrapper_tags(markdown: &str) -> String {
    WRAPPER_TAG_RE.replace_all(markdown, "").into_owned()
}
