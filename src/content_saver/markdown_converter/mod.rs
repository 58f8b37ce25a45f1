//! HTML to Markdown conversion for the text artifact.
//!
//! The pipeline has three steps:
//! 1. Clean the DOM (drop script/style/img, clear attributes, unwrap `div`s)
//! 2. Convert the cleaned markup with `htmd`
//! 3. Remove any wrapper tags the converter passed through verbatim
//!
//! ```rust
//! # use dualcrawl::content_saver::markdown_converter::convert_html_to_markdown;
//! let html = "<html><body><div class=\"x\"><p>Hi</p></div></body></html>";
//! assert_eq!(convert_html_to_markdown(html)?, "Hi");
//! # Ok::<(), anyhow::Error>(())
//! ```

use anyhow::Result;

pub mod html_preprocessing;
pub mod html_to_markdown;

pub use html_preprocessing::clean_html_content;
pub use html_to_markdown::{create_converter, strip_wrapper_tags};

use crate::utils::CONVERSION_FAILED_PLACEHOLDER;

/// Run the full pipeline.
pub fn convert_html_to_markdown(html: &str) -> Result<String> {
    let cleaned = clean_html_content(html)?;
    let markdown = create_converter().convert(&cleaned)?;
    Ok(strip_wrapper_tags(&markdown).trim().to_string())
}

/// Run the pipeline, degrading to the placeholder document on failure.
///
/// `label` only identifies the page in the warning.
#[must_use]
pub fn markdown_or_placeholder(html: &str, label: &str) -> String {
    match convert_html_to_markdown(html) {
        Ok(markdown) => markdown,
        Err(e) => {
            log::warn!(target: "dualcrawl::artifacts", "Markdown conversion failed for {label}: {e:#}");
            CONVERSION_FAILED_PLACEHOLDER.to_string()
        }
    }
}
