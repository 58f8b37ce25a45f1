//! DOM cleaning ahead of Markdown conversion, on a mutable `kuchiki` tree.

use anyhow::{Context, Result, anyhow};
use kuchiki::NodeRef;
use kuchiki::traits::{NodeIterator, TendrilSink};

/// Elements removed together with their content
const DROPPED_ELEMENTS: &str = "script, style, img";

/// Structural wrappers replaced by their children
const WRAPPER_ELEMENTS: &str = "div";

/// Strip non-content elements and all attributes, and unwrap wrapper elements.
pub fn clean_html_content(html: &str) -> Result<String> {
    let document = kuchiki::parse_html().one(html.to_string());

    // Collect before mutating; detaching invalidates a live iterator.
    let dropped: Vec<_> = document
        .select(DROPPED_ELEMENTS)
        .map_err(|()| anyhow!("Invalid CSS selector: {DROPPED_ELEMENTS}"))?
        .collect();
    for element in dropped {
        element.as_node().detach();
    }

    for element in document.descendants().elements() {
        element.attributes.borrow_mut().map.clear();
    }

    let wrappers: Vec<_> = document
        .select(WRAPPER_ELEMENTS)
        .map_err(|()| anyhow!("Invalid CSS selector: {WRAPPER_ELEMENTS}"))?
        .collect();
    for wrapper in wrappers {
        unwrap_node(wrapper.as_node());
    }

    let mut output = Vec::new();
    document
        .serialize(&mut output)
        .context("Failed to serialize cleaned HTML")?;
    String::from_utf8(output).context("Cleaned HTML is not valid UTF-8")
}

/// Replace `node` by its children, in order.
fn unwrap_node(node: &NodeRef) {
    let children: Vec<_> = node.children().collect();
    for child in children {
        node.insert_before(child);
    }
    node.detach();
}
