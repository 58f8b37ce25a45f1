//! Browser and user-data cleanup after a run

use chromiumoxide::Browser;
use log::{debug, warn};
use std::path::PathBuf;

/// Result of cleanup operations
#[derive(Debug, Clone)]
pub enum CleanupResult {
    Success,
    /// Some steps failed; each entry describes one
    PartialFailure(Vec<String>),
}

/// Close the browser, wait for its process, then remove `chrome_data_dir` if given.
pub async fn cleanup_browser_and_data(
    mut browser: Browser,
    chrome_data_dir: Option<PathBuf>,
) -> CleanupResult {
    let mut errors = Vec::new();

    debug!(target: "dualcrawl::cleanup", "Closing browser");
    if let Err(e) = browser.close().await {
        warn!(target: "dualcrawl::cleanup", "Failed to close browser: {e}");
        errors.push(format!("Browser close failed: {e}"));
    }

    // Wait for the process so Chrome does not outlive the run
    if let Err(e) = browser.wait().await {
        warn!(target: "dualcrawl::cleanup", "Failed to wait for browser exit: {e}");
        errors.push(format!("Browser wait failed: {e}"));
    }

    if let Some(dir) = chrome_data_dir {
        debug!(target: "dualcrawl::cleanup", "Removing Chrome data directory {}", dir.display());
        if let Err(e) = tokio::fs::remove_dir_all(&dir).await {
            warn!(target: "dualcrawl::cleanup", "Failed to remove Chrome data directory: {e}");
            errors.push(format!("Directory cleanup failed: {e}"));
        }
    }

    if errors.is_empty() {
        CleanupResult::Success
    } else {
        CleanupResult::PartialFailure(errors)
    }
}
