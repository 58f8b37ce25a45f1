use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ArtifactKind, artifact_path, write_artifact};
use crate::crawl_engine::Phase;

/// Save the page's rendered HTML.
///
/// Returns the path written.
pub async fn save_html_content(
    storage_dir: &Path,
    phase: Phase,
    relative_path: &str,
    body: &[u8],
) -> Result<PathBuf> {
    let path = artifact_path(storage_dir, ArtifactKind::Html, phase, relative_path);
    write_artifact(&path, body).await?;
    log::debug!(
        target: "dualcrawl::artifacts",
        "Saved HTML ({} bytes) to {}",
        body.len(),
        path.display()
    );
    Ok(path)
}
