use anyhow::Result;
use std::path::{Path, PathBuf};

use super::{ArtifactKind, artifact_path, write_artifact};
use crate::crawl_engine::Phase;

/// Save a full-page PNG screenshot.
pub async fn save_screenshot(
    storage_dir: &Path,
    phase: Phase,
    relative_path: &str,
    png: &[u8],
) -> Result<PathBuf> {
    let path = artifact_path(storage_dir, ArtifactKind::Screenshot, phase, relative_path);
    write_artifact(&path, png).await?;
    log::debug!(target: "dualcrawl::artifacts", "Saved screenshot to {}", path.display());
    Ok(path)
}
