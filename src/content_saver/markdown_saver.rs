use anyhow::Result;
use std::path::{Path, PathBuf};

use super::markdown_converter::markdown_or_placeholder;
use super::{ArtifactKind, artifact_path, write_artifact};
use crate::crawl_engine::Phase;

/// Convert `html` to Markdown and save it.
///
/// Conversion runs on the blocking pool since large documents take a while
/// to clean and walk. A failed conversion still writes a placeholder file.
pub async fn save_markdown_content(
    storage_dir: &Path,
    phase: Phase,
    relative_path: &str,
    html: String,
) -> Result<PathBuf> {
    let path = artifact_path(storage_dir, ArtifactKind::Markdown, phase, relative_path);

    let label = relative_path.to_string();
    let markdown = tokio::task::spawn_blocking(move || markdown_or_placeholder(&html, &label))
        .await
        .unwrap_or_else(|e| {
            log::warn!(target: "dualcrawl::artifacts", "Markdown conversion task failed: {e}");
            crate::utils::CONVERSION_FAILED_PLACEHOLDER.to_string()
        });

    write_artifact(&path, markdown.as_bytes()).await?;
    log::debug!(
        target: "dualcrawl::artifacts",
        "Saved markdown ({} chars) to {}",
        markdown.len(),
        path.display()
    );
    Ok(path)
}
