//! Artifact persistence: HTML, Markdown and screenshots per site role.
//!
//! Paths are a pure function of (kind, phase, relative path), so a re-run
//! overwrites the previous run's files instead of adding new ones.

mod html_saver;
pub mod markdown_converter;
mod markdown_saver;
mod screenshot_saver;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::crawl_engine::Phase;
use crate::utils::sanitize;

pub use html_saver::save_html_content;
pub use markdown_saver::save_markdown_content;
pub use screenshot_saver::save_screenshot;

/// What an artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Html,
    Markdown,
    Screenshot,
}

impl ArtifactKind {
    /// Top-level directory under the storage root
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "text",
            Self::Screenshot => "screenshots",
        }
    }

    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Markdown => "md",
            Self::Screenshot => "png",
        }
    }
}

/// `<storage>/<kind dir>/<phase>/<sanitized relative path>.<ext>`
#[must_use]
pub fn artifact_path(storage_dir: &Path, kind: ArtifactKind, phase: Phase, relative_path: &str) -> PathBuf {
    storage_dir
        .join(kind.dir_name())
        .join(phase.as_str())
        .join(format!("{}.{}", sanitize(relative_path), kind.extension()))
}

/// Write `bytes` to `path`, creating parent directories and replacing any existing file.
pub(crate) async fn write_artifact(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}
