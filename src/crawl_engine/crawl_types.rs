//! Core types for mirrored crawling.
//!
//! This module contains the fundamental types threaded through the crawl
//! engine: which site a task targets, the task itself, and the error type
//! returned by a crawl run.

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Which site a task targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Reference,
    Test,
}

impl Phase {
    /// Directory name used for this phase's artifact subtree
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Reference => "reference",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One fetch to perform. Consumed exactly once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    pub url: Url,
    pub phase: Phase,
    pub depth: u8,
}

impl CrawlTask {
    #[must_use]
    pub fn new(url: Url, phase: Phase, depth: u8) -> Self {
        Self { url, phase, depth }
    }
}

/// How a task left the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskDisposition {
    /// Rendered, persisted and logged
    Processed,
    /// Navigation failed; a log row with the failure status was written
    Failed,
    /// Another task with the same dedup key was admitted first
    Duplicate,
    /// `<html lang>` did not match the configured target language
    LanguageMismatch,
}

/// Result of one task: its disposition plus the tasks it spawned
#[derive(Debug)]
pub struct TaskOutcome {
    pub task: CrawlTask,
    pub disposition: TaskDisposition,
    pub followups: Vec<CrawlTask>,
}

impl TaskOutcome {
    #[must_use]
    pub fn dropped(task: CrawlTask, disposition: TaskDisposition) -> Self {
        Self {
            task,
            disposition,
            followups: Vec::new(),
        }
    }
}

/// Error type for a crawl run. Only failures before or around the whole
/// run surface here; per-page failures are logged and never propagate.
#[derive(Debug, thiserror::Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Crawl error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for CrawlError {
    fn from(err: anyhow::Error) -> Self {
        // {:#} keeps the context chain
        Self::Other(format!("{err:#}"))
    }
}

/// Convenience alias for Result with `CrawlError`
pub type CrawlResult<T> = Result<T, CrawlError>;
