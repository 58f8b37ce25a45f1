//! Page rendering: one browser-backed fetch per crawl task.
//!
//! The orchestrator only sees the [`PageRenderer`] trait. The production
//! implementation drives Chromium; tests substitute an in-memory renderer.

pub mod chromium;
pub mod scripts;

use futures::future::BoxFuture;
use serde::Deserialize;
use url::Url;

use crate::config::Credentials;

pub use chromium::{ChromiumRenderer, RenderTimeouts};

/// Everything a renderer needs to fetch one page
#[derive(Debug, Clone)]
pub struct RenderRequest {
    pub url: Url,
    pub auth: Option<Credentials>,
    pub screenshot: bool,
    /// Elements matching these selectors are removed before the screenshot
    pub strip_selectors: Vec<String>,
    pub capture_console: bool,
}

/// Navigation timings in milliseconds relative to navigation start.
///
/// A field is `None` when it could not be read; it is logged as an empty cell.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TimingMetrics {
    pub ttfb_ms: Option<f64>,
    pub dom_content_loaded_ms: Option<f64>,
    pub load_event_ms: Option<f64>,
    pub network_idle_ms: Option<f64>,
}

impl TimingMetrics {
    /// All four metrics rounded to whole milliseconds
    #[must_use]
    pub fn rounded(&self) -> [Option<i64>; 4] {
        [
            self.ttfb_ms,
            self.dom_content_loaded_ms,
            self.load_event_ms,
            self.network_idle_ms,
        ]
        .map(|v| v.map(|ms| ms.round() as i64))
    }
}

/// One `console.*` call captured in the page
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConsoleMessage {
    #[serde(rename = "type")]
    pub kind: String,
    pub text: String,
}

impl ConsoleMessage {
    /// Render messages as one `type: text | type: text` cell
    #[must_use]
    pub fn join(messages: &[Self]) -> String {
        messages
            .iter()
            .map(|m| format!("{}: {}", m.kind, m.text))
            .collect::<Vec<_>>()
            .join(" | ")
    }
}

/// A fetched page. Owned by the task that produced it.
#[derive(Debug, Clone)]
pub struct RenderResult {
    pub status: Option<u16>,
    pub final_url: Url,
    /// Serialized DOM after the page settled
    pub dom_snapshot: String,
    pub timing: TimingMetrics,
    /// `Some` only when console capture was requested
    pub console_messages: Option<Vec<ConsoleMessage>>,
    /// PNG bytes, `Some` only when a screenshot was requested and succeeded
    pub screenshot: Option<Vec<u8>>,
}

impl RenderResult {
    /// Bytes persisted as the HTML artifact
    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        self.dom_snapshot.as_bytes()
    }
}

/// Hard failure of a fetch. Soft failures (timing, idle, screenshot) never surface here.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RenderFailure {
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        url: String,
        status: Option<u16>,
        message: String,
    },

    #[error("Browser session error for {url}: {message}")]
    Session { url: String, message: String },
}

impl RenderFailure {
    /// HTTP status if one was received before the failure
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Navigation { status, .. } => *status,
            Self::Session { .. } => None,
        }
    }
}

/// Executes one fetch against a live page.
///
/// Implementations must release any per-page resource on every exit path.
pub trait PageRenderer: Send + Sync {
    fn render(&self, request: RenderRequest) -> BoxFuture<'_, Result<RenderResult, RenderFailure>>;
}
