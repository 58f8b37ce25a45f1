//! Append-only CSV log with one row per processed page.
//!
//! The header is written once when the log is created. Every row is flushed
//! as soon as it is written so an interrupted run keeps what it collected.

use anyhow::{Context, Result};
use chrono::Local;
use parking_lot::Mutex;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::render::{ConsoleMessage, RenderFailure, RenderResult};
use crate::utils::{STATUS_NOT_AVAILABLE, flatten_whitespace};

const LEADING_COLUMNS: [&str; 7] = [
    "timestamp",
    "url",
    "response_code",
    "ttfb_ms",
    "dom_content_loaded_ms",
    "load_event_ms",
    "network_idle_ms",
];
const CONSOLE_COLUMN: &str = "console_messages";
const DIGEST_COLUMN: &str = "error_log_digest";

/// Header row for a log with or without the console column
#[must_use]
pub fn header(with_console: bool) -> Vec<&'static str> {
    let mut columns = LEADING_COLUMNS.to_vec();
    if with_console {
        columns.push(CONSOLE_COLUMN);
    }
    columns.push(DIGEST_COLUMN);
    columns
}

/// One log row before serialization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsRecord {
    pub timestamp: String,
    pub url: String,
    pub response_code: String,
    pub metrics: [Option<i64>; 4],
    pub console_messages: Option<String>,
    /// Empty when no error-log backend is configured for the phase
    pub error_log_digest: String,
}

impl MetricsRecord {
    /// Row for a page that rendered, whatever its HTTP status
    #[must_use]
    pub fn from_render(result: &RenderResult, error_log_digest: String) -> Self {
        Self {
            timestamp: now_timestamp(),
            url: result.final_url.to_string(),
            response_code: status_cell(result.status),
            metrics: result.timing.rounded(),
            console_messages: result
                .console_messages
                .as_deref()
                .map(|messages| flatten_whitespace(&ConsoleMessage::join(messages))),
            error_log_digest,
        }
    }

    /// Row for a page whose fetch failed outright
    #[must_use]
    pub fn from_failure(url: &str, failure: &RenderFailure, error_log_digest: String) -> Self {
        Self {
            timestamp: now_timestamp(),
            url: url.to_string(),
            response_code: status_cell(failure.status()),
            metrics: [None; 4],
            console_messages: None,
            error_log_digest,
        }
    }

    fn cells(&self, with_console: bool) -> Vec<String> {
        let mut cells = Vec::with_capacity(9);
        cells.push(self.timestamp.clone());
        cells.push(self.url.clone());
        cells.push(self.response_code.clone());
        cells.extend(
            self.metrics
                .iter()
                .map(|metric| metric.map(|ms| ms.to_string()).unwrap_or_default()),
        );
        if with_console {
            cells.push(self.console_messages.clone().unwrap_or_default());
        }
        cells.push(flatten_whitespace(&self.error_log_digest));
        cells
    }
}

fn now_timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn status_cell(status: Option<u16>) -> String {
    status.map_or_else(|| STATUS_NOT_AVAILABLE.to_string(), |code| code.to_string())
}

/// The run's metrics log, shared by all workers
pub struct MetricsLog {
    writer: Mutex<csv::Writer<File>>,
    path: PathBuf,
    with_console: bool,
}

impl MetricsLog {
    /// Create (or truncate) the log at `path` and write the header.
    pub fn create(path: &Path, with_console: bool) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
        }
        let mut writer = csv::Writer::from_path(path)
            .with_context(|| format!("Failed to open metrics log {}", path.display()))?;
        writer
            .write_record(header(with_console))
            .context("Failed to write metrics log header")?;
        writer.flush().context("Failed to flush metrics log header")?;

        Ok(Self {
            writer: Mutex::new(writer),
            path: path.to_path_buf(),
            with_console,
        })
    }

    /// Append and flush one row.
    pub fn append(&self, record: &MetricsRecord) -> Result<()> {
        let mut writer = self.writer.lock();
        writer
            .write_record(record.cells(self.with_console))
            .with_context(|| format!("Failed to append row for {}", record.url))?;
        writer
            .flush()
            .with_context(|| format!("Failed to flush {}", self.path.display()))?;
        Ok(())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}
