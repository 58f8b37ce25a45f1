//! Error-log correlation against a site's watchdog table.
//!
//! Each phase may name its own backend. Lookups are best-effort: any
//! failure becomes a sentinel digest rather than an error for the caller.

pub mod digest;
pub mod php_unserialize;
pub mod sql_store;

use anyhow::{Context, Result, bail};
use futures::future::BoxFuture;
use std::sync::Arc;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawl_engine::Phase;

pub use digest::{compile_message, digest, format_entry};
pub use php_unserialize::{PhpValue, UnserializeError, placeholder_map, unserialize};
pub use sql_store::SqlErrorLogStore;

/// Highest RFC 5424 severity (warning) a row may carry to be reported
pub const MAX_SEVERITY: i64 = 4;

/// Rows reported per lookup
pub const RECENT_LIMIT: u32 = 5;

/// Digest for a lookup that matched nothing
pub const NO_ERRORS: &str = "no errors";

/// Digest for a lookup that failed to connect, query or decode
pub const FETCH_FAILED: &str = "error fetching logs";

/// One watchdog row as stored by the site
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ErrorLogRow {
    pub wid: i64,
    pub timestamp: i64,
    pub severity: i64,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub message: String,
    pub variables: Option<Vec<u8>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorLogError {
    #[error("Error-log backend unreachable: {0}")]
    Connect(String),

    #[error("Error-log query failed: {0}")]
    Query(String),

    #[error("Error-log row could not be decoded: {0}")]
    Decode(#[from] UnserializeError),
}

impl From<sqlx::Error> for ErrorLogError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::Configuration(_) => Self::Connect(err.to_string()),
            other => Self::Query(other.to_string()),
        }
    }
}

/// Read access to recent log rows for a path
pub trait ErrorLogStore: Send + Sync {
    /// Up to `limit` rows whose location contains `path`, newest first,
    /// logged at or after the unix time `since` with severity at or below
    /// `max_severity`.
    fn query_recent<'a>(
        &'a self,
        path: &'a str,
        since: i64,
        max_severity: i64,
        limit: u32,
    ) -> BoxFuture<'a, Result<Vec<ErrorLogRow>, ErrorLogError>>;
}

/// The optional backend of each site, plus the unix time the run started.
/// Rows logged before that belong to earlier runs and are never reported.
#[derive(Clone, Default)]
pub struct ErrorLogStores {
    reference: Option<Arc<dyn ErrorLogStore>>,
    test: Option<Arc<dyn ErrorLogStore>>,
    run_started: i64,
}

impl ErrorLogStores {
    #[must_use]
    pub fn new(
        reference: Option<Arc<dyn ErrorLogStore>>,
        test: Option<Arc<dyn ErrorLogStore>>,
        run_started: i64,
    ) -> Self {
        Self {
            reference,
            test,
            run_started,
        }
    }

    /// Open a lazy pool for every DSN in the configuration.
    pub fn from_config(config: &CrawlConfig, run_started: i64) -> Result<Self> {
        let open = |phase: Phase| -> Result<Option<Arc<dyn ErrorLogStore>>> {
            config
                .error_log_dsn(phase)
                .map(|dsn| {
                    let store = SqlErrorLogStore::from_dsn(dsn)
                        .with_context(|| format!("Invalid {phase} error-log DSN"))?;
                    log::info!(
                        target: "dualcrawl::error_log",
                        "Correlating {phase} pages with {}",
                        store.label()
                    );
                    Ok(Arc::new(store) as Arc<dyn ErrorLogStore>)
                })
                .transpose()
        };
        Ok(Self {
            reference: open(Phase::Reference)?,
            test: open(Phase::Test)?,
            run_started,
        })
    }

    #[must_use]
    pub fn run_started(&self) -> i64 {
        self.run_started
    }

    /// Backend for the site a phase targets, if one is configured
    #[must_use]
    pub fn for_phase(&self, phase: Phase) -> Option<&dyn ErrorLogStore> {
        match phase {
            Phase::Reference => self.reference.as_deref(),
            Phase::Test => self.test.as_deref(),
        }
    }
}

/// Backend family selected by a DSN scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DsnKind {
    MySql,
    Sqlite,
}

impl DsnKind {
    /// Classify and syntax-check a DSN without connecting.
    pub fn from_dsn(dsn: &str) -> Result<Self> {
        let scheme = dsn
            .split_once(':')
            .map(|(scheme, _)| scheme.to_ascii_lowercase())
            .with_context(|| format!("Error-log DSN has no scheme: {}", redact_dsn(dsn)))?;

        match scheme.as_str() {
            "mysql" | "mariadb" => {
                let parsed = Url::parse(dsn)
                    .with_context(|| format!("Malformed error-log DSN: {}", redact_dsn(dsn)))?;
                if parsed.host_str().is_none_or(str::is_empty) {
                    bail!("Error-log DSN has no host: {}", redact_dsn(dsn));
                }
                if parsed.path().trim_start_matches('/').is_empty() {
                    bail!("Error-log DSN has no database name: {}", redact_dsn(dsn));
                }
                Ok(Self::MySql)
            }
            "sqlite" => Ok(Self::Sqlite),
            other => bail!("Unsupported error-log backend '{other}'"),
        }
    }
}

/// DSN with any password replaced, safe for log output
#[must_use]
pub fn redact_dsn(dsn: &str) -> String {
    match Url::parse(dsn) {
        Ok(mut url) if url.password().is_some() => {
            let _ = url.set_password(Some("***"));
            url.to_string()
        }
        Ok(url) => url.to_string(),
        Err(_) => dsn.split('@').next_back().unwrap_or(dsn).to_string(),
    }
}
