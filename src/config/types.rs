//! Core configuration types for mirrored crawling
//!
//! This module contains the main `CrawlConfig` struct. One value of it
//! parameterises the whole run: mirroring mode, screenshot mode, language
//! filter, selector stripping and the per-site error-log connections.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::utils::{
    DEFAULT_EVALUATION_TIMEOUT_SECS, DEFAULT_LANGUAGE_PROBE_TIMEOUT_SECS, DEFAULT_LOG_FILE_NAME,
    DEFAULT_MAX_CONCURRENT_PAGES, DEFAULT_MAX_CONCURRENT_PER_DOMAIN, DEFAULT_MAX_DEPTH,
    DEFAULT_NAVIGATION_TIMEOUT_SECS, DEFAULT_NETWORK_IDLE_TIMEOUT_SECS,
    DEFAULT_THROTTLE_MAX_DELAY_MS, DEFAULT_THROTTLE_START_DELAY_MS,
    DEFAULT_THROTTLE_TARGET_CONCURRENCY,
};

/// Main configuration struct for a mirrored crawl
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Root of the `html/`, `text/`, `screenshots/` trees and the metrics log
    pub(crate) storage_dir: PathBuf,

    /// Reference site start URL. `None` switches the run to test-only mode.
    pub(crate) reference_url: Option<String>,

    /// Test site base URL (always required)
    pub(crate) test_url: String,

    pub(crate) max_depth: u8,
    pub(crate) save_screenshots: bool,

    /// Treat pages that differ only in their query string as distinct pages
    pub(crate) pair_by_query: bool,

    /// Replace query strings in artifact names by a short hash
    pub(crate) hash_query: bool,

    /// Only process pages whose `<html lang>` equals this (lower-cased)
    pub(crate) target_lang: Option<String>,

    /// CSS selectors whose matches are removed before a screenshot
    pub(crate) strip_selectors: Vec<String>,

    pub(crate) reference_error_log_dsn: Option<String>,
    pub(crate) test_error_log_dsn: Option<String>,

    /// Record console.log/warn/error output into the metrics log
    pub(crate) capture_console: bool,

    pub(crate) headless: bool,
    pub(crate) max_concurrent_pages: usize,
    pub(crate) max_concurrent_per_domain: usize,
    pub(crate) throttle: ThrottleConfig,

    /// Timeout for `page.goto()`
    pub(crate) navigation_timeout_secs: u64,

    /// Timeout for each DOM evaluation (timing read, console read, selector strip)
    pub(crate) evaluation_timeout_secs: u64,

    /// Timeout for the network-idle wait
    pub(crate) network_idle_timeout_secs: u64,

    /// Timeout for the plain HTTP fetch used by the language filter
    pub(crate) language_probe_timeout_secs: u64,

    /// File name of the metrics log, relative to `storage_dir`
    pub(crate) log_file_name: String,

    /// Chrome user data directory. A per-process temp dir is used when unset.
    #[serde(skip)]
    pub(crate) chrome_data_dir: Option<PathBuf>,
}

/// Adaptive per-domain delay settings
///
/// The throttle raises the delay between requests to a domain when its
/// responses get slow and lowers it again when they speed up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThrottleConfig {
    pub enabled: bool,
    pub start_delay: Duration,
    pub min_delay: Duration,
    pub max_delay: Duration,
    /// Average number of in-flight requests per domain to aim for
    pub target_concurrency: f64,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            start_delay: Duration::from_millis(DEFAULT_THROTTLE_START_DELAY_MS),
            min_delay: Duration::ZERO,
            max_delay: Duration::from_millis(DEFAULT_THROTTLE_MAX_DELAY_MS),
            target_concurrency: DEFAULT_THROTTLE_TARGET_CONCURRENCY,
        }
    }
}

impl ThrottleConfig {
    /// Throttle that never delays, for local runs and tests
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            start_delay: Duration::ZERO,
            ..Self::default()
        }
    }
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from("./output"),
            reference_url: None,
            test_url: String::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            save_screenshots: false,
            pair_by_query: false,
            hash_query: false,
            target_lang: None,
            strip_selectors: Vec::new(),
            reference_error_log_dsn: None,
            test_error_log_dsn: None,
            capture_console: false,
            headless: true,
            max_concurrent_pages: DEFAULT_MAX_CONCURRENT_PAGES,
            max_concurrent_per_domain: DEFAULT_MAX_CONCURRENT_PER_DOMAIN,
            throttle: ThrottleConfig::default(),
            navigation_timeout_secs: DEFAULT_NAVIGATION_TIMEOUT_SECS,
            evaluation_timeout_secs: DEFAULT_EVALUATION_TIMEOUT_SECS,
            network_idle_timeout_secs: DEFAULT_NETWORK_IDLE_TIMEOUT_SECS,
            language_probe_timeout_secs: DEFAULT_LANGUAGE_PROBE_TIMEOUT_SECS,
            log_file_name: DEFAULT_LOG_FILE_NAME.to_string(),
            chrome_data_dir: None,
        }
    }
}
