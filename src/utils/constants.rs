//! Shared configuration constants for dualcrawl
//!
//! Default values used by the config builder and the crawl engine.

/// Default maximum crawl depth: 2 levels below the start page
pub const DEFAULT_MAX_DEPTH: u8 = 2;

/// Global cap on pages rendered at the same time
pub const DEFAULT_MAX_CONCURRENT_PAGES: usize = 8;

/// Cap on pages rendered at the same time against one domain
pub const DEFAULT_MAX_CONCURRENT_PER_DOMAIN: usize = 8;

/// Initial per-domain delay before the throttle has seen any latency
pub const DEFAULT_THROTTLE_START_DELAY_MS: u64 = 2_000;

/// Upper bound for the adaptive per-domain delay
pub const DEFAULT_THROTTLE_MAX_DELAY_MS: u64 = 60_000;

/// Average number of requests the throttle aims to keep in flight per domain
pub const DEFAULT_THROTTLE_TARGET_CONCURRENCY: f64 = 1.0;

/// Lowest accepted throttle target concurrency
pub const MIN_THROTTLE_TARGET_CONCURRENCY: f64 = 0.01;

/// Navigation timeout
pub const DEFAULT_NAVIGATION_TIMEOUT_SECS: u64 = 60;

/// Timeout for a single DOM evaluation
pub const DEFAULT_EVALUATION_TIMEOUT_SECS: u64 = 10;

/// How long to wait for the page network to go quiet
pub const DEFAULT_NETWORK_IDLE_TIMEOUT_SECS: u64 = 30;

/// Timeout for the plain HTTP fetch used by the language filter
pub const DEFAULT_LANGUAGE_PROBE_TIMEOUT_SECS: u64 = 30;

/// Name of the metrics log inside the storage directory
pub const DEFAULT_LOG_FILE_NAME: &str = "log.txt";

/// Placeholder written to the markdown artifact when conversion fails
pub const CONVERSION_FAILED_PLACEHOLDER: &str = "Conversion failed.";

/// Status cell written when a navigation fails without an HTTP status
pub const STATUS_NOT_AVAILABLE: &str = "not available";

/// Chrome user agent string
///
/// Updated: 2025-01-29 to Chrome 132 (current stable)
pub const CHROME_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/132.0.6834.160 Safari/537.36";
