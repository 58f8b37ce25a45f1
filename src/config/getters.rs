//! Getter methods for `CrawlConfig`

use std::path::{Path, PathBuf};
use std::time::Duration;

use super::types::{CrawlConfig, ThrottleConfig};
use crate::crawl_engine::Phase;

impl CrawlConfig {
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    #[must_use]
    pub fn reference_url(&self) -> Option<&str> {
        self.reference_url.as_deref()
    }

    #[must_use]
    pub fn test_url(&self) -> &str {
        &self.test_url
    }

    /// Whether a reference site exists, i.e. test pages are replayed rather than discovered
    #[must_use]
    pub fn is_mirrored(&self) -> bool {
        self.reference_url.is_some()
    }

    #[must_use]
    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    #[must_use]
    pub fn save_screenshots(&self) -> bool {
        self.save_screenshots
    }

    #[must_use]
    pub fn pair_by_query(&self) -> bool {
        self.pair_by_query
    }

    #[must_use]
    pub fn hash_query(&self) -> bool {
        self.hash_query
    }

    #[must_use]
    pub fn target_lang(&self) -> Option<&str> {
        self.target_lang.as_deref()
    }

    #[must_use]
    pub fn strip_selectors(&self) -> &[String] {
        &self.strip_selectors
    }

    /// Error-log DSN configured for the site a phase targets
    #[must_use]
    pub fn error_log_dsn(&self, phase: Phase) -> Option<&str> {
        match phase {
            Phase::Reference => self.reference_error_log_dsn.as_deref(),
            Phase::Test => self.test_error_log_dsn.as_deref(),
        }
    }

    #[must_use]
    pub fn capture_console(&self) -> bool {
        self.capture_console
    }

    #[must_use]
    pub fn headless(&self) -> bool {
        self.headless
    }

    #[must_use]
    pub fn max_concurrent_pages(&self) -> usize {
        self.max_concurrent_pages
    }

    #[must_use]
    pub fn max_concurrent_per_domain(&self) -> usize {
        self.max_concurrent_per_domain
    }

    #[must_use]
    pub fn throttle(&self) -> &ThrottleConfig {
        &self.throttle
    }

    #[must_use]
    pub fn navigation_timeout(&self) -> Duration {
        Duration::from_secs(self.navigation_timeout_secs)
    }

    #[must_use]
    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_secs(self.evaluation_timeout_secs)
    }

    #[must_use]
    pub fn network_idle_timeout(&self) -> Duration {
        Duration::from_secs(self.network_idle_timeout_secs)
    }

    #[must_use]
    pub fn language_probe_timeout(&self) -> Duration {
        Duration::from_secs(self.language_probe_timeout_secs)
    }

    /// Full path of the metrics log
    #[must_use]
    pub fn log_path(&self) -> PathBuf {
        self.storage_dir.join(&self.log_file_name)
    }

    /// Get the Chrome user data directory if configured
    #[must_use]
    pub fn chrome_data_dir(&self) -> Option<&PathBuf> {
        self.chrome_data_dir.as_ref()
    }
}
