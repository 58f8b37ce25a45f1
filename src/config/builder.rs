//! Type-safe builder for `CrawlConfig` using the typestate pattern
//!
//! `storage_dir` and `test_url` must be set, in that order, before `build()`
//! becomes available. Every other option can be set in any state (see
//! `methods.rs`).

use anyhow::{Result, anyhow, bail};
use std::marker::PhantomData;
use std::path::PathBuf;
use url::Url;

use super::types::{CrawlConfig, ThrottleConfig};
use crate::error_log::DsnKind;
use crate::utils::MIN_THROTTLE_TARGET_CONCURRENCY;

// Type states for the builder
pub struct WithStorageDir;
pub struct WithTestUrl;

pub struct CrawlConfigBuilder<State = ()> {
    pub(crate) storage_dir: Option<PathBuf>,
    pub(crate) reference_url: Option<String>,
    pub(crate) test_url: Option<String>,
    pub(crate) max_depth: u8,
    pub(crate) save_screenshots: bool,
    pub(crate) pair_by_query: bool,
    pub(crate) hash_query: bool,
    pub(crate) target_lang: Option<String>,
    pub(crate) strip_selectors: Vec<String>,
    pub(crate) reference_error_log_dsn: Option<String>,
    pub(crate) test_error_log_dsn: Option<String>,
    pub(crate) capture_console: bool,
    pub(crate) headless: bool,
    pub(crate) max_concurrent_pages: usize,
    pub(crate) max_concurrent_per_domain: usize,
    pub(crate) throttle: ThrottleConfig,
    pub(crate) navigation_timeout_secs: u64,
    pub(crate) evaluation_timeout_secs: u64,
    pub(crate) network_idle_timeout_secs: u64,
    pub(crate) language_probe_timeout_secs: u64,
    pub(crate) log_file_name: String,
    pub(crate) chrome_data_dir: Option<PathBuf>,
    pub(crate) _phantom: PhantomData<State>,
}

impl Default for CrawlConfigBuilder<()> {
    fn default() -> Self {
        let defaults = CrawlConfig::default();
        Self {
            storage_dir: None,
            reference_url: None,
            test_url: None,
            max_depth: defaults.max_depth,
            save_screenshots: defaults.save_screenshots,
            pair_by_query: defaults.pair_by_query,
            hash_query: defaults.hash_query,
            target_lang: None,
            strip_selectors: Vec::new(),
            reference_error_log_dsn: None,
            test_error_log_dsn: None,
            capture_console: defaults.capture_console,
            headless: defaults.headless,
            max_concurrent_pages: defaults.max_concurrent_pages,
            max_concurrent_per_domain: defaults.max_concurrent_per_domain,
            throttle: defaults.throttle,
            navigation_timeout_secs: defaults.navigation_timeout_secs,
            evaluation_timeout_secs: defaults.evaluation_timeout_secs,
            network_idle_timeout_secs: defaults.network_idle_timeout_secs,
            language_probe_timeout_secs: defaults.language_probe_timeout_secs,
            log_file_name: defaults.log_file_name,
            chrome_data_dir: None,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfig {
    /// Create a builder for configuring a `CrawlConfig` with a fluent interface
    #[must_use]
    pub fn builder() -> CrawlConfigBuilder<()> {
        CrawlConfigBuilder::default()
    }
}

impl<State> CrawlConfigBuilder<State> {
    fn transition<Next>(self) -> CrawlConfigBuilder<Next> {
        CrawlConfigBuilder {
            storage_dir: self.storage_dir,
            reference_url: self.reference_url,
            test_url: self.test_url,
            max_depth: self.max_depth,
            save_screenshots: self.save_screenshots,
            pair_by_query: self.pair_by_query,
            hash_query: self.hash_query,
            target_lang: self.target_lang,
            strip_selectors: self.strip_selectors,
            reference_error_log_dsn: self.reference_error_log_dsn,
            test_error_log_dsn: self.test_error_log_dsn,
            capture_console: self.capture_console,
            headless: self.headless,
            max_concurrent_pages: self.max_concurrent_pages,
            max_concurrent_per_domain: self.max_concurrent_per_domain,
            throttle: self.throttle,
            navigation_timeout_secs: self.navigation_timeout_secs,
            evaluation_timeout_secs: self.evaluation_timeout_secs,
            network_idle_timeout_secs: self.network_idle_timeout_secs,
            language_probe_timeout_secs: self.language_probe_timeout_secs,
            log_file_name: self.log_file_name,
            chrome_data_dir: self.chrome_data_dir,
            _phantom: PhantomData,
        }
    }
}

impl CrawlConfigBuilder<()> {
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> CrawlConfigBuilder<WithStorageDir> {
        self.storage_dir = Some(dir.into());
        self.transition()
    }
}

impl CrawlConfigBuilder<WithStorageDir> {
    /// Set the test site base URL; `https://` is assumed when no scheme is given
    pub fn test_url(mut self, url: impl Into<String>) -> CrawlConfigBuilder<WithTestUrl> {
        self.test_url = Some(normalize_base_url(url.into()));
        self.transition()
    }
}

/// Add `https://` when the URL has no scheme. Scheme matching ignores case.
fn normalize_base_url(url: String) -> String {
    let has_scheme = ["http://", "https://"].iter().any(|scheme| {
        url.get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    });
    if has_scheme { url } else { format!("https://{url}") }
}

/// Parse a base URL and require it to carry a host
fn validate_base_url(label: &str, raw: &str) -> Result<()> {
    let parsed = Url::parse(raw).map_err(|e| anyhow!("Invalid {label} URL '{raw}': {e}"))?;
    if parsed.host_str().is_none_or(str::is_empty) {
        bail!("Invalid {label} URL '{raw}': no host");
    }
    Ok(())
}

// Build method only available when all required fields are set
impl CrawlConfigBuilder<WithTestUrl> {
    pub fn build(self) -> Result<CrawlConfig> {
        let test_url = self
            .test_url
            .ok_or_else(|| anyhow!("test_url is required"))?;
        validate_base_url("test", &test_url)?;

        let reference_url = self.reference_url.map(normalize_base_url);
        if let Some(ref reference) = reference_url {
            validate_base_url("reference", reference)?;
        }

        for dsn in [&self.reference_error_log_dsn, &self.test_error_log_dsn]
            .into_iter()
            .flatten()
        {
            DsnKind::from_dsn(dsn)?;
        }

        if self.max_concurrent_pages == 0 || self.max_concurrent_per_domain == 0 {
            bail!("Concurrency limits must be at least 1");
        }
        if self.navigation_timeout_secs == 0 {
            bail!("Navigation timeout must be at least 1 second");
        }
        let target_concurrency = self.throttle.target_concurrency;
        if target_concurrency.is_nan() || target_concurrency < MIN_THROTTLE_TARGET_CONCURRENCY {
            bail!(
                "Throttle target concurrency must be at least \
                 {MIN_THROTTLE_TARGET_CONCURRENCY}, got {target_concurrency}"
            );
        }
        if self.throttle.min_delay > self.throttle.max_delay {
            bail!(
                "Throttle min delay {:?} exceeds max delay {:?}",
                self.throttle.min_delay,
                self.throttle.max_delay
            );
        }

        #[cfg(not(debug_assertions))]
        let headless = if !self.headless {
            log::warn!(
                "Forcing headless mode in release build. \
                Headed mode is only available in debug builds for development."
            );
            true
        } else {
            self.headless
        };

        #[cfg(debug_assertions)]
        let headless = self.headless;

        Ok(CrawlConfig {
            storage_dir: self
                .storage_dir
                .ok_or_else(|| anyhow!("storage_dir is required"))?,
            reference_url,
            test_url,
            max_depth: self.max_depth,
            save_screenshots: self.save_screenshots,
            pair_by_query: self.pair_by_query,
            hash_query: self.hash_query,
            target_lang: self
                .target_lang
                .map(|lang| lang.trim().to_lowercase())
                .filter(|lang| !lang.is_empty()),
            strip_selectors: self.strip_selectors,
            reference_error_log_dsn: self.reference_error_log_dsn,
            test_error_log_dsn: self.test_error_log_dsn,
            capture_console: self.capture_console,
            headless,
            max_concurrent_pages: self.max_concurrent_pages,
            max_concurrent_per_domain: self.max_concurrent_per_domain,
            throttle: self.throttle,
            navigation_timeout_secs: self.navigation_timeout_secs,
            evaluation_timeout_secs: self.evaluation_timeout_secs,
            network_idle_timeout_secs: self.network_idle_timeout_secs,
            language_probe_timeout_secs: self.language_probe_timeout_secs,
            log_file_name: self.log_file_name,
            chrome_data_dir: self.chrome_data_dir,
        })
    }
}
