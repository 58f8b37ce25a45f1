//! Mirrored dual-site crawler.
//!
//! Crawls a reference site, replays every discovered path against a test
//! site, and records rendered HTML, Markdown, optional screenshots and one
//! metrics row per page, correlated with each site's error log.

pub mod browser_setup;
pub mod config;
pub mod content_saver;
pub mod crawl_engine;
pub mod error_log;
pub mod metrics_log;
pub mod render;
pub mod utils;

pub use browser_setup::{download_managed_browser, find_browser_executable, launch_browser};
pub use config::{CrawlConfig, Credentials, Site, SitePair, ThrottleConfig};
pub use crawl_engine::{
    CrawlError, CrawlResult, CrawlSummary, CrawlTask, Phase, crawl_with_renderer,
};
pub use metrics_log::{MetricsLog, MetricsRecord};
pub use render::{PageRenderer, RenderFailure, RenderRequest, RenderResult, TimingMetrics};

/// Run a mirrored crawl with a freshly launched browser.
pub async fn crawl(config: CrawlConfig) -> CrawlResult<CrawlSummary> {
    crawl_engine::crawl_impl(config).await
}
