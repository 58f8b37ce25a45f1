//! Crawl run execution
//!
//! `crawl_impl` owns the browser for the whole run: launch, crawl, close.
//! `crawl_with_renderer` runs the same pipeline against any renderer, which
//! is how the crawl is driven without a browser.

use anyhow::Context;
use chrono::Utc;
use log::{debug, info, warn};
use std::sync::Arc;

use super::cleanup::{CleanupResult, cleanup_browser_and_data};
use super::crawl_types::{CrawlError, CrawlResult};
use super::language_filter::{HttpLanguageProbe, LanguageProbe};
use super::orchestrator::crawl_pages;
use super::page_processor::PageProcessorContext;
use super::progress::CrawlSummary;
use crate::browser_setup::launch_browser;
use crate::config::{CrawlConfig, SitePair};
use crate::error_log::ErrorLogStores;
use crate::metrics_log::MetricsLog;
use crate::render::{ChromiumRenderer, PageRenderer, RenderTimeouts};

/// Run a full crawl with a freshly launched browser.
pub async fn crawl_impl(config: CrawlConfig) -> CrawlResult<CrawlSummary> {
    let user_data_dir_is_temporary = config.chrome_data_dir().is_none();
    let (browser, handler_task, chrome_data_dir) =
        launch_browser(config.headless(), config.chrome_data_dir().cloned())
            .await
            .map_err(|e| CrawlError::Browser(format!("{e:#}")))?;

    let browser = Arc::new(browser);
    let renderer = Arc::new(ChromiumRenderer::new(
        Arc::clone(&browser),
        RenderTimeouts {
            navigation: config.navigation_timeout(),
            evaluation: config.evaluation_timeout(),
            network_idle: config.network_idle_timeout(),
        },
    ));

    let result = crawl_with_renderer(config, renderer, None).await;

    // The renderer's clone is gone once the run returns
    match Arc::try_unwrap(browser) {
        Ok(browser) => {
            let data_dir = user_data_dir_is_temporary.then_some(chrome_data_dir);
            match cleanup_browser_and_data(browser, data_dir).await {
                CleanupResult::Success => debug!(target: "dualcrawl::cleanup", "Browser cleanup completed"),
                CleanupResult::PartialFailure(errors) => {
                    warn!(target: "dualcrawl::cleanup", "Cleanup completed with failures: {errors:?}");
                }
            }
        }
        Err(arc) => warn!(
            target: "dualcrawl::cleanup",
            "Browser still has {} strong references, cleanup will happen on drop",
            Arc::strong_count(&arc)
        ),
    }

    // Abort the handler only after the browser is closed
    handler_task.abort();
    if let Err(e) = handler_task.await
        && !e.is_cancelled()
    {
        warn!(target: "dualcrawl::cleanup", "Handler task failed during abort: {e}");
    }

    result
}

/// Run a crawl with the given renderer.
///
/// `language_probe` overrides the HTTP probe used when a target language is
/// configured; it is ignored otherwise.
pub async fn crawl_with_renderer(
    config: CrawlConfig,
    renderer: Arc<dyn PageRenderer>,
    language_probe: Option<Arc<dyn LanguageProbe>>,
) -> CrawlResult<CrawlSummary> {
    let run_started = Utc::now().timestamp();
    let sites = SitePair::from_config(&config).map_err(|e| CrawlError::Config(format!("{e:#}")))?;
    let error_logs = ErrorLogStores::from_config(&config, run_started)
        .map_err(|e| CrawlError::Config(format!("{e:#}")))?;

    let language_probe = match (config.target_lang(), language_probe) {
        (None, _) => None,
        (Some(_), Some(probe)) => Some(probe),
        (Some(_), None) => Some(Arc::new(
            HttpLanguageProbe::new(config.language_probe_timeout())
                .map_err(|e| CrawlError::Config(format!("{e:#}")))?,
        ) as Arc<dyn LanguageProbe>),
    };

    let metrics_log = MetricsLog::create(&config.log_path(), config.capture_console())
        .context("Failed to create metrics log")?;
    info!(target: "dualcrawl::metrics", "Writing page metrics to {}", metrics_log.path().display());

    let ctx = Arc::new(PageProcessorContext::new(
        config,
        sites,
        renderer,
        language_probe,
        metrics_log,
        error_logs,
    ));

    Ok(crawl_pages(ctx).await)
}
