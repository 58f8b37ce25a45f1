//! Single task processing
//!
//! Runs one crawl task through admission, rendering, artifact persistence
//! and metrics logging, and hands the follow-up tasks back to the
//! orchestrator. Nothing in here returns an error: every failure becomes a
//! disposition plus, where a fetch was attempted, a log row.

use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

use super::crawl_types::{CrawlTask, TaskDisposition, TaskOutcome};
use super::domain_limiter::DomainLimiter;
use super::frontier::{VisitedSets, plan_followups};
use super::language_filter::{LanguageProbe, language_matches};
use super::throttle::AdaptiveThrottle;
use crate::config::{CrawlConfig, Site, SitePair};
use crate::content_saver::{save_html_content, save_markdown_content, save_screenshot};
use crate::error_log::{ErrorLogStores, digest};
use crate::metrics_log::{MetricsLog, MetricsRecord};
use crate::render::{PageRenderer, RenderRequest, RenderResult};
use crate::utils::{relative_path, request_relative_url};

/// Shared state every worker task reads. Built once per run.
pub struct PageProcessorContext {
    pub config: CrawlConfig,
    pub sites: SitePair,
    pub visited: VisitedSets,
    pub renderer: Arc<dyn PageRenderer>,
    /// Present only when a target language is configured
    pub language_probe: Option<Arc<dyn LanguageProbe>>,
    pub domain_limiter: DomainLimiter,
    pub throttle: AdaptiveThrottle,
    pub metrics_log: MetricsLog,
    pub error_logs: ErrorLogStores,
}

impl PageProcessorContext {
    #[must_use]
    pub fn new(
        config: CrawlConfig,
        sites: SitePair,
        renderer: Arc<dyn PageRenderer>,
        language_probe: Option<Arc<dyn LanguageProbe>>,
        metrics_log: MetricsLog,
        error_logs: ErrorLogStores,
    ) -> Self {
        Self {
            visited: VisitedSets::new(config.pair_by_query()),
            domain_limiter: DomainLimiter::new(config.max_concurrent_per_domain()),
            throttle: AdaptiveThrottle::new(*config.throttle()),
            config,
            sites,
            renderer,
            language_probe,
            metrics_log,
            error_logs,
        }
    }
}

/// Process one task to completion.
pub async fn process_single_page(ctx: Arc<PageProcessorContext>, task: CrawlTask) -> TaskOutcome {
    let Some(site) = ctx.sites.site(task.phase) else {
        warn!(
            target: "dualcrawl::crawl",
            "No {} site configured, dropping {}",
            task.phase,
            task.url
        );
        return TaskOutcome::dropped(task, TaskDisposition::Failed);
    };

    if let Some(target) = ctx.config.target_lang()
        && !admits_language(&ctx, site, &task, target).await
    {
        return TaskOutcome::dropped(task, TaskDisposition::LanguageMismatch);
    }

    if !ctx.visited.admit(task.phase, &task.url) {
        debug!(
            target: "dualcrawl::crawl",
            "Skipping duplicate {} page {}",
            task.phase,
            task.url
        );
        return TaskOutcome::dropped(task, TaskDisposition::Duplicate);
    }

    let _domain_permit = ctx.domain_limiter.acquire(&site.domain).await;
    ctx.throttle.wait_turn(&site.domain).await;

    let request = RenderRequest {
        url: task.url.clone(),
        auth: site.auth.clone(),
        screenshot: ctx.config.save_screenshots(),
        strip_selectors: ctx.config.strip_selectors().to_vec(),
        capture_console: ctx.config.capture_console(),
    };

    info!(target: "dualcrawl::crawl", "Fetching {} page {} (depth {})", task.phase, task.url, task.depth);
    let started = Instant::now();
    let rendered = ctx.renderer.render(request).await;
    let latency = started.elapsed();

    let lookup_path = request_relative_url(&task.url);

    match rendered {
        Ok(result) => {
            let success = result.status.is_some_and(|code| (200..300).contains(&code));
            ctx.throttle.record_response(&site.domain, latency, success);

            persist_artifacts(&ctx, &task, &result).await;

            let digest = error_log_digest(&ctx, &task, &lookup_path).await;
            let record = MetricsRecord::from_render(&result, digest);
            if let Err(e) = ctx.metrics_log.append(&record) {
                warn!(target: "dualcrawl::metrics", "Failed to log {}: {e:#}", task.url);
            }

            let followups = plan_followups(
                &task,
                &result.final_url,
                &result.dom_snapshot,
                &ctx.sites,
                &ctx.visited,
                ctx.config.max_depth(),
            );
            TaskOutcome {
                task,
                disposition: TaskDisposition::Processed,
                followups,
            }
        }
        Err(failure) => {
            ctx.throttle.record_response(&site.domain, latency, false);
            warn!(target: "dualcrawl::crawl", "{failure}");

            let digest = error_log_digest(&ctx, &task, &lookup_path).await;
            let record = MetricsRecord::from_failure(task.url.as_str(), &failure, digest);
            if let Err(e) = ctx.metrics_log.append(&record) {
                warn!(target: "dualcrawl::metrics", "Failed to log {}: {e:#}", task.url);
            }
            TaskOutcome::dropped(task, TaskDisposition::Failed)
        }
    }
}

/// Probe the page's declared language. A failed probe counts as a mismatch.
async fn admits_language(
    ctx: &PageProcessorContext,
    site: &Site,
    task: &CrawlTask,
    target: &str,
) -> bool {
    let Some(probe) = &ctx.language_probe else {
        return true;
    };
    match probe.declared_language(&task.url, site.auth.as_ref()).await {
        Ok(declared) if language_matches(declared.as_deref(), target) => true,
        Ok(declared) => {
            info!(
                target: "dualcrawl::crawl",
                "Skipping {} (language {:?}, want {target})",
                task.url,
                declared.as_deref().unwrap_or("undeclared")
            );
            false
        }
        Err(e) => {
            warn!(target: "dualcrawl::crawl", "Language probe failed, skipping {}: {e:#}", task.url);
            false
        }
    }
}

/// Write HTML, Markdown and (if captured) screenshot artifacts.
///
/// Each write is independent; one failing does not stop the others.
async fn persist_artifacts(ctx: &PageProcessorContext, task: &CrawlTask, result: &RenderResult) {
    let storage = ctx.config.storage_dir();
    let relative = relative_path(&task.url, ctx.config.hash_query());

    if let Err(e) = save_html_content(storage, task.phase, &relative, result.body_bytes()).await {
        warn!(target: "dualcrawl::artifacts", "HTML artifact for {} not saved: {e:#}", task.url);
    }

    if let Err(e) =
        save_markdown_content(storage, task.phase, &relative, result.dom_snapshot.clone()).await
    {
        warn!(target: "dualcrawl::artifacts", "Markdown artifact for {} not saved: {e:#}", task.url);
    }

    if let Some(png) = &result.screenshot
        && let Err(e) = save_screenshot(storage, task.phase, &relative, png).await
    {
        warn!(target: "dualcrawl::artifacts", "Screenshot for {} not saved: {e:#}", task.url);
    }
}

/// Digest cell for the task's row; empty when the phase has no backend.
async fn error_log_digest(ctx: &PageProcessorContext, task: &CrawlTask, path: &str) -> String {
    match ctx.error_logs.for_phase(task.phase) {
        Some(store) => digest(store, path, ctx.error_logs.run_started()).await,
        None => String::new(),
    }
}
