//! Main crawl orchestration loop
//!
//! Coordinates a mirrored crawl with:
//! - a single-owner frontier (only this loop pushes or pops tasks)
//! - bounded concurrent worker tasks
//! - per-task outcomes folded into the run summary
//!
//! The run ends when the frontier is empty and no worker is in flight.

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use log::{debug, error, info};
use std::sync::Arc;
use std::time::Instant;

use super::frontier::{Frontier, seed_task};
use super::page_processor::{PageProcessorContext, process_single_page};
use super::progress::CrawlSummary;

/// Crawl from the seed task until the frontier drains.
pub async fn crawl_pages(ctx: Arc<PageProcessorContext>) -> CrawlSummary {
    let start_time = Instant::now();
    let concurrency = ctx.config.max_concurrent_pages().max(1);

    let mut frontier = Frontier::new();
    frontier.push(seed_task(&ctx.sites));

    let mode = if ctx.sites.is_mirrored() {
        "mirrored"
    } else {
        "test-only"
    };
    info!(
        target: "dualcrawl::crawl",
        "Starting {mode} crawl of {} (max depth {}, {concurrency} concurrent pages)",
        ctx.sites.test.base_url,
        ctx.config.max_depth()
    );

    let mut summary = CrawlSummary::default();
    let mut active_tasks = FuturesUnordered::new();

    loop {
        // Fill up to concurrency limit
        while active_tasks.len() < concurrency {
            let Some(task) = frontier.pop() else { break };
            let ctx = Arc::clone(&ctx);
            active_tasks.push(tokio::spawn(process_single_page(ctx, task)));
        }

        // Frontier is empty and nothing is in flight
        let Some(joined) = active_tasks.next().await else {
            break;
        };

        match joined {
            Ok(outcome) => {
                summary.record(&outcome);
                debug!(
                    target: "dualcrawl::crawl",
                    "{} {} finished as {:?}, {} follow-ups",
                    outcome.task.phase,
                    outcome.task.url,
                    outcome.disposition,
                    outcome.followups.len()
                );
                frontier.extend(outcome.followups);

                let stats = frontier.stats();
                info!(
                    target: "dualcrawl::crawl",
                    "Queue: {} enqueued, {} dequeued, {} remaining, {} in flight",
                    stats.enqueued,
                    stats.dequeued,
                    stats.remaining,
                    active_tasks.len()
                );
            }
            Err(e) => {
                summary.aborted += 1;
                error!(target: "dualcrawl::crawl", "Worker task panicked: {e}");
            }
        }
    }

    summary.elapsed = start_time.elapsed();
    info!(target: "dualcrawl::crawl", "Crawl finished: {summary}");
    summary
}
