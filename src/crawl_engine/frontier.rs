//! Crawl frontier: pending tasks, per-phase visited sets and follow-up planning.
//!
//! The queue is owned by the orchestrator loop alone. Worker tasks never
//! touch it; they hand their follow-ups back with their outcome. The visited
//! sets are the only frontier state shared with workers.

use dashmap::DashSet;
use log::{debug, warn};
use scraper::{Html, Selector};
use std::collections::{HashSet, VecDeque};
use url::Url;

use super::crawl_types::{CrawlTask, Phase};
use crate::config::SitePair;
use crate::utils::{dedup_key, is_crawlable_document, is_crawlable_link, request_relative_url};

/// Dedup keys already admitted, one set per phase. Append-only.
#[derive(Debug, Default)]
pub struct VisitedSets {
    reference: DashSet<String>,
    test: DashSet<String>,
    pair_by_query: bool,
}

impl VisitedSets {
    #[must_use]
    pub fn new(pair_by_query: bool) -> Self {
        Self {
            reference: DashSet::new(),
            test: DashSet::new(),
            pair_by_query,
        }
    }

    fn set(&self, phase: Phase) -> &DashSet<String> {
        match phase {
            Phase::Reference => &self.reference,
            Phase::Test => &self.test,
        }
    }

    /// Check-and-insert in one step. Returns `true` only for the first caller with this key.
    pub fn admit(&self, phase: Phase, url: &Url) -> bool {
        self.set(phase).insert(dedup_key(url, self.pair_by_query))
    }

    #[must_use]
    pub fn contains(&self, phase: Phase, url: &Url) -> bool {
        self.set(phase).contains(&dedup_key(url, self.pair_by_query))
    }

    #[must_use]
    pub fn len(&self, phase: Phase) -> usize {
        self.set(phase).len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.reference.is_empty() && self.test.is_empty()
    }
}

/// Snapshot of queue counters for the per-page stats line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QueueStats {
    pub enqueued: usize,
    pub dequeued: usize,
    pub remaining: usize,
}

/// FIFO of tasks waiting for a worker
#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<CrawlTask>,
    enqueued: usize,
    dequeued: usize,
}

impl Frontier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, task: CrawlTask) {
        self.enqueued += 1;
        self.queue.push_back(task);
    }

    pub fn extend(&mut self, tasks: impl IntoIterator<Item = CrawlTask>) {
        for task in tasks {
            self.push(task);
        }
    }

    pub fn pop(&mut self) -> Option<CrawlTask> {
        let task = self.queue.pop_front()?;
        self.dequeued += 1;
        Some(task)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued,
            dequeued: self.dequeued,
            remaining: self.queue.len(),
        }
    }
}

/// Task that starts the run: the reference start URL, or the test base URL in test-only mode.
#[must_use]
pub fn seed_task(sites: &SitePair) -> CrawlTask {
    match &sites.reference {
        Some(reference) => CrawlTask::new(reference.base_url.clone(), Phase::Reference, 0),
        None => CrawlTask::new(sites.test.base_url.clone(), Phase::Test, 0),
    }
}

/// Test-phase task for the same relative request (path and query) as `task`.
///
/// The test task keeps the reference task's depth.
#[must_use]
pub fn paired_test_task(task: &CrawlTask, sites: &SitePair) -> Option<CrawlTask> {
    let relative = request_relative_url(&task.url);
    match sites.test.base_url.join(&relative) {
        Ok(url) => Some(CrawlTask::new(url, Phase::Test, task.depth)),
        Err(e) => {
            warn!(
                target: "dualcrawl::frontier",
                "Cannot pair {} onto test site: {e}",
                task.url
            );
            None
        }
    }
}

/// Tasks that follow from one successfully fetched page.
///
/// A reference page yields its test sibling first, then one task per
/// same-domain crawlable link while depth budget remains. A test page
/// yields nothing, except in test-only mode where it follows links the
/// way a reference page would.
///
/// URLs already in `visited` are left out to keep the queue small. This is
/// only a pre-filter: [`VisitedSets::admit`] still decides at dequeue time.
#[must_use]
pub fn plan_followups(
    task: &CrawlTask,
    final_url: &Url,
    dom: &str,
    sites: &SitePair,
    visited: &VisitedSets,
    max_depth: u8,
) -> Vec<CrawlTask> {
    let mut followups = Vec::new();

    let follows_links = match task.phase {
        Phase::Reference => {
            followups.extend(
                paired_test_task(task, sites)
                    .filter(|paired| !visited.contains(Phase::Test, &paired.url)),
            );
            true
        }
        Phase::Test => !sites.is_mirrored(),
    };

    if !follows_links || task.depth >= max_depth {
        return followups;
    }
    let Some(site) = sites.site(task.phase) else {
        return followups;
    };

    let links = extract_links(dom, final_url);
    let before = links.len();
    let next_depth = task.depth + 1;
    followups.extend(
        links
            .into_iter()
            .filter(|link| site.owns(link) && is_crawlable_document(link))
            .filter(|link| !visited.contains(task.phase, link))
            .map(|link| CrawlTask::new(link, task.phase, next_depth)),
    );

    debug!(
        target: "dualcrawl::links",
        "Found {before} links on {}, {} scheduled at depth {next_depth}",
        task.url,
        followups.iter().filter(|t| t.phase == task.phase).count()
    );

    followups
}

/// Every distinct `a[href]` target in `html`, resolved against `base` with fragments dropped.
#[must_use]
pub fn extract_links(html: &str, base: &Url) -> Vec<Url> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };
    let document = Html::parse_document(html);
    let mut seen = HashSet::new();

    document
        .select(&selector)
        .filter_map(|anchor| anchor.value().attr("href"))
        .filter(|href| is_crawlable_link(href))
        .filter_map(|href| base.join(href.trim()).ok())
        .filter_map(|mut url| {
            url.set_fragment(None);
            seen.insert(url.as_str().to_string()).then_some(url)
        })
        .collect()
}
