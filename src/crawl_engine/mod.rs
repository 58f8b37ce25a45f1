//! Crawl Engine Module
//!
//! The mirrored crawl: task types, admission (language and dedup), the
//! per-page pipeline, the frontier and the orchestration loop.

pub mod cleanup;
pub mod crawl_types;
pub mod domain_limiter;
pub mod execution;
pub mod frontier;
pub mod language_filter;
pub mod orchestrator;
pub mod page_processor;
pub mod page_timeout;
pub mod progress;
pub mod throttle;

pub use crawl_types::{
    CrawlError, CrawlResult, CrawlTask, Phase, TaskDisposition, TaskOutcome,
};
pub use domain_limiter::DomainLimiter;
pub use execution::{crawl_impl, crawl_with_renderer};
pub use frontier::{
    Frontier, QueueStats, VisitedSets, extract_links, paired_test_task, plan_followups, seed_task,
};
pub use language_filter::{HttpLanguageProbe, LanguageProbe, extract_html_lang, language_matches};
pub use orchestrator::crawl_pages;
pub use page_processor::{PageProcessorContext, process_single_page};
pub use page_timeout::with_page_timeout;
pub use progress::CrawlSummary;
pub use throttle::AdaptiveThrottle;
