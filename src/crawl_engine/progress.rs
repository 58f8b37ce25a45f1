//! Run statistics
//!
//! Counters live with the orchestrator loop, which sees every task outcome;
//! workers never touch them.

use serde::Serialize;
use std::fmt;
use std::time::Duration;

use super::crawl_types::{Phase, TaskDisposition, TaskOutcome};

/// Totals reported at the end of a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub reference_processed: usize,
    pub test_processed: usize,
    pub failed: usize,
    pub duplicates: usize,
    pub language_skipped: usize,
    /// Worker tasks that panicked; their outcome is unknown
    pub aborted: usize,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl CrawlSummary {
    #[must_use]
    pub fn processed(&self, phase: Phase) -> usize {
        match phase {
            Phase::Reference => self.reference_processed,
            Phase::Test => self.test_processed,
        }
    }

    /// Record one finished task
    pub fn record(&mut self, outcome: &TaskOutcome) {
        match outcome.disposition {
            TaskDisposition::Processed => match outcome.task.phase {
                Phase::Reference => self.reference_processed += 1,
                Phase::Test => self.test_processed += 1,
            },
            TaskDisposition::Failed => self.failed += 1,
            TaskDisposition::Duplicate => self.duplicates += 1,
            TaskDisposition::LanguageMismatch => self.language_skipped += 1,
        }
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reference and {} test pages processed, {} failed, {} duplicates skipped, \
             {} skipped by language in {:.1}s",
            self.reference_processed,
            self.test_processed,
            self.failed,
            self.duplicates,
            self.language_skipped,
            self.elapsed.as_secs_f64()
        )?;
        if self.aborted > 0 {
            write!(f, " ({} worker tasks aborted)", self.aborted)?;
        }
        Ok(())
    }
}
