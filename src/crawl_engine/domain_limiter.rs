//! Per-domain concurrency limiter
//!
//! Caps how many pages are rendered against one site at the same time,
//! independently of the global page limit.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Per-domain concurrency limiter using lock-free `DashMap`
///
/// Each domain gets its own semaphore, created lazily on first use.
pub struct DomainLimiter {
    domain_semaphores: DashMap<String, Arc<Semaphore>>,
    max_per_domain: usize,
}

impl DomainLimiter {
    #[must_use]
    pub fn new(max_per_domain: usize) -> Self {
        Self {
            domain_semaphores: DashMap::new(),
            max_per_domain,
        }
    }

    /// Acquire a permit for `domain`; it is released when dropped.
    pub async fn acquire(&self, domain: &str) -> OwnedSemaphorePermit {
        loop {
            let semaphore = self
                .domain_semaphores
                .entry(domain.to_string())
                .or_insert_with(|| Arc::new(Semaphore::new(self.max_per_domain)))
                .clone();

            match semaphore.acquire_owned().await {
                Ok(permit) => return permit,
                Err(_) => {
                    // Semaphores are never closed here; recover by replacing it
                    log::error!(
                        target: "dualcrawl::limiter",
                        "Semaphore for domain '{domain}' was closed unexpectedly - replacing"
                    );
                    self.domain_semaphores.remove(domain);
                }
            }
        }
    }

    /// Permits currently free for `domain`
    #[must_use]
    pub fn available(&self, domain: &str) -> usize {
        self.domain_semaphores
            .get(domain)
            .map_or(self.max_per_domain, |s| s.available_permits())
    }
}
