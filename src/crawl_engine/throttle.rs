//! Adaptive per-domain request throttle
//!
//! Each domain owns a delay slot. Requests to the domain are spaced at
//! least `delay` apart, and every response nudges the delay toward
//! `latency / target_concurrency`:
//!
//! - slow responses raise the delay immediately,
//! - fast responses lower it by averaging with the current value,
//! - failed or non-2xx responses may raise it but never lower it.
//!
//! The delay always stays inside `[min_delay, max_delay]`.

use dashmap::DashMap;
use log::debug;
use parking_lot::Mutex;
use std::time::Duration;
use tokio::time::Instant;

use crate::config::ThrottleConfig;

#[derive(Debug)]
struct DomainSlot {
    delay: Duration,
    /// Earliest instant the next request to this domain may start
    next_allowed: Instant,
}

/// Adaptive delay shared by every task of a crawl run
pub struct AdaptiveThrottle {
    config: ThrottleConfig,
    slots: DashMap<String, Mutex<DomainSlot>>,
}

impl AdaptiveThrottle {
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            slots: DashMap::new(),
        }
    }

    fn initial_delay(&self) -> Duration {
        self.config
            .start_delay
            .clamp(self.config.min_delay, self.config.max_delay)
    }

    /// Wait until this domain's next slot, reserving it for the caller.
    pub async fn wait_turn(&self, domain: &str) {
        if !self.config.enabled {
            return;
        }

        let start_at = {
            let entry = self.slots.entry(domain.to_string()).or_insert_with(|| {
                Mutex::new(DomainSlot {
                    delay: self.initial_delay(),
                    next_allowed: Instant::now(),
                })
            });
            let mut slot = entry.lock();
            let start_at = slot.next_allowed.max(Instant::now());
            slot.next_allowed = start_at + slot.delay;
            start_at
        };

        tokio::time::sleep_until(start_at).await;
    }

    /// Feed one response's latency back into the domain's delay.
    pub fn record_response(&self, domain: &str, latency: Duration, success: bool) {
        if !self.config.enabled {
            return;
        }

        let entry = self.slots.entry(domain.to_string()).or_insert_with(|| {
            Mutex::new(DomainSlot {
                delay: self.initial_delay(),
                next_allowed: Instant::now(),
            })
        });
        let mut slot = entry.lock();

        let target = Duration::try_from_secs_f64(
            latency.as_secs_f64() / self.config.target_concurrency,
        )
        .map_or(self.config.max_delay, |target| target.min(self.config.max_delay));
        let averaged = (slot.delay + target) / 2;
        let mut next = target.max(averaged);
        if !success && next < slot.delay {
            next = slot.delay;
        }
        let next = next.clamp(self.config.min_delay, self.config.max_delay);

        if next != slot.delay {
            debug!(
                target: "dualcrawl::throttle",
                "{domain}: delay {:?} -> {:?} (latency {:?})",
                slot.delay, next, latency
            );
        }
        slot.delay = next;
    }

    /// Current delay for `domain`, if it has been seen
    #[must_use]
    pub fn current_delay(&self, domain: &str) -> Option<Duration> {
        self.slots.get(domain).map(|slot| slot.lock().delay)
    }
}
