//! Per-domain request pacing
//!
//! Sequential requests to one domain are spaced at least `base_delay` apart,
//! and every request additionally waits a random jitter drawn uniformly from
//! `[0, max_delay - base_delay)`. Domains are paced independently of each other.

use crate::state::DomainState;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Tracks the last request per domain and computes how long to wait
#[derive(Debug)]
pub struct DomainPacer {
    base_delay: Duration,
    max_delay: Duration,
    domains: HashMap<String, DomainState>,
}

impl DomainPacer {
    /// Creates a pacer
    ///
    /// # Arguments
    ///
    /// * `base_delay` - Minimum gap between two requests to one domain
    /// * `max_delay` - Upper bound of base delay plus jitter; clamped up to `base_delay`
    pub fn new(base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            domains: HashMap::new(),
        }
    }

    /// Time still owed to the domain's minimum interval, without jitter
    pub fn required_wait(&self, domain: &str, now: Instant) -> Duration {
        self.domains
            .get(domain)
            .and_then(|state| state.time_until_next_request(self.base_delay, now))
            .unwrap_or(Duration::ZERO)
    }

    /// Draws a fresh jitter in `[0, max_delay - base_delay)`
    pub fn jitter(&self) -> Duration {
        let spread = (self.max_delay - self.base_delay).as_millis() as u64;
        if spread == 0 {
            return Duration::ZERO;
        }
        Duration::from_millis(rand::random_range(0..spread))
    }

    /// Total wait before the next request to `domain`
    pub fn delay_for(&self, domain: &str, now: Instant) -> Duration {
        self.required_wait(domain, now) + self.jitter()
    }

    /// Records a request sent to `domain` at `now`
    pub fn record_request(&mut self, domain: &str, now: Instant) {
        self.domains
            .entry(domain.to_string())
            .or_default()
            .record_request(now);
    }

    /// Number of requests sent to `domain` so far
    pub fn request_count(&self, domain: &str) -> u32 {
        self.domains.get(domain).map_or(0, |s| s.request_count)
    }
}
