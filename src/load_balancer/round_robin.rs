//! Round-robin load balancing with temporary exclusion.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use dashmap::DashMap;

use crate::load_balancer::{cooldown::FailedSet, LoadBalancer};

/// Round-robin selector.
/// Keeps one counter per capability name so each capability rotates
/// independently.
#[derive(Debug)]
pub struct RoundRobin {
    counters: DashMap<String, AtomicUsize>,
    failed: FailedSet,
}

impl RoundRobin {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            counters: DashMap::new(),
            failed: FailedSet::new(cooldown),
        }
    }

    fn next_index(&self, capability: &str) -> usize {
        if let Some(counter) = self.counters.get(capability) {
            return counter.fetch_add(1, Ordering::Relaxed);
        }
        self.counters
            .entry(capability.to_string())
            .or_insert_with(|| AtomicUsize::new(0))
            .fetch_add(1, Ordering::Relaxed)
    }
}

impl Default for RoundRobin {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl LoadBalancer for RoundRobin {
    fn select_backend(&self, capability: &str, candidates: &[String]) -> Option<String> {
        if candidates.is_empty() {
            tracing::warn!(capability = %capability, "No candidates to select from");
            return None;
        }

        let available: Vec<&String> = candidates
            .iter()
            .filter(|url| !self.failed.contains(url))
            .collect();

        if available.is_empty() {
            tracing::warn!(capability = %capability, "All candidates are cooling down");
            let recovered = self.failed.release_one(candidates);
            if let Some(url) = &recovered {
                tracing::info!(capability = %capability, url = %url, "Attempting recovery of failed backend");
            }
            return recovered;
        }

        let index = self.next_index(capability) % available.len();
        Some(available[index].clone())
    }

    fn mark_failed(&self, url: &str) {
        self.failed.mark_failed(url);
    }

    fn failed_backends(&self) -> Vec<String> {
        self.failed.snapshot()
    }

    fn reset(&self) {
        self.counters.clear();
        self.failed.clear();
        tracing::info!("Load balancer reset");
    }
}
