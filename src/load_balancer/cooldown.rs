//! Failed-backend tracking with timed re-admission.
//!
//! # Responsibilities
//! - Exclude backends that recently failed
//! - Re-admit them automatically once their cooldown elapses
//! - Release one backend early when nothing else is selectable
//!
//! # Design Decisions
//! - Re-admission is a spawned timer holding only the URL, a generation and a
//!   handle to the shared set; it fires whether or not traffic arrives
//! - A URL marked failed again gets a new generation, so the older timer
//!   becomes a no-op
//! - Selection also checks the deadline, so an excluded URL is never returned
//!   even if its timer is delayed

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Clone, Copy)]
struct Exclusion {
    until: Instant,
    generation: u64,
}

#[derive(Debug, Default)]
struct Inner {
    excluded: HashMap<String, Exclusion>,
    next_generation: u64,
}

/// Process-wide set of backends currently cooling down.
#[derive(Debug, Clone)]
pub struct FailedSet {
    inner: Arc<Mutex<Inner>>,
    cooldown: Duration,
}

impl FailedSet {
    pub fn new(cooldown: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            cooldown,
        }
    }

    pub fn cooldown(&self) -> Duration {
        self.cooldown
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Critical sections never panic; recover the data if one somehow did.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Exclude `url` for one cooldown period and schedule its re-admission.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn mark_failed(&self, url: &str) {
        let generation = {
            let mut inner = self.lock();
            inner.next_generation += 1;
            let generation = inner.next_generation;
            inner.excluded.insert(
                url.to_string(),
                Exclusion {
                    until: Instant::now() + self.cooldown,
                    generation,
                },
            );
            generation
        };

        tracing::warn!(url = %url, cooldown = ?self.cooldown, "Marked backend as failed");

        let set = self.clone();
        let url = url.to_string();
        tokio::spawn(async move {
            tokio::time::sleep(set.cooldown).await;
            set.readmit(&url, generation);
        });
    }

    fn readmit(&self, url: &str, generation: u64) {
        let mut inner = self.lock();
        let current = inner.excluded.get(url).map(|e| e.generation);
        if current == Some(generation) {
            inner.excluded.remove(url);
            drop(inner);
            tracing::info!(url = %url, "Backend re-admitted after cooldown");
        }
    }

    /// True while `url` is excluded from selection.
    pub fn contains(&self, url: &str) -> bool {
        let now = Instant::now();
        self.lock()
            .excluded
            .get(url)
            .is_some_and(|e| now < e.until)
    }

    /// Release one of `candidates` from the set early and return it.
    ///
    /// Picks the candidate whose cooldown would end soonest. Candidates that
    /// are not in the set at all are preferred over excluded ones.
    pub fn release_one(&self, candidates: &[String]) -> Option<String> {
        let mut inner = self.lock();
        let chosen = candidates
            .iter()
            .min_by_key(|url| inner.excluded.get(url.as_str()).map(|e| e.until))?
            .clone();
        inner.excluded.remove(&chosen);
        Some(chosen)
    }

    /// Explicitly re-admit `url`.
    pub fn recover(&self, url: &str) -> bool {
        self.lock().excluded.remove(url).is_some()
    }

    /// URLs still cooling down, sorted.
    pub fn snapshot(&self) -> Vec<String> {
        let now = Instant::now();
        let mut urls: Vec<String> = self
            .lock()
            .excluded
            .iter()
            .filter(|(_, e)| now < e.until)
            .map(|(url, _)| url.clone())
            .collect();
        urls.sort();
        urls
    }

    pub fn clear(&self) {
        self.lock().excluded.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_timer_readmits() {
        let set = FailedSet::new(Duration::from_secs(30));
        set.mark_failed("http://b1");
        assert!(set.contains("http://b1"));

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert!(!set.contains("http://b1"));
        assert!(set.lock().excluded.is_empty(), "timer should have removed the entry");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_timer_does_not_readmit() {
        let set = FailedSet::new(Duration::from_secs(30));
        set.mark_failed("http://b1");

        tokio::time::sleep(Duration::from_secs(20)).await;
        set.mark_failed("http://b1");

        // First timer fires at t=30 but belongs to an older generation.
        tokio::time::sleep(Duration::from_secs(15)).await;
        assert!(set.contains("http://b1"));

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert!(!set.contains("http://b1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_release_prefers_soonest_deadline() {
        let set = FailedSet::new(Duration::from_secs(30));
        set.mark_failed("http://b1");
        tokio::time::sleep(Duration::from_secs(5)).await;
        set.mark_failed("http://b2");

        let candidates = vec!["http://b2".to_string(), "http://b1".to_string()];
        assert_eq!(set.release_one(&candidates).as_deref(), Some("http://b1"));
        assert!(!set.contains("http://b1"));
        assert!(set.contains("http://b2"));
        assert_eq!(set.release_one(&[]), None);
    }

    #[tokio::test]
    async fn test_recover_and_snapshot() {
        let set = FailedSet::new(Duration::from_secs(30));
        set.mark_failed("http://b2");
        set.mark_failed("http://b1");
        assert_eq!(set.snapshot(), vec!["http://b1".to_string(), "http://b2".to_string()]);

        assert!(set.recover("http://b1"));
        assert!(!set.recover("http://b1"));
        assert_eq!(set.snapshot(), vec!["http://b2".to_string()]);

        set.clear();
        assert!(set.snapshot().is_empty());
    }
}
