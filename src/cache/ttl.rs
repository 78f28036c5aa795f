//! Short-TTL key/value cache.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::time::{self, Instant};

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    expires_at: Instant,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: Instant) -> bool {
        now > self.expires_at
    }
}

/// A thread-safe cache whose entries expire after a time-to-live.
#[derive(Debug)]
pub struct ResponseCache<V> {
    entries: DashMap<String, CacheEntry<V>>,
    default_ttl: Duration,
}

impl<V: Clone> ResponseCache<V> {
    /// Create a new empty cache.
    pub fn new(default_ttl: Duration) -> Self {
        tracing::debug!(ttl = ?default_ttl, "Response cache initialized");
        Self {
            entries: DashMap::new(),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    /// Store `value` under `key` with the default TTL.
    pub fn set(&self, key: impl Into<String>, value: V) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store `value` under `key`, expiring `ttl` from now.
    pub fn set_with_ttl(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let key = key.into();
        tracing::trace!(key = %key, ttl = ?ttl, "Cache set");
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Return the cached value if present and not expired.
    /// An expired entry is evicted on the way out.
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        {
            let entry = self.entries.get(key)?;
            if !entry.is_expired(now) {
                return Some(entry.value.clone());
            }
        }

        // The read guard must be released before removing.
        self.entries.remove_if(key, |_, entry| entry.is_expired(now));
        tracing::trace!(key = %key, "Cache entry expired");
        None
    }

    /// Drop a single entry immediately.
    pub fn invalidate(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Remove every expired entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        let purged = before.saturating_sub(self.entries.len());
        if purged > 0 {
            tracing::debug!(purged, "Purged expired cache entries");
        }
        purged
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Spawn the periodic sweep. The task exits when `shutdown` fires.
pub fn spawn_purge_task<V>(
    cache: Arc<ResponseCache<V>>,
    every: Duration,
    mut shutdown: broadcast::Receiver<()>,
) -> tokio::task::JoinHandle<()>
where
    V: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        let mut ticker = time::interval_at(Instant::now() + every, every);
        ticker.set_missed_tick_behavior(time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cache.purge_expired();
                }
                _ = shutdown.recv() => {
                    tracing::debug!("Cache purge task stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_hit_then_miss_after_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(30));
        cache.set_with_ttl("k", 7u32, Duration::from_millis(50));
        assert_eq!(cache.get("k"), Some(7));

        tokio::time::sleep(Duration::from_millis(60)).await;
        assert_eq!(cache.get("k"), None);
        // Lazily evicted.
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_default_ttl() {
        let cache = ResponseCache::new(Duration::from_secs(5));
        cache.set("model:echo", vec!["http://b1".to_string()]);

        time::advance(Duration::from_millis(4_999)).await;
        assert!(cache.get("model:echo").is_some());

        // Still served at exactly the expiry instant.
        time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("model:echo").is_some());

        time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("model:echo").is_none());
    }

    #[tokio::test]
    async fn test_missing_key() {
        let cache: ResponseCache<String> = ResponseCache::new(Duration::from_secs(1));
        assert_eq!(cache.get("nope"), None);
    }

    #[tokio::test]
    async fn test_overwrite_resets_expiry() {
        let cache = ResponseCache::new(Duration::from_secs(1));
        cache.set_with_ttl("k", 1, Duration::from_millis(20));
        cache.set_with_ttl("k", 2, Duration::from_secs(10));
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set("k", "v");
        assert!(cache.invalidate("k"));
        assert!(!cache.invalidate("k"));
        assert_eq!(cache.get("k"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_expired() {
        let cache = ResponseCache::new(Duration::from_secs(10));
        cache.set_with_ttl("short", 1, Duration::from_secs(1));
        cache.set_with_ttl("long", 2, Duration::from_secs(60));

        time::advance(Duration::from_secs(2)).await;
        assert_eq!(cache.purge_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("long"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_purge_task_sweeps_until_shutdown() {
        let cache = Arc::new(ResponseCache::new(Duration::from_secs(1)));
        let (tx, rx) = broadcast::channel(1);
        let handle = spawn_purge_task(cache.clone(), Duration::from_secs(5), rx);

        cache.set("k", 1);
        time::sleep(Duration::from_secs(6)).await;
        assert!(cache.is_empty());

        tx.send(()).unwrap();
        handle.await.unwrap();
    }
}
