//! In-memory registry store.
//!
//! # Responsibilities
//! - Own the backend records keyed by base URL
//! - Maintain the by-type and by-name capability indexes
//! - Apply health updates coming from the health checker
//!
//! The primary map and both indexes live behind a single lock so every
//! register/unregister is observed atomically.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use chrono::Utc;
use tokio::sync::RwLock;
use url::Url;

use crate::observability::metrics;
use crate::registry::types::{BackendRecord, CapabilityDecl, RegisterOutcome, RegistryError};

#[derive(Debug, Default)]
struct RegistryState {
    services: HashMap<String, BackendRecord>,
    /// capability type → URLs offering at least one capability of that type.
    by_type: HashMap<String, HashSet<String>>,
    /// capability name → URLs offering it.
    by_name: HashMap<String, HashSet<String>>,
}

impl RegistryState {
    fn index(&mut self, record: &BackendRecord) {
        for (name, kind) in &record.models {
            self.by_type
                .entry(kind.clone())
                .or_default()
                .insert(record.url.clone());
            self.by_name
                .entry(name.clone())
                .or_default()
                .insert(record.url.clone());
        }
    }

    fn unindex(&mut self, record: &BackendRecord) {
        for (name, kind) in &record.models {
            remove_from_bucket(&mut self.by_type, kind, &record.url);
            remove_from_bucket(&mut self.by_name, name, &record.url);
        }
    }
}

fn remove_from_bucket(index: &mut HashMap<String, HashSet<String>>, key: &str, url: &str) {
    if let Some(bucket) = index.get_mut(key) {
        bucket.remove(url);
        if bucket.is_empty() {
            index.remove(key);
        }
    }
}

/// Normalise a backend base URL into its registry key.
pub fn normalize_url(raw: &str) -> Result<String, RegistryError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RegistryError::MissingUrl);
    }
    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") && url.has_host() => {
            Ok(trimmed.trim_end_matches('/').to_string())
        }
        _ => Err(RegistryError::InvalidUrl(trimmed.to_string())),
    }
}

/// Thread-safe registry of backends and their capabilities.
#[derive(Debug, Default)]
pub struct RegistryStore {
    state: RwLock<RegistryState>,
}

impl RegistryStore {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or re-register) a backend with its capability manifest.
    ///
    /// A re-registration replaces the previous capability set wholesale.
    /// Entries missing a name or type are skipped.
    pub async fn register(
        &self,
        url: &str,
        capabilities: &[CapabilityDecl],
    ) -> Result<RegisterOutcome, RegistryError> {
        let url = normalize_url(url)?;

        let mut models = BTreeMap::new();
        let mut skipped = 0;
        for decl in capabilities {
            match decl.parts() {
                Some((name, kind)) => {
                    models.insert(name.to_string(), kind.to_string());
                }
                None => {
                    tracing::warn!(url = %url, entry = ?decl, "Skipping invalid capability entry");
                    skipped += 1;
                }
            }
        }

        let record = BackendRecord {
            url: url.clone(),
            models,
            healthy: true,
            last_checked_at: Utc::now(),
        };
        let accepted = record.models.len();

        let mut state = self.state.write().await;
        if let Some(previous) = state.services.remove(&url) {
            state.unindex(&previous);
        }
        state.index(&record);
        state.services.insert(url.clone(), record);
        metrics::record_registry_size(state.services.len());
        drop(state);

        tracing::info!(url = %url, accepted, skipped, "Service registered");
        Ok(RegisterOutcome {
            url,
            accepted,
            skipped,
        })
    }

    /// Remove a backend. Returns `false` when the URL was not registered.
    pub async fn unregister(&self, url: &str) -> bool {
        let Ok(url) = normalize_url(url) else {
            return false;
        };

        let mut state = self.state.write().await;
        let Some(record) = state.services.remove(&url) else {
            tracing::warn!(url = %url, "Attempted to unregister unknown service");
            return false;
        };
        state.unindex(&record);
        metrics::record_registry_size(state.services.len());
        drop(state);

        tracing::info!(url = %url, "Service unregistered");
        true
    }

    /// Snapshot of every registered backend.
    pub async fn list_all(&self) -> BTreeMap<String, BackendRecord> {
        self.state
            .read()
            .await
            .services
            .iter()
            .map(|(url, record)| (url.clone(), record.clone()))
            .collect()
    }

    /// Capability names of the given type across all backends indexed under it.
    /// Health is deliberately not considered here.
    pub async fn list_by_type(&self, kind: &str) -> Vec<String> {
        let state = self.state.read().await;
        let Some(urls) = state.by_type.get(kind) else {
            return Vec::new();
        };

        let mut names = BTreeSet::new();
        for url in urls {
            if let Some(record) = state.services.get(url) {
                names.extend(
                    record
                        .models
                        .iter()
                        .filter(|(_, k)| k.as_str() == kind)
                        .map(|(name, _)| name.clone()),
                );
            }
        }
        names.into_iter().collect()
    }

    /// Healthy backends offering the named capability, sorted by URL.
    pub async fn list_by_model(&self, name: &str) -> Vec<String> {
        let state = self.state.read().await;
        let Some(urls) = state.by_name.get(name) else {
            return Vec::new();
        };

        let mut healthy: Vec<String> = urls
            .iter()
            .filter(|url| state.services.get(*url).is_some_and(|r| r.healthy))
            .cloned()
            .collect();
        healthy.sort();
        healthy
    }

    /// Record a health observation. Unknown URLs are ignored.
    pub async fn update_health(&self, url: &str, healthy: bool) -> bool {
        let mut state = self.state.write().await;
        let Some(record) = state.services.get_mut(url) else {
            return false;
        };

        let was_healthy = record.healthy;
        record.healthy = healthy;
        record.last_checked_at = Utc::now();
        drop(state);

        if was_healthy && !healthy {
            tracing::warn!(url = %url, "Service marked unhealthy");
        } else if !was_healthy && healthy {
            tracing::info!(url = %url, "Service healthy again");
        }
        metrics::record_backend_health(url, healthy);
        true
    }

    /// URLs of every registered backend.
    pub async fn urls(&self) -> Vec<String> {
        self.state.read().await.services.keys().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.services.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
