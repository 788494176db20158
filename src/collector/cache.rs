// TTL cache in front of the system collector. One physical collection per TTL window.

use super::SystemCollector;
use crate::models::MetricMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Something that can produce a fresh snapshot (the system collector in production).
pub trait SnapshotSource: Send + Sync {
    fn collect_snapshot(&self) -> impl Future<Output = MetricMap> + Send;
}

impl SnapshotSource for SystemCollector {
    fn collect_snapshot(&self) -> impl Future<Output = MetricMap> + Send {
        self.collect()
    }
}

/// A whole snapshot and the instant its collection started. Replaced, never mutated.
#[derive(Debug)]
pub struct CacheEntry {
    pub snapshot: Arc<MetricMap>,
    pub captured_at: Instant,
}

pub struct SampleCache<S> {
    source: S,
    ttl: Duration,
    entry: RwLock<Option<Arc<CacheEntry>>>,
    refresh: tokio::sync::Mutex<()>,
}

impl<S: SnapshotSource> SampleCache<S> {
    pub const DEFAULT_TTL: Duration = Duration::from_secs(15);

    pub fn new(source: S, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            entry: RwLock::new(None),
            refresh: tokio::sync::Mutex::new(()),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The entry currently held, fresh or not.
    pub fn current(&self) -> Option<Arc<CacheEntry>> {
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Fresh snapshot, collecting at most once per TTL window. Callers that miss while a
    /// refresh is running wait for it instead of getting the stale entry.
    pub async fn get(&self) -> Arc<MetricMap> {
        if let Some(snapshot) = self.fresh() {
            debug!(operation = "cache_get", "system snapshot cache hit");
            return snapshot;
        }

        let _refresh = self.refresh.lock().await;
        // Another caller may have refreshed while we waited for the lock.
        if let Some(snapshot) = self.fresh() {
            debug!(operation = "cache_get", "system snapshot refreshed by another caller");
            return snapshot;
        }

        let started = Instant::now();
        let snapshot = Arc::new(self.source.collect_snapshot().await);
        let entry = Arc::new(CacheEntry {
            snapshot: snapshot.clone(),
            captured_at: started,
        });
        *self.entry.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
        debug!(
            operation = "cache_refresh",
            metrics = snapshot.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "system snapshot refreshed"
        );
        snapshot
    }

    fn fresh(&self) -> Option<Arc<MetricMap>> {
        let now = Instant::now();
        self.entry
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .filter(|e| now.saturating_duration_since(e.captured_at) < self.ttl)
            .map(|e| e.snapshot.clone())
    }
}
