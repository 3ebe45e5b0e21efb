//! # Snapshot Cache
//! Read-through, single-writer TTL cache around the aggregation result,
//! plus the `JobService` instance that ties registry, HTTP client, and
//! cache together. The snapshot slot is the only shared mutable state in
//! the pipeline: a refresh builds the full replacement first and swaps the
//! `Arc` under the write lock, so readers never observe a partial result.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::fallback;
use crate::ingest;
use crate::ingest::fetcher::{self, FeedClient};
use crate::ingest::registry::SourceRegistry;
use crate::ingest::types::{DataOrigin, Snapshot, SourceReport};

/// Maximum snapshot age before the next query triggers a refresh.
pub const SNAPSHOT_TTL: Duration = Duration::from_secs(5 * 60);

/// Injected time source so TTL behavior is deterministic under test.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

struct SnapshotCache {
    slot: RwLock<Option<Arc<Snapshot>>>,
    ttl: chrono::Duration,
}

impl SnapshotCache {
    fn new(ttl: Duration) -> Self {
        Self {
            slot: RwLock::new(None),
            ttl: chrono::Duration::from_std(ttl).expect("ttl fits chrono duration"),
        }
    }

    fn is_fresh(&self, snap: &Snapshot, now: DateTime<Utc>) -> bool {
        now - snap.generated_at < self.ttl
    }
}

/// One self-contained pipeline instance. Constructor-scoped so separate
/// instances (one per test, say) never share cache state.
pub struct JobService {
    registry: SourceRegistry,
    client: FeedClient,
    cache: SnapshotCache,
    clock: Arc<dyn Clock>,
}

impl JobService {
    pub fn new(
        registry: SourceRegistry,
        client: FeedClient,
        ttl: Duration,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            client,
            cache: SnapshotCache::new(ttl),
            clock,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Current snapshot, refreshing when missing or past TTL. The caller
    /// that observes staleness bears the fetch latency; concurrent callers
    /// wait on the lock and reuse the snapshot it stored.
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        {
            let guard = self.cache.slot.read().await;
            if let Some(snap) = guard.as_ref() {
                if self.cache.is_fresh(snap, self.clock.now()) {
                    return Arc::clone(snap);
                }
            }
        }

        let mut guard = self.cache.slot.write().await;
        let now = self.clock.now();
        if let Some(snap) = guard.as_ref() {
            if self.cache.is_fresh(snap, now) {
                return Arc::clone(snap);
            }
        }

        let snap = Arc::new(ingest::aggregate(&self.registry, &self.client, now).await);
        *guard = Some(Arc::clone(&snap));
        snap
    }

    /// The bundled dataset as a snapshot, bypassing live fetch and the
    /// cache entirely (`useRSS=false` escape hatch).
    pub fn fallback_snapshot(&self) -> Snapshot {
        let now = self.clock.now();
        Snapshot {
            listings: fallback::fallback_listings(now),
            generated_at: now,
            source_health: Vec::new(),
            origin: DataOrigin::Fallback,
        }
    }

    /// Probe every enabled source without touching the cached snapshot.
    pub async fn probe_all(&self) -> Vec<SourceReport> {
        let now = self.clock.now();
        let mut handles = Vec::new();
        for desc in self.registry.enabled() {
            let client = self.client.clone();
            let desc = desc.clone();
            handles.push(tokio::spawn(async move {
                fetcher::fetch_source(&client, &desc, now).await
            }));
        }
        let mut reports = Vec::with_capacity(handles.len());
        for handle in handles {
            if let Ok(report) = handle.await {
                reports.push(report);
            }
        }
        reports
    }

    /// Fetch exactly one named source (operational diagnostics). `None`
    /// when the registry has no such source.
    pub async fn probe_source(&self, name: &str) -> Option<SourceReport> {
        let desc = self.registry.find(name)?;
        Some(fetcher::fetch_source(&self.client, desc, self.clock.now()).await)
    }
}
