use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use serde::Serialize;
use tracing::debug;

/// Canonical identity of a banner lookup: the feature id plus the tag ids in
/// ascending order. The bypass flag is never part of the key, so bypass and
/// non-bypass requests for the same logical lookup share one entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey {
    feature_id: i32,
    tag_ids: Vec<i32>,
}

impl CacheKey {
    pub fn new(feature_id: i32, mut tag_ids: Vec<i32>) -> Self {
        tag_ids.sort_unstable();
        Self {
            feature_id,
            tag_ids,
        }
    }

    pub fn feature_id(&self) -> i32 {
        self.feature_id
    }

    pub fn tag_ids(&self) -> &[i32] {
        &self.tag_ids
    }
}

/// One cached resolution: the rendered payload and the active flag travel
/// together in a single envelope so they can never expire independently.
#[derive(Clone, Debug)]
pub struct CachedRevision {
    pub payload: serde_json::Value,
    pub is_active: bool,
    expires_at: Instant,
}

/// Process-wide read-through cache for resolved banner revisions.
///
/// Constructed once at startup and injected into every request path. Reads
/// lazily skip expired entries; a background sweeper purges them. There is
/// no per-key locking, so two concurrent misses on the same key may both
/// resolve against the store; the later write wins.
pub struct RevisionCache {
    entries: DashMap<CacheKey, CachedRevision>,
    ttl: Duration,
}

impl RevisionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
        }
    }

    /// Fetch a live revision. Expired entries are treated as absent and left
    /// for the sweeper.
    pub fn get(&self, key: &CacheKey) -> Option<CachedRevision> {
        let entry = self.entries.get(key)?;
        if Instant::now() >= entry.expires_at {
            return None;
        }
        Some(entry.clone())
    }

    /// Store a revision under its key, overwriting any previous envelope and
    /// restarting its lifetime. Serialization of the payload cannot
    /// realistically fail for the rendered content type; if it ever does the
    /// entry is skipped and the next read falls through to the store.
    pub fn insert<T: Serialize>(&self, key: CacheKey, payload: &T, is_active: bool) {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("failed to render revision for caching: {err}");
                return;
            }
        };

        self.entries.insert(
            key,
            CachedRevision {
                payload,
                is_active,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn purge_expired(&self) -> usize {
        let before = self.entries.len();
        let now = Instant::now();
        self.entries.retain(|_, entry| now < entry.expires_at);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn the background sweep task. The task holds only a weak handle,
    /// so it winds down once the cache itself is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else { break };
                let purged = cache.purge_expired();
                if purged > 0 {
                    debug!(purged, "swept expired banner revisions");
                }
            }
        })
    }
}
