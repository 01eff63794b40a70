use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use quorum_models::poll::Poll;

/// Per-owner cache of poll listings.
///
/// Every invalidation bumps a shared epoch before evicting. A loader notes
/// the epoch before reading the database and hands it back to [`store`];
/// if any invalidation ran in between, the freshly stored listing is evicted
/// again, so a read that raced a write is never served from the cache.
///
/// [`store`]: ListingCache::store
#[derive(Clone)]
pub struct ListingCache {
    entries: moka::future::Cache<String, Arc<Vec<Poll>>>,
    epoch: Arc<AtomicU64>,
}

impl Default for ListingCache {
    fn default() -> Self {
        Self::new(10_000, Duration::from_secs(300))
    }
}

impl ListingCache {
    pub fn new(max_capacity: u64, ttl: Duration) -> Self {
        Self {
            entries: moka::future::Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(ttl)
                .build(),
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Read before loading a listing from the database.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    pub async fn get(&self, owner_id: &str) -> Option<Arc<Vec<Poll>>> {
        self.entries.get(owner_id).await
    }

    /// Caches `polls` for `owner_id` unless an invalidation happened after
    /// `epoch` was read. Returns whether the listing stayed cached.
    pub async fn store(&self, owner_id: &str, epoch: u64, polls: Arc<Vec<Poll>>) -> bool {
        if self.epoch() != epoch {
            return false;
        }
        self.entries.insert(owner_id.to_string(), polls).await;
        // An invalidation between the check and the insert has already
        // bumped the epoch, but its eviction may have run before our insert.
        if self.epoch() != epoch {
            self.entries.invalidate(owner_id).await;
            return false;
        }
        true
    }

    pub async fn invalidate(&self, owner_id: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate(owner_id).await;
    }

    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate_all();
    }
}
