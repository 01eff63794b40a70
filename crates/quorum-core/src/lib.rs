pub mod auth;
pub mod cache;
pub mod error;
pub mod events;
pub mod polls;
pub mod validation;

use cache::ListingCache;
use events::{Invalidation, InvalidationBus, POLLS_PATH};
use quorum_db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub invalidations: InvalidationBus,
    pub listing_cache: ListingCache,
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub jwt_secret: String,
    pub jwt_expiry_seconds: u64,
    /// Sessions with less lifetime left than this are re-issued.
    pub refresh_threshold_seconds: u64,
    /// Mark session cookies `Secure` (disable only for plain-HTTP development).
    pub secure_cookies: bool,
}

impl AppState {
    pub fn new(db: DbPool, config: AppConfig) -> Self {
        Self {
            db,
            config,
            invalidations: InvalidationBus::default(),
            listing_cache: ListingCache::default(),
        }
    }

    /// Drops any cached rendering of the invalidated view, then tells
    /// subscribers about it.
    pub async fn invalidate(&self, invalidation: Invalidation) {
        if invalidation.path == POLLS_PATH {
            match invalidation.user_id.as_deref() {
                Some(user_id) => self.listing_cache.invalidate(user_id).await,
                None => self.listing_cache.invalidate_all(),
            }
        }
        self.invalidations.publish(invalidation);
    }
}
