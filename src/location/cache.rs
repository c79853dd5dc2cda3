//! In-memory, single-slot location cache.
//!
//! Holds at most one record with an absolute expiry. Concurrent writers race
//! and the last `put` wins; staleness is bounded by the TTL.

use super::types::LocationRecord;
use std::sync::{PoisonError, RwLock};
use std::time::Duration;

/// Default TTL: 10 minutes.
pub const DEFAULT_TTL: Duration = Duration::from_secs(10 * 60);

#[derive(Clone)]
struct CacheEntry {
    record: LocationRecord,
    expires_at: i64,
}

/// The location cache.
pub struct LocationCache {
    ttl_ms: i64,
    slot: RwLock<Option<CacheEntry>>,
}

impl Default for LocationCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}

impl LocationCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl_ms: i64::try_from(ttl.as_millis()).unwrap_or(i64::MAX),
            slot: RwLock::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms.max(0) as u64)
    }

    /// The cached record if it has not expired, marked `served_from_cache`.
    pub fn get(&self) -> Option<LocationRecord> {
        self.get_at(now_ms())
    }

    pub(crate) fn get_at(&self, now: i64) -> Option<LocationRecord> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        let entry = slot.as_ref()?;
        if now >= entry.expires_at {
            return None; // expired
        }
        Some(entry.record.clone().into_cached())
    }

    /// Replace the slot wholesale.
    pub fn put(&self, record: LocationRecord) {
        self.put_at(record, now_ms());
    }

    pub(crate) fn put_at(&self, record: LocationRecord, now: i64) {
        let entry = CacheEntry {
            record: record.into_fresh(),
            expires_at: now.saturating_add(self.ttl_ms),
        };
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = Some(entry);
    }

    /// The last stored record, expired or not. Diagnostics only.
    pub fn last(&self) -> Option<LocationRecord> {
        let slot = self.slot.read().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref().map(|e| e.record.clone())
    }

    pub fn invalidate(&self) {
        *self.slot.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
