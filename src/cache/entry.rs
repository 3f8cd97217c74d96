//! Cache entry envelope

use crate::error::{PortalError, PortalResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A cached value with its write time and expiry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
    pub expiry: DateTime<Utc>,
}

impl<T> CacheEntry<T> {
    /// Wrap `data` with an expiry `ttl` from now
    pub fn new(data: T, ttl: Duration) -> PortalResult<Self> {
        if ttl <= Duration::zero() {
            return Err(PortalError::InvalidTtl(ttl.num_seconds()));
        }
        let cached_at = Utc::now();
        Ok(Self {
            data,
            cached_at,
            expiry: cached_at + ttl,
        })
    }

    /// Whether the entry is still valid at `now`
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expiry
    }

    pub fn is_fresh(&self) -> bool {
        self.is_fresh_at(Utc::now())
    }

    /// Time since the entry was written
    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at
    }
}
