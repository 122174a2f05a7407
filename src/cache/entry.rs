//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with an expiration instant.

// == Cache Entry ==
/// A cached value paired with the instant after which it may be evicted.
///
/// Not synchronized on its own; the [`super::Store`] guards every access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix seconds)
    pub expires_at: i64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry that expires `timeout_secs` after `now`.
    pub fn new(value: V, now: i64, timeout_secs: i64) -> Self {
        Self {
            value,
            expires_at: now.saturating_add(timeout_secs),
        }
    }

    // == Is Expired ==
    /// Checks if the entry is past its deadline.
    ///
    /// Boundary condition: an entry is still live at exactly `expires_at` and
    /// becomes eligible for eviction once `now` is strictly greater.
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    // == Extend ==
    /// Pushes the deadline forward from where it currently sits.
    ///
    /// Saturates at `i64::MAX` rather than wrapping into the past.
    pub fn extend(&mut self, secs: i64) {
        self.expires_at = self.expires_at.saturating_add(secs);
    }
}
