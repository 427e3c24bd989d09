//! Revoked token ids, kept until each token would have expired anyway.
//!
//! The in-memory store is per process: revocations are lost on restart and are not
//! shared between instances. A multi-instance deployment needs a `RevocationStore`
//! backed by a shared keyed store with a TTL equal to the token expiry.

use dashmap::DashMap;

pub trait RevocationStore: Send + Sync {
    /// Mark `jti` revoked until `expires_at`. Returns `true` if this call did the
    /// revoking, `false` if the id was already revoked.
    fn revoke(&self, jti: &str, expires_at: i64) -> bool;

    fn is_revoked(&self, jti: &str) -> bool;

    /// Drop entries whose token has naturally expired by `now`.
    fn purge_expired(&self, now: i64);
}

#[derive(Debug, Default)]
pub struct InMemoryRevocations {
    by_jti: DashMap<String, i64>,
}

impl InMemoryRevocations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_jti.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_jti.is_empty()
    }
}

impl RevocationStore for InMemoryRevocations {
    fn revoke(&self, jti: &str, expires_at: i64) -> bool {
        // entry() holds the shard lock, so two concurrent revokes of one id cannot both win.
        match self.by_jti.entry(jti.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => false,
            dashmap::mapref::entry::Entry::Vacant(v) => {
                v.insert(expires_at);
                true
            }
        }
    }

    fn is_revoked(&self, jti: &str) -> bool {
        self.by_jti.contains_key(jti)
    }

    fn purge_expired(&self, now: i64) {
        self.by_jti.retain(|_, exp| *exp >= now);
    }
}
