/// Token Revocation Set
///
/// Process-wide blacklist of bearer tokens invalidated before their natural
/// expiry. Entries carry the token's embedded expiry so pruning can drop them
/// once re-validating would fail on expiry anyway. A membership miss on a
/// pruned entry simply reads as "not revoked".

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Concurrency-safe revocation set, shared across workers via `clone()`.
#[derive(Debug, Clone, Default)]
pub struct RevocationList {
    entries: Arc<RwLock<HashMap<String, i64>>>,
}

impl RevocationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a token to the set. Idempotent: revoking twice has the same effect
    /// as once (the expiry key is identical for identical tokens).
    pub fn revoke(&self, token: &str, expires_at: i64) {
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.insert(token.to_string(), expires_at);
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.contains_key(token)
    }

    /// Drop entries whose embedded expiry has passed and return how many were
    /// removed. Validation rejects those tokens on expiry regardless, so the
    /// set only needs to remember tokens that could otherwise still pass.
    pub fn prune_expired(&self) -> usize {
        let now = chrono::Utc::now().timestamp();
        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = entries.len();
        entries.retain(|_, expires_at| *expires_at > now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_revoke_and_check() {
        let list = RevocationList::new();
        let exp = chrono::Utc::now().timestamp() + 3600;

        assert!(!list.is_revoked("token-a"));
        list.revoke("token-a", exp);
        assert!(list.is_revoked("token-a"));
        assert!(!list.is_revoked("token-b"));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let list = RevocationList::new();
        let exp = chrono::Utc::now().timestamp() + 3600;

        list.revoke("token-a", exp);
        list.revoke("token-a", exp);

        assert_eq!(list.len(), 1);
        assert!(list.is_revoked("token-a"));
    }

    #[test]
    fn test_prune_removes_only_expired() {
        let list = RevocationList::new();
        let now = chrono::Utc::now().timestamp();

        list.revoke("expired", now - 10);
        list.revoke("live", now + 3600);

        let removed = list.prune_expired();
        assert_eq!(removed, 1);
        assert!(!list.is_revoked("expired"));
        assert!(list.is_revoked("live"));
    }

    #[test]
    fn test_clones_share_state() {
        let list = RevocationList::new();
        let other = list.clone();
        let exp = chrono::Utc::now().timestamp() + 3600;

        list.revoke("token-a", exp);
        assert!(other.is_revoked("token-a"));
    }

    #[test]
    fn test_concurrent_insert_and_check() {
        let list = RevocationList::new();
        let exp = chrono::Utc::now().timestamp() + 3600;

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let list = list.clone();
                std::thread::spawn(move || {
                    for j in 0..100 {
                        let token = format!("token-{}-{}", i, j);
                        list.revoke(&token, exp);
                        assert!(list.is_revoked(&token));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(list.len(), 800);
    }
}
