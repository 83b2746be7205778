use crate::domain_model::PrincipalId;
use crate::domain_port::{CacheError, CredentialCache, TakeOutcome, cache_key};
use dashmap::DashMap;
use std::time::{Duration, Instant};

struct Entry {
    token: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-process credential cache for tests, demos and single-node runs where
/// a shared redis is not worth operating.
pub struct MemoryCredentialCache {
    entries: DashMap<String, Entry>,
    prefix: String,
}

impl MemoryCredentialCache {
    pub fn new(prefix: impl Into<String>) -> Self {
        MemoryCredentialCache {
            entries: DashMap::new(),
            prefix: prefix.into(),
        }
    }

    pub fn key_for(&self, principal: &PrincipalId) -> String {
        cache_key(&self.prefix, principal)
    }
}

#[async_trait::async_trait]
impl CredentialCache for MemoryCredentialCache {
    async fn put(
        &self,
        principal: &PrincipalId,
        token: &str,
        ttl_secs: u64,
    ) -> Result<(), CacheError> {
        let entry = Entry {
            token: token.to_owned(),
            expires_at: Instant::now() + Duration::from_secs(ttl_secs),
        };
        self.entries.insert(self.key_for(principal), entry);
        Ok(())
    }

    async fn get(&self, principal: &PrincipalId) -> Result<Option<String>, CacheError> {
        Ok(self
            .entries
            .get(&self.key_for(principal))
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.token.clone()))
    }

    async fn take_if_match(
        &self,
        principal: &PrincipalId,
        presented: &str,
    ) -> Result<TakeOutcome, CacheError> {
        let key = self.key_for(principal);

        // remove_if holds the shard lock across the comparison, which is
        // the per-key atomicity the rotation race depends on
        if self
            .entries
            .remove_if(&key, |_, entry| {
                !entry.is_expired() && entry.token == presented
            })
            .is_some()
        {
            return Ok(TakeOutcome::Consumed);
        }

        match self.entries.get(&key) {
            Some(entry) if !entry.is_expired() => Ok(TakeOutcome::Mismatch),
            _ => Ok(TakeOutcome::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> PrincipalId {
        PrincipalId::from(s)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = MemoryCredentialCache::new("refreshToken");
        cache.put(&id("g1"), "tok", 60).await.unwrap();
        assert_eq!(cache.get(&id("g1")).await.unwrap(), Some("tok".to_owned()));
        assert_eq!(cache.key_for(&id("g1")), "refreshToken:g1");
    }

    #[tokio::test]
    async fn expired_entries_are_invisible() {
        let cache = MemoryCredentialCache::new("refreshToken");
        cache.put(&id("g1"), "tok", 0).await.unwrap();
        assert_eq!(cache.get(&id("g1")).await.unwrap(), None);
        assert_eq!(
            cache.take_if_match(&id("g1"), "tok").await.unwrap(),
            TakeOutcome::Missing
        );
    }

    #[tokio::test]
    async fn take_consumes_only_the_matching_value() {
        let cache = MemoryCredentialCache::new("refreshToken");
        cache.put(&id("g1"), "current", 60).await.unwrap();

        assert_eq!(
            cache.take_if_match(&id("g1"), "stale").await.unwrap(),
            TakeOutcome::Mismatch
        );
        // the mismatching probe must not have consumed the entry
        assert_eq!(
            cache.take_if_match(&id("g1"), "current").await.unwrap(),
            TakeOutcome::Consumed
        );
        assert_eq!(
            cache.take_if_match(&id("g1"), "current").await.unwrap(),
            TakeOutcome::Missing
        );
    }
}
