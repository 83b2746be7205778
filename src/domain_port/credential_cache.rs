use crate::domain_model::PrincipalId;

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache store error: {0}")]
    Store(String),
}

/// Outcome of an atomic compare-and-consume on a principal's entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeOutcome {
    /// Entry matched the presented value and was removed.
    Consumed,
    /// A live entry exists but holds a different value; left in place.
    Mismatch,
    /// No live entry for the principal.
    Missing,
}

pub fn cache_key(prefix: &str, principal: &PrincipalId) -> String {
    format!("{}:{}", prefix, principal)
}

/// Key-value store holding the single live refresh token per principal.
/// Written by the issuer and the refresh coordinator only.
#[async_trait::async_trait]
pub trait CredentialCache: Send + Sync {
    /// Install `token` as the principal's live refresh token, replacing any
    /// previous entry.
    async fn put(
        &self,
        principal: &PrincipalId,
        token: &str,
        ttl_secs: u64,
    ) -> Result<(), CacheError>;

    async fn get(&self, principal: &PrincipalId) -> Result<Option<String>, CacheError>;

    /// Remove the entry only if it equals `presented`, atomically per key.
    /// The read-compare-delete sequence must not interleave with another
    /// call for the same principal.
    async fn take_if_match(
        &self,
        principal: &PrincipalId,
        presented: &str,
    ) -> Result<TakeOutcome, CacheError>;
}
