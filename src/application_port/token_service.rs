use crate::domain_model::{Principal, TokenPair};

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Signing or cache-write failure while minting a pair. Fatal for the
    /// request; nothing partial is handed back.
    #[error("failed to issue token pair: {0}")]
    Issuance(String),
    /// Bad signature, expired or malformed. One kind for all three so
    /// callers cannot probe which check failed.
    #[error("token failed verification")]
    Verification,
    /// The signature checked out but the token is not the live one for its
    /// principal. Distinct from `Verification` so the gateway can force a
    /// fresh login instead of a retry.
    #[error("refresh token not recognized")]
    RefreshNotRecognized,
    #[error("credential cache error: {0}")]
    Cache(String),
}

/// Signing and verification of the two token classes. Secrets and TTLs are
/// fixed per class and owned by the implementation.
#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn sign_access(&self, principal: &Principal) -> Result<String, AuthError>;
    async fn sign_refresh(&self, principal: &Principal) -> Result<String, AuthError>;
    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError>;
    async fn verify_refresh(&self, token: &str) -> Result<Principal, AuthError>;
}

/// The token lifecycle operations exposed on the auth queue.
#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Mint a pair for a freshly authenticated principal and install the
    /// refresh token as the principal's single live one.
    async fn issue(&self, principal: Principal) -> Result<TokenPair, AuthError>;
    /// Validate an access token and return the principal claims.
    async fn verify_access(&self, token: &str) -> Result<Principal, AuthError>;
    /// Rotate a refresh token: verify it, consume the cached entry, mint a
    /// replacement pair. Not idempotent; the presented token is spent.
    async fn rotate(&self, refresh_token: &str) -> Result<TokenPair, AuthError>;
}
