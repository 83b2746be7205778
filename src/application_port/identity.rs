use crate::domain_model::Principal;

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("identity provider rejected the callback")]
    Rejected,
    #[error("identity provider error: {0}")]
    Provider(String),
}

/// External identity-provider collaborator. The handshake itself lives
/// outside this service; the contract is only that a completed callback
/// yields a verified principal record.
#[async_trait::async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify_callback(&self, code: &str) -> Result<Principal, IdentityError>;
}
