use crate::domain_model::{Principal, TokenPair};
use crate::server::RpcFault;
use std::sync::Arc;

// region broker seam

#[async_trait::async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()>;
}

pub enum HandleOutcome {
    Commit,
    Retry,
    SkipCommit,
}

#[async_trait::async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, payload: &[u8]) -> anyhow::Result<HandleOutcome>;
}

#[async_trait::async_trait]
pub trait MessageConsumer: Send + Sync {
    async fn run(
        &self,
        consumer_group_id: &str,
        topics: &[&str],
        handler: Arc<dyn MessageHandler>,
    ) -> anyhow::Result<()>;
}

// endregion

// region gateway-side rpc seam

#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// The endpoint replied with a normalized fault.
    #[error("rpc fault: {0}")]
    Fault(RpcFault),
    #[error("broker transport error: {0}")]
    Transport(String),
    #[error("timed out waiting for rpc reply")]
    Timeout,
}

/// The auth queue as seen from a gateway instance.
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    async fn issue_on_login(&self, principal: &Principal) -> Result<TokenPair, RpcError>;
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RpcError>;
    async fn verify_access_token(&self, access_token: &str) -> Result<Principal, RpcError>;
}

// endregion
