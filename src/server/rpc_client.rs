use crate::domain_model::{Principal, TokenPair};
use crate::server::{
    AuthGateway, HandleOutcome, MessageHandler, MessagePublisher, RefreshRequest, ReplyEnvelope,
    RequestEnvelope, RpcError, RpcFault, RpcPattern, VerifyAccessRequest,
};
use dashmap::DashMap;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

type PendingMap = DashMap<Uuid, oneshot::Sender<Result<serde_json::Value, RpcFault>>>;

#[derive(Debug, Clone)]
pub struct RpcClientConfig {
    pub request_topic: String,
    /// Per-process topic the endpoint publishes replies to.
    pub reply_topic: String,
    pub call_timeout: Duration,
}

/// Request/reply layered over the pub/sub broker. Each call publishes a
/// request envelope and parks the caller on a oneshot until the reply
/// dispatcher resolves it or the deadline passes.
pub struct BrokerRpcClient {
    publisher: Arc<dyn MessagePublisher>,
    pending: Arc<PendingMap>,
    cfg: RpcClientConfig,
}

impl BrokerRpcClient {
    pub fn new(publisher: Arc<dyn MessagePublisher>, cfg: RpcClientConfig) -> Self {
        Self {
            publisher,
            pending: Arc::new(DashMap::new()),
            cfg,
        }
    }

    /// Handler to mount on the reply-topic consumer.
    pub fn reply_dispatcher(&self) -> Arc<dyn MessageHandler> {
        Arc::new(ReplyDispatcher {
            pending: self.pending.clone(),
        })
    }

    pub async fn call(
        &self,
        pattern: RpcPattern,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, RpcError> {
        let correlation_id = Uuid::new_v4();
        let (tx, rx) = oneshot::channel();
        self.pending.insert(correlation_id, tx);

        let request = RequestEnvelope {
            pattern,
            correlation_id,
            reply_to: self.cfg.reply_topic.clone(),
            payload,
        };
        let bytes = match serde_json::to_vec(&request) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.pending.remove(&correlation_id);
                return Err(RpcError::Transport(e.to_string()));
            }
        };

        if let Err(e) = self
            .publisher
            .publish(&self.cfg.request_topic, correlation_id.as_bytes(), &bytes)
            .await
        {
            self.pending.remove(&correlation_id);
            return Err(RpcError::Transport(e.to_string()));
        }

        // exactly one reply or one timeout, never both: the dispatcher
        // removes the sender before resolving, and the timeout arm removes
        // it before giving up
        match tokio::time::timeout(self.cfg.call_timeout, rx).await {
            Ok(Ok(Ok(data))) => Ok(data),
            Ok(Ok(Err(fault))) => Err(RpcError::Fault(fault)),
            Ok(Err(_)) => Err(RpcError::Transport("reply channel dropped".to_owned())),
            Err(_) => {
                self.pending.remove(&correlation_id);
                Err(RpcError::Timeout)
            }
        }
    }

    async fn call_as<Request, Reply>(
        &self,
        pattern: RpcPattern,
        request: &Request,
    ) -> Result<Reply, RpcError>
    where
        Request: Serialize + Sync,
        Reply: DeserializeOwned,
    {
        let payload =
            serde_json::to_value(request).map_err(|e| RpcError::Transport(e.to_string()))?;
        let data = self.call(pattern, payload).await?;
        serde_json::from_value(data)
            .map_err(|e| RpcError::Transport(format!("undecodable reply payload: {e}")))
    }
}

struct ReplyDispatcher {
    pending: Arc<PendingMap>,
}

#[async_trait::async_trait]
impl MessageHandler for ReplyDispatcher {
    async fn handle(&self, payload: &[u8]) -> anyhow::Result<HandleOutcome> {
        let reply: ReplyEnvelope = match serde_json::from_slice(payload) {
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable message on rpc reply topic");
                return Ok(HandleOutcome::Commit);
            }
        };

        match self.pending.remove(&reply.correlation_id) {
            Some((_, tx)) => {
                // a caller that already timed out has dropped its receiver
                let _ = tx.send(reply.into_result());
            }
            None => {
                tracing::debug!(
                    correlation_id = %reply.correlation_id,
                    "reply arrived after its call was resolved"
                );
            }
        }
        Ok(HandleOutcome::Commit)
    }
}

#[async_trait::async_trait]
impl AuthGateway for BrokerRpcClient {
    async fn issue_on_login(&self, principal: &Principal) -> Result<TokenPair, RpcError> {
        self.call_as(RpcPattern::IssueOnLogin, principal).await
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, RpcError> {
        let request = RefreshRequest {
            refresh_token: refresh_token.to_owned(),
        };
        self.call_as(RpcPattern::RefreshToken, &request).await
    }

    async fn verify_access_token(&self, access_token: &str) -> Result<Principal, RpcError> {
        let request = VerifyAccessRequest {
            access_token: access_token.to_owned(),
        };
        self.call_as(RpcPattern::VerifyAccessToken, &request).await
    }
}
