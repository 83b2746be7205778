use crate::application_port::{AuthError, TokenService};
use crate::domain_model::Principal;
use crate::server::{
    HandleOutcome, MessageHandler, MessagePublisher, RefreshRequest, ReplyEnvelope,
    RequestEnvelope, RpcFault, RpcPattern, VerifyAccessRequest,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

const STATUS_BAD_REQUEST: u16 = 400;
const STATUS_UNAUTHORIZED: u16 = 401;
const STATUS_INTERNAL: u16 = 500;

/// Message-pattern handlers for the auth queue: thin adapters from request
/// envelopes onto the token service. Stateless per message; any number may
/// run concurrently against the shared credential cache.
pub struct AuthRpcEndpoint {
    tokens: Arc<dyn TokenService>,
    publisher: Arc<dyn MessagePublisher>,
}

impl AuthRpcEndpoint {
    pub fn new(tokens: Arc<dyn TokenService>, publisher: Arc<dyn MessagePublisher>) -> Self {
        Self { tokens, publisher }
    }

    async fn dispatch(
        &self,
        pattern: RpcPattern,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value, RpcFault> {
        match pattern {
            RpcPattern::IssueOnLogin => {
                let principal: Principal = decode_payload(payload)?;
                let principal = principal.validated().map_err(|e| RpcFault {
                    status: STATUS_BAD_REQUEST,
                    message: e.to_string(),
                })?;
                let pair = self.tokens.issue(principal).await.map_err(fault_from)?;
                encode_payload(&pair)
            }
            RpcPattern::RefreshToken => {
                let request: RefreshRequest = decode_payload(payload)?;
                let pair = self
                    .tokens
                    .rotate(&request.refresh_token)
                    .await
                    .map_err(fault_from)?;
                encode_payload(&pair)
            }
            RpcPattern::VerifyAccessToken => {
                let request: VerifyAccessRequest = decode_payload(payload)?;
                let principal = self
                    .tokens
                    .verify_access(&request.access_token)
                    .await
                    .map_err(fault_from)?;
                encode_payload(&principal)
            }
        }
    }
}

fn decode_payload<T: DeserializeOwned>(payload: serde_json::Value) -> Result<T, RpcFault> {
    serde_json::from_value(payload).map_err(|e| RpcFault {
        status: STATUS_BAD_REQUEST,
        message: format!("malformed payload: {e}"),
    })
}

fn encode_payload<T: Serialize>(value: &T) -> Result<serde_json::Value, RpcFault> {
    serde_json::to_value(value).map_err(|e| RpcFault {
        status: STATUS_INTERNAL,
        message: e.to_string(),
    })
}

fn fault_from(error: AuthError) -> RpcFault {
    let status = match error {
        AuthError::Issuance(_) | AuthError::Verification | AuthError::RefreshNotRecognized => {
            STATUS_UNAUTHORIZED
        }
        AuthError::Cache(_) => STATUS_INTERNAL,
    };
    RpcFault {
        status,
        message: error.to_string(),
    }
}

#[async_trait::async_trait]
impl MessageHandler for AuthRpcEndpoint {
    async fn handle(&self, payload: &[u8]) -> anyhow::Result<HandleOutcome> {
        let request: RequestEnvelope = match serde_json::from_slice(payload) {
            Ok(request) => request,
            Err(e) => {
                // committed, not retried: a poison envelope stays poison
                tracing::warn!(error = %e, "undecodable request on auth queue");
                return Ok(HandleOutcome::Commit);
            }
        };

        let RequestEnvelope {
            pattern,
            correlation_id,
            reply_to,
            payload,
        } = request;

        let reply = match self.dispatch(pattern, payload).await {
            Ok(data) => ReplyEnvelope::ok(correlation_id, data),
            Err(fault) => {
                tracing::debug!(?pattern, status = fault.status, "auth rpc fault: {}", fault.message);
                ReplyEnvelope::err(correlation_id, fault)
            }
        };

        let bytes = serde_json::to_vec(&reply)?;
        self.publisher
            .publish(&reply_to, correlation_id.as_bytes(), &bytes)
            .await?;
        Ok(HandleOutcome::Commit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::FakeTokenService;
    use std::sync::Mutex;
    use uuid::Uuid;

    struct CapturingPublisher {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
    }

    impl CapturingPublisher {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                sent: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl MessagePublisher for CapturingPublisher {
        async fn publish(&self, topic: &str, _key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((topic.to_owned(), payload.to_vec()));
            Ok(())
        }
    }

    fn endpoint_over(publisher: Arc<CapturingPublisher>) -> AuthRpcEndpoint {
        AuthRpcEndpoint::new(Arc::new(FakeTokenService::new()), publisher)
    }

    fn request_bytes(pattern: RpcPattern, correlation_id: Uuid, payload: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&RequestEnvelope {
            pattern,
            correlation_id,
            reply_to: "replies".to_owned(),
            payload,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn verify_pattern_replies_with_the_principal() {
        let publisher = CapturingPublisher::new();
        let endpoint = endpoint_over(publisher.clone());
        let correlation_id = Uuid::new_v4();

        let request = request_bytes(
            RpcPattern::VerifyAccessToken,
            correlation_id,
            serde_json::json!({"accessToken": "fake-access-token:g1"}),
        );
        let outcome = endpoint.handle(&request).await.unwrap();
        assert!(matches!(outcome, HandleOutcome::Commit));

        let sent = publisher.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "replies");

        let reply: ReplyEnvelope = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(reply.correlation_id, correlation_id);
        let data = reply.into_result().unwrap();
        assert_eq!(data["id"], "g1");
    }

    #[tokio::test]
    async fn auth_failures_are_normalized_to_401_faults() {
        let publisher = CapturingPublisher::new();
        let endpoint = endpoint_over(publisher.clone());

        let request = request_bytes(
            RpcPattern::VerifyAccessToken,
            Uuid::new_v4(),
            serde_json::json!({"accessToken": "garbage"}),
        );
        endpoint.handle(&request).await.unwrap();

        let sent = publisher.sent.lock().unwrap();
        let reply: ReplyEnvelope = serde_json::from_slice(&sent[0].1).unwrap();
        let fault = reply.into_result().unwrap_err();
        assert_eq!(fault.status, 401);
    }

    #[tokio::test]
    async fn malformed_payload_is_a_bad_request_fault() {
        let publisher = CapturingPublisher::new();
        let endpoint = endpoint_over(publisher.clone());

        let request = request_bytes(
            RpcPattern::RefreshToken,
            Uuid::new_v4(),
            serde_json::json!({"unexpected": true}),
        );
        endpoint.handle(&request).await.unwrap();

        let sent = publisher.sent.lock().unwrap();
        let reply: ReplyEnvelope = serde_json::from_slice(&sent[0].1).unwrap();
        assert_eq!(reply.into_result().unwrap_err().status, 400);
    }

    #[tokio::test]
    async fn undecodable_envelopes_are_committed_without_a_reply() {
        let publisher = CapturingPublisher::new();
        let endpoint = endpoint_over(publisher.clone());

        let outcome = endpoint.handle(b"not an envelope").await.unwrap();
        assert!(matches!(outcome, HandleOutcome::Commit));
        assert!(publisher.sent.lock().unwrap().is_empty());
    }
}
