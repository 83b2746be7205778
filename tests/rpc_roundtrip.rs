//! The auth rpc endpoint and client talking over the in-process transport:
//! request/reply correlation, fault normalization and the call timeout.

use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tollgate::application_impl::{
    HsTokenCodec, MemoryCredentialCache, RealTokenService, TokenConfig,
};
use tollgate::application_port::{TokenCodec, TokenService};
use tollgate::domain_model::{Principal, PrincipalId};
use tollgate::server::{
    AuthGateway, AuthRpcEndpoint, BrokerRpcClient, ChannelBroker, ChannelConsumer,
    MessageConsumer, MessageHandler, MessagePublisher, RpcClientConfig, RpcError,
};

const REQUEST_TOPIC: &str = "auth.rpc";
const REPLY_TOPIC: &str = "auth.rpc.reply.test";

fn principal() -> Principal {
    Principal {
        id: PrincipalId::from("g1"),
        email: "a@b.com".to_owned(),
        display_name: "A".to_owned(),
    }
}

fn token_service() -> Arc<dyn TokenService> {
    let config = TokenConfig {
        access_secret: b"test-access-secret".to_vec(),
        refresh_secret: b"test-refresh-secret".to_vec(),
        access_ttl: Duration::from_secs(3600),
        refresh_ttl: Duration::from_secs(604800),
        cache_key_prefix: "refreshToken".to_owned(),
    };
    let refresh_ttl = config.refresh_ttl;
    let codec: Arc<dyn TokenCodec> = Arc::new(HsTokenCodec::new(config));
    let cache = Arc::new(MemoryCredentialCache::new("refreshToken"));
    Arc::new(RealTokenService::new(codec, cache, refresh_ttl))
}

struct Rig {
    client: Arc<BrokerRpcClient>,
    cancel: CancellationToken,
}

impl Drop for Rig {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Endpoint consumer plus client with its reply dispatcher, all over one
/// in-process broker.
fn rpc_rig() -> Rig {
    let broker = ChannelBroker::new();
    let cancel = CancellationToken::new();
    let publisher: Arc<dyn MessagePublisher> = broker.clone();

    let endpoint: Arc<dyn MessageHandler> =
        Arc::new(AuthRpcEndpoint::new(token_service(), publisher.clone()));
    let endpoint_consumer = ChannelConsumer::new(broker.clone(), cancel.clone());
    tokio::spawn(async move {
        let _ = endpoint_consumer
            .run("endpoint", &[REQUEST_TOPIC], endpoint)
            .await;
    });

    let client = Arc::new(BrokerRpcClient::new(
        publisher,
        RpcClientConfig {
            request_topic: REQUEST_TOPIC.to_owned(),
            reply_topic: REPLY_TOPIC.to_owned(),
            call_timeout: Duration::from_secs(2),
        },
    ));
    let dispatcher = client.reply_dispatcher();
    let reply_consumer = ChannelConsumer::new(broker.clone(), cancel.clone());
    tokio::spawn(async move {
        let _ = reply_consumer.run("reply", &[REPLY_TOPIC], dispatcher).await;
    });

    Rig { client, cancel }
}

#[tokio::test]
async fn full_lifecycle_over_the_broker() {
    let rig = rpc_rig();

    let pair = rig.client.issue_on_login(&principal()).await.unwrap();
    assert_ne!(pair.access_token.0, pair.refresh_token.0);

    let verified = rig
        .client
        .verify_access_token(&pair.access_token.0)
        .await
        .unwrap();
    assert_eq!(verified, principal());

    let rotated = rig.client.refresh(&pair.refresh_token.0).await.unwrap();
    assert_ne!(rotated.refresh_token.0, pair.refresh_token.0);

    // replaying the spent token is a distinct, terminal fault
    let replay = rig.client.refresh(&pair.refresh_token.0).await.unwrap_err();
    match replay {
        RpcError::Fault(fault) => {
            assert_eq!(fault.status, 401);
            assert_eq!(fault.message, "refresh token not recognized");
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[tokio::test]
async fn verification_fault_is_unauthorized_and_uniform() {
    let rig = rpc_rig();

    let err = rig
        .client
        .verify_access_token("aaa.bbb.ccc")
        .await
        .unwrap_err();
    match err {
        RpcError::Fault(fault) => {
            assert_eq!(fault.status, 401);
            assert_eq!(fault.message, "token failed verification");
        }
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[tokio::test]
async fn implausible_principal_is_a_bad_request() {
    let rig = rpc_rig();

    let bogus = Principal {
        id: PrincipalId::from("g1"),
        email: "not-an-email".to_owned(),
        display_name: "A".to_owned(),
    };
    let err = rig.client.issue_on_login(&bogus).await.unwrap_err();
    match err {
        RpcError::Fault(fault) => assert_eq!(fault.status, 400),
        other => panic!("expected a fault, got {other:?}"),
    }
}

#[tokio::test]
async fn call_times_out_when_nothing_consumes_the_queue() {
    let broker = ChannelBroker::new();
    let publisher: Arc<dyn MessagePublisher> = broker.clone();

    let client = BrokerRpcClient::new(
        publisher,
        RpcClientConfig {
            request_topic: REQUEST_TOPIC.to_owned(),
            reply_topic: "auth.rpc.reply.orphan".to_owned(),
            call_timeout: Duration::from_millis(100),
        },
    );

    let err = client.verify_access_token("aaa.bbb.ccc").await.unwrap_err();
    assert!(matches!(err, RpcError::Timeout));
}
