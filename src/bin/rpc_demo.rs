//! Drives the auth rpc endpoint and client over the in-process transport:
//! login issuance, access verification, rotation and a replayed rotation.
//!
//! $ cargo run --bin rpc_demo

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
    MessageConsumer, MessageHandler, MessagePublisher, RpcClientConfig,
};

const REQUEST_TOPIC: &str = "auth.rpc";
const REPLY_TOPIC: &str = "auth.rpc.reply.demo";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let broker = ChannelBroker::new();
    let cancel = CancellationToken::new();
    let publisher: Arc<dyn MessagePublisher> = broker.clone();

    let config = TokenConfig {
        access_secret: b"demo-access-secret".to_vec(),
        refresh_secret: b"demo-refresh-secret".to_vec(),
        access_ttl: Duration::from_secs(3600),
        refresh_ttl: Duration::from_secs(604800),
        cache_key_prefix: "refreshToken".to_owned(),
    };
    let refresh_ttl = config.refresh_ttl;
    let codec: Arc<dyn TokenCodec> = Arc::new(HsTokenCodec::new(config));
    let cache = Arc::new(MemoryCredentialCache::new("refreshToken"));
    let tokens: Arc<dyn TokenService> = Arc::new(RealTokenService::new(codec, cache, refresh_ttl));

    let endpoint: Arc<dyn MessageHandler> = Arc::new(AuthRpcEndpoint::new(tokens, publisher.clone()));
    let endpoint_consumer = ChannelConsumer::new(broker.clone(), cancel.clone());
    tokio::spawn(async move {
        let _ = endpoint_consumer
            .run("demo-endpoint", &[REQUEST_TOPIC], endpoint)
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
        let _ = reply_consumer
            .run("demo-reply", &[REPLY_TOPIC], dispatcher)
            .await;
    });

    let principal = Principal {
        id: PrincipalId::from("g1"),
        email: "a@b.com".to_owned(),
        display_name: "A".to_owned(),
    };

    let pair = client.issue_on_login(&principal).await?;
    println!("issued access token:  {}", pair.access_token.0);
    println!("issued refresh token: {}", pair.refresh_token.0);

    let verified = client.verify_access_token(&pair.access_token.0).await?;
    println!("verified principal: {:?}", verified);

    let rotated = client.refresh(&pair.refresh_token.0).await?;
    println!("rotated refresh token: {}", rotated.refresh_token.0);

    let replay = client.refresh(&pair.refresh_token.0).await;
    println!("replaying the spent refresh token: {:?}", replay);

    cancel.cancel();
    Ok(())
}
