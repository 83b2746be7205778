use crate::application_impl::{
    FakeIdentityVerifier, HsTokenCodec, MemoryCredentialCache, RealTokenService, TokenConfig,
};
use crate::application_port::{IdentityVerifier, TokenCodec, TokenService};
use crate::domain_port::CredentialCache;
use crate::infra_redis::RedisCredentialCache;
use crate::logger::*;
use crate::server::{
    AuthGateway, AuthRpcEndpoint, BrokerRpcClient, KafkaConsumer, KafkaPublisher, MessageConsumer,
    MessageHandler, MessagePublisher, RpcClientConfig,
};
use crate::settings::Settings;
use nanoid::nanoid;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One wired process: the auth rpc endpoint consuming the request topic,
/// and the gateway-side client with its per-process reply topic. The two
/// roles only ever talk through the broker.
pub struct Server {
    pub gateway: Arc<dyn AuthGateway>,
    pub identity: Arc<dyn IdentityVerifier>,
    pub secure_cookies: bool,
    endpoint_handle: Mutex<Option<JoinHandle<()>>>,
    reply_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        // secrets are read here, once; nothing else touches the environment
        let token_config = TokenConfig {
            access_secret: secret_from_env("ACCESS_TOKEN_SECRET", &settings.auth.access_secret),
            refresh_secret: secret_from_env("REFRESH_TOKEN_SECRET", &settings.auth.refresh_secret),
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            refresh_ttl: Duration::from_secs(settings.auth.refresh_ttl_secs),
            cache_key_prefix: settings.cache.key_prefix.clone(),
        };
        anyhow::ensure!(
            !token_config.access_secret.is_empty() && !token_config.refresh_secret.is_empty(),
            "signing secrets must not be empty"
        );
        let refresh_ttl = token_config.refresh_ttl;

        let cache: Arc<dyn CredentialCache> = match settings.cache.backend.as_str() {
            "memory" => Arc::new(MemoryCredentialCache::new(
                token_config.cache_key_prefix.clone(),
            )),
            "redis" => {
                let client = redis::Client::open(settings.cache.redis_dsn.as_str())?;
                let manager = client.get_connection_manager().await?;
                Arc::new(RedisCredentialCache::new(
                    manager,
                    token_config.cache_key_prefix.clone(),
                ))
            }
            other => return Err(anyhow::anyhow!("Unknown cache backend: {}", other)),
        };

        let codec: Arc<dyn TokenCodec> = Arc::new(HsTokenCodec::new(token_config));
        let tokens: Arc<dyn TokenService> =
            Arc::new(RealTokenService::new(codec, cache, refresh_ttl));

        let cancel = CancellationToken::new();

        let publisher: Arc<dyn MessagePublisher> = Arc::new(KafkaPublisher::new(
            &settings.broker.bootstrap_server,
            &format!("auth-pub-{}", run_id),
        )?);

        let request_topic = settings.broker.request_topic.clone();
        let reply_topic = format!("{}.reply.{}", request_topic, run_id);

        // endpoint role: all instances share one group so each request is
        // handled exactly once
        let endpoint: Arc<dyn MessageHandler> =
            Arc::new(AuthRpcEndpoint::new(tokens, publisher.clone()));
        let endpoint_consumer: Arc<dyn MessageConsumer> = Arc::new(KafkaConsumer::new(
            &settings.broker.bootstrap_server,
            &format!("auth-endpoint-{}", run_id),
            cancel.clone(),
        ));
        let endpoint_group = settings.broker.consumer_group.clone();
        let endpoint_topic = request_topic.clone();
        let endpoint_handle = tokio::spawn(async move {
            if let Err(e) = endpoint_consumer
                .run(&endpoint_group, &[endpoint_topic.as_str()], endpoint)
                .await
            {
                tracing::error!("auth endpoint consumer exited: {:#}", e);
            }
        });

        // gateway role: replies come back on a topic only this process reads
        let client = Arc::new(BrokerRpcClient::new(
            publisher.clone(),
            RpcClientConfig {
                request_topic,
                reply_topic: reply_topic.clone(),
                call_timeout: Duration::from_millis(settings.broker.call_timeout_ms),
            },
        ));
        let dispatcher = client.reply_dispatcher();
        let reply_consumer: Arc<dyn MessageConsumer> = Arc::new(KafkaConsumer::new(
            &settings.broker.bootstrap_server,
            &format!("auth-reply-{}", run_id),
            cancel.clone(),
        ));
        let reply_group = format!("auth-reply-{}", run_id);
        let reply_handle = tokio::spawn(async move {
            if let Err(e) = reply_consumer
                .run(&reply_group, &[reply_topic.as_str()], dispatcher)
                .await
            {
                tracing::error!("rpc reply consumer exited: {:#}", e);
            }
        });

        let identity: Arc<dyn IdentityVerifier> = Arc::new(FakeIdentityVerifier::new());

        info!("server started");

        Ok(Self {
            gateway: client,
            identity,
            secure_cookies: settings.http.secure_cookies,
            endpoint_handle: Mutex::new(Some(endpoint_handle)),
            reply_handle: Mutex::new(Some(reply_handle)),
            cancel,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        if let Ok(mut lock) = self.reply_handle.lock() {
            if let Some(handle) = lock.take() {
                let r = handle.await;
                info!("reply consumer stopped: {:?}", r);
            }
        }
        if let Ok(mut lock) = self.endpoint_handle.lock() {
            if let Some(handle) = lock.take() {
                let r = handle.await;
                info!("endpoint consumer stopped: {:?}", r);
            }
        }
    }
}

fn secret_from_env(var: &str, fallback: &str) -> Vec<u8> {
    std::env::var(var)
        .unwrap_or_else(|_| fallback.to_owned())
        .into_bytes()
}
