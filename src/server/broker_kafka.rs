use crate::server::{HandleOutcome, MessageConsumer, MessageHandler, MessagePublisher};
use futures_util::StreamExt;
use rdkafka::admin::{AdminClient, AdminOptions, NewTopic, TopicReplication};
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{ClientConfig, Message};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const DELIVERY_TIMEOUT: Duration = Duration::from_secs(10);

pub struct KafkaPublisher {
    inner: FutureProducer,
}

impl KafkaPublisher {
    pub fn new(bootstrap_server: &str, client_id: &str) -> anyhow::Result<Self> {
        let inner = ClientConfig::new()
            .set("bootstrap.servers", bootstrap_server)
            .set("client.id", client_id)
            .set("acks", "all")
            .set("enable.idempotence", "true")
            .set("max.in.flight.requests.per.connection", "1")
            .set("compression.type", "lz4")
            .create()?;
        Ok(Self { inner })
    }
}

#[async_trait::async_trait]
impl MessagePublisher for KafkaPublisher {
    async fn publish(&self, topic: &str, key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        let rec = FutureRecord::to(topic).key(key).payload(payload);
        self.inner
            .send(rec, DELIVERY_TIMEOUT)
            .await
            .map(|_delivery_report| ())
            .map_err(|(e, _msg)| anyhow::anyhow!(e))
    }
}

pub struct KafkaConsumer {
    bootstrap_server: String,
    client_id: String,
    cancellation_token: CancellationToken,
}

impl KafkaConsumer {
    pub fn new(
        bootstrap_server: &str,
        client_id: &str,
        cancellation_token: CancellationToken,
    ) -> Self {
        Self {
            bootstrap_server: bootstrap_server.to_string(),
            client_id: client_id.to_string(),
            cancellation_token,
        }
    }

    async fn ensure_topics(bootstrap: &str, topics: &[&str]) -> anyhow::Result<()> {
        let admin: AdminClient<_> = ClientConfig::new()
            .set("bootstrap.servers", bootstrap)
            .create()?;

        let new_topics: Vec<_> = topics
            .iter()
            .map(|t| NewTopic::new(t, 1, TopicReplication::Fixed(1)))
            .collect();

        let _ = admin
            .create_topics(&new_topics, &AdminOptions::new())
            .await?;

        Ok(())
    }
}

#[async_trait::async_trait]
impl MessageConsumer for KafkaConsumer {
    async fn run(
        &self,
        consumer_group_id: &str,
        topics: &[&str],
        handler: Arc<dyn MessageHandler>,
    ) -> anyhow::Result<()> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &self.bootstrap_server)
            .set("client.id", &self.client_id)
            .set("group.id", consumer_group_id)
            .set("enable.auto.commit", "false")
            .set("auto.offset.reset", "latest")
            .create()?;

        Self::ensure_topics(&self.bootstrap_server, topics).await?;
        consumer.subscribe(topics)?;

        let mut stream = consumer.stream();

        loop {
            let result = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => {
                    tracing::info!("kafka consumer shutting down...");
                    break;
                }
                msg = stream.next() => msg,
            };

            let Some(message) = result else {
                tracing::error!("kafka consumer stream terminated");
                break;
            };

            match message {
                Err(e) => {
                    // broker hiccup
                    tracing::warn!(error = ?e, "consumer poll error");
                    tokio::time::sleep(Duration::from_millis(200)).await;
                }
                Ok(m) => {
                    let payload = m.payload().unwrap_or(&[]);

                    match handler.handle(payload).await {
                        Ok(HandleOutcome::Commit | HandleOutcome::SkipCommit) => {
                            if let Err(e) =
                                consumer.commit_message(&m, rdkafka::consumer::CommitMode::Async)
                            {
                                tracing::warn!(error = ?e, "commit failed but ignored");
                            }
                        }
                        Ok(HandleOutcome::Retry) => {
                            // uncommitted, redelivered on the next poll; the
                            // small delay keeps a failing message off a hot loop
                            tokio::time::sleep(Duration::from_millis(50)).await;
                        }
                        Err(e) => {
                            tracing::error!(error = ?e, "handler error; retrying");
                            tokio::time::sleep(Duration::from_millis(100)).await;
                        }
                    }
                }
            }
        }

        consumer.unsubscribe();

        Ok(())
    }
}
