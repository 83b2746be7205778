use crate::server::{HandleOutcome, MessageConsumer, MessageHandler, MessagePublisher};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct BusState {
    topics: HashMap<String, mpsc::UnboundedSender<Vec<u8>>>,
    /// Messages published before (or after) a topic had a live subscriber.
    parked: HashMap<String, Vec<Vec<u8>>>,
}

/// In-process topic bus over tokio channels. Stands in for the broker in
/// tests and demos so the rpc endpoint and client can talk without a
/// running cluster. One subscriber per topic; messages published without a
/// subscriber are parked and delivered on attach.
#[derive(Default)]
pub struct ChannelBroker {
    state: Mutex<BusState>,
}

impl ChannelBroker {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn attach(&self, topics: &[&str], tx: mpsc::UnboundedSender<Vec<u8>>) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        for topic in topics {
            for parked in state.parked.remove(*topic).unwrap_or_default() {
                let _ = tx.send(parked);
            }
            state.topics.insert((*topic).to_owned(), tx.clone());
        }
    }
}

#[async_trait::async_trait]
impl MessagePublisher for ChannelBroker {
    async fn publish(&self, topic: &str, _key: &[u8], payload: &[u8]) -> anyhow::Result<()> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let delivered = match state.topics.get(topic) {
            Some(tx) => tx.send(payload.to_vec()).is_ok(),
            None => false,
        };
        if !delivered {
            state.topics.remove(topic);
            state
                .parked
                .entry(topic.to_owned())
                .or_default()
                .push(payload.to_vec());
        }
        Ok(())
    }
}

pub struct ChannelConsumer {
    broker: Arc<ChannelBroker>,
    cancellation_token: CancellationToken,
}

impl ChannelConsumer {
    pub fn new(broker: Arc<ChannelBroker>, cancellation_token: CancellationToken) -> Self {
        Self {
            broker,
            cancellation_token,
        }
    }
}

#[async_trait::async_trait]
impl MessageConsumer for ChannelConsumer {
    async fn run(
        &self,
        _consumer_group_id: &str,
        topics: &[&str],
        handler: Arc<dyn MessageHandler>,
    ) -> anyhow::Result<()> {
        let (tx, mut rx) = mpsc::unbounded_channel();
        self.broker.attach(topics, tx);

        loop {
            let payload = tokio::select! {
                biased;
                _ = self.cancellation_token.cancelled() => break,
                payload = rx.recv() => match payload {
                    Some(payload) => payload,
                    None => break,
                },
            };

            match handler.handle(&payload).await {
                Ok(HandleOutcome::Commit | HandleOutcome::SkipCommit) => {}
                Ok(HandleOutcome::Retry) => {
                    // no redelivery in-process
                    tracing::warn!("channel consumer dropping message marked for retry");
                }
                Err(e) => {
                    tracing::error!(error = ?e, "channel consumer handler error; message dropped");
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        seen: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl MessageHandler for Counting {
        async fn handle(&self, _payload: &[u8]) -> anyhow::Result<HandleOutcome> {
            self.seen.fetch_add(1, Ordering::SeqCst);
            Ok(HandleOutcome::Commit)
        }
    }

    #[tokio::test]
    async fn messages_published_before_attach_are_delivered() {
        let broker = ChannelBroker::new();
        broker.publish("t", b"k", b"early").await.unwrap();

        let handler = Arc::new(Counting {
            seen: AtomicUsize::new(0),
        });
        let cancel = CancellationToken::new();
        let consumer = ChannelConsumer::new(broker.clone(), cancel.clone());

        let h = handler.clone();
        let task = tokio::spawn(async move { consumer.run("g", &["t"], h).await });

        broker.publish("t", b"k", b"late").await.unwrap();

        tokio::time::timeout(std::time::Duration::from_secs(1), async {
            while handler.seen.load(Ordering::SeqCst) < 2 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("both messages delivered");

        cancel.cancel();
        task.await.unwrap().unwrap();
    }
}
