//! Ingestor processor.
//!
//! The Ingestor is responsible for:
//! - Checking at startup that its subscription exists
//! - Pulling batches of deliveries until shutdown
//! - Appending each decoded message to the shared [`EventBuffer`]
//! - Acknowledging every delivery of a batch once the batch is handled
//!
//! Acknowledgement is unconditional: a delivery is acknowledged whether or
//! not it could be decoded, and a failed acknowledgement is only logged.
//! Messages are therefore processed at most once.

use crate::broker::{BrokerError, Delivery, Subscription};
use crate::buffer::EventBuffer;
use crate::utils::backoff::backoff_delay;
use kanau::processor::Processor;
use std::convert::Infallible;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Default upper bound on deliveries fetched per pull.
pub const DEFAULT_MAX_MESSAGES: u32 = 100;

/// Errors that stop ingestion.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The subscription is missing on the broker.
    #[error("subscription {0} does not exist")]
    SubscriptionNotFound(String),

    /// The existence check itself failed.
    #[error("failed to look up subscription {name}: {source}")]
    Lookup { name: String, source: BrokerError },

    /// The broker stopped delivering.
    #[error("subscription {0} was closed by the broker")]
    Closed(String),

    /// A pull failed in a way retrying cannot fix (e.g. permission denied).
    #[error("failed to pull from {name}: {source}")]
    Rejected { name: String, source: BrokerError },
}

/// Ingestor moves messages from a subscription into an [`EventBuffer`].
///
/// It is the buffer's only writer. The shutdown receiver is injected when
/// calling [`run()`](Ingestor::run).
pub struct Ingestor<S> {
    subscription: S,
    buffer: EventBuffer,
    max_messages: u32,
}

impl<S: Subscription> Ingestor<S> {
    /// Create a new Ingestor writing into `buffer`.
    pub fn new(subscription: S, buffer: EventBuffer) -> Self {
        Self {
            subscription,
            buffer,
            max_messages: DEFAULT_MAX_MESSAGES,
        }
    }

    /// Override the per-pull batch size (minimum 1).
    pub fn with_max_messages(mut self, max_messages: u32) -> Self {
        self.max_messages = max_messages.max(1);
        self
    }

    /// Fail unless the subscription exists.
    ///
    /// Call before serving traffic; a subscriber without a working
    /// ingestion path should not start.
    pub async fn verify(&self) -> Result<(), IngestError> {
        let name = self.subscription.name().to_owned();
        match self.subscription.exists().await {
            Ok(true) => {
                info!(subscription = %name, "Subscription found");
                Ok(())
            }
            Ok(false) => Err(IngestError::SubscriptionNotFound(name)),
            Err(source) => Err(IngestError::Lookup { name, source }),
        }
    }

    /// Run the pull loop until shutdown is signaled.
    ///
    /// Transient pull failures are retried with exponential backoff; the
    /// failure count resets after a successful pull. Returns an error when
    /// the broker closes the subscription, reports it missing, or rejects
    /// the pull with a permanent error.
    pub async fn run(self, mut shutdown_rx: watch::Receiver<bool>) -> Result<(), IngestError> {
        let name = self.subscription.name().to_owned();
        info!(subscription = %name, max_messages = self.max_messages, "Ingestor started");

        let mut failures: u32 = 0;

        loop {
            let pulled = tokio::select! {
                biased;

                // Shutdown has highest priority.
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Ingestor received shutdown signal");
                        break;
                    }
                    continue;
                }

                pulled = self.subscription.pull(self.max_messages) => pulled,
            };

            match pulled {
                Ok(deliveries) => {
                    failures = 0;
                    self.handle_batch(deliveries).await;
                }
                Err(BrokerError::Closed) => {
                    error!(subscription = %name, "Subscription closed, stopping ingestion");
                    return Err(IngestError::Closed(name));
                }
                Err(e) if e.is_not_found() => {
                    error!(subscription = %name, "Subscription no longer exists, stopping ingestion");
                    return Err(IngestError::SubscriptionNotFound(name));
                }
                Err(e) if !e.is_transient() => {
                    error!(subscription = %name, error = %e, "Pull rejected, stopping ingestion");
                    return Err(IngestError::Rejected { name, source: e });
                }
                Err(e) => {
                    let delay = backoff_delay(failures);
                    failures = failures.saturating_add(1);
                    warn!(
                        subscription = %name,
                        error = %e,
                        retry_in = ?delay,
                        "Failed to pull messages"
                    );

                    tokio::select! {
                        biased;

                        changed = shutdown_rx.changed() => {
                            if changed.is_err() || *shutdown_rx.borrow() {
                                info!("Ingestor received shutdown signal");
                                break;
                            }
                        }

                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(subscription = %name, "Ingestor shutdown complete");
        Ok(())
    }

    /// Process every delivery, then acknowledge the whole batch.
    async fn handle_batch(&self, deliveries: Vec<Delivery>) {
        if deliveries.is_empty() {
            return;
        }

        let mut ack_ids = Vec::with_capacity(deliveries.len());
        for delivery in deliveries {
            let ack_id = self
                .process(delivery)
                .await
                .unwrap_or_else(|never| match never {});
            ack_ids.push(ack_id);
        }

        match self.subscription.acknowledge(&ack_ids).await {
            Ok(()) => debug!(count = ack_ids.len(), "Acknowledged batch"),
            Err(e) => warn!(
                count = ack_ids.len(),
                error = %e,
                "Failed to acknowledge batch, messages may be redelivered"
            ),
        }
    }
}

// ---------------------------------------------------------------------------
// Processor trait implementation
// ---------------------------------------------------------------------------

impl<S: Subscription> Processor<Delivery> for Ingestor<S> {
    type Output = String;
    type Error = Infallible;

    /// Append one delivery to the buffer and hand back its ack id.
    async fn process(&self, delivery: Delivery) -> Result<String, Infallible> {
        let Delivery { ack_id, message } = delivery;
        match message {
            Ok(message) => {
                info!(
                    id = %message.id(),
                    payload = %message.payload_lossy(),
                    "Got message"
                );
                self.buffer.append(message).await;
            }
            Err(e) => {
                warn!(%ack_id, error = %e, "Dropping undecodable message");
            }
        }
        Ok(ack_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broker::{InMemoryBroker, Topic};
    use crate::buffer::Message;
    use async_trait::async_trait;
    use bytes::Bytes;
    use pubsub_sdk::client::{ClientError, StatusCode};
    use pubsub_sdk::objects::DataDecodeError;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::Mutex;

    /// Subscription double that replays scripted pull results, then closes.
    struct ScriptedSubscription {
        exists: bool,
        pulls: Mutex<VecDeque<Result<Vec<Delivery>, BrokerError>>>,
        acknowledged: Mutex<Vec<String>>,
    }

    impl ScriptedSubscription {
        fn new(pulls: Vec<Result<Vec<Delivery>, BrokerError>>) -> Self {
            Self {
                exists: true,
                pulls: Mutex::new(pulls.into()),
                acknowledged: Mutex::new(Vec::new()),
            }
        }

        fn missing() -> Self {
            Self {
                exists: false,
                ..Self::new(Vec::new())
            }
        }
    }

    #[async_trait]
    impl Subscription for ScriptedSubscription {
        fn name(&self) -> &str {
            "projects/test/subscriptions/scripted"
        }

        async fn exists(&self) -> Result<bool, BrokerError> {
            Ok(self.exists)
        }

        async fn pull(&self, _max_messages: u32) -> Result<Vec<Delivery>, BrokerError> {
            self.pulls
                .lock()
                .await
                .pop_front()
                .unwrap_or(Err(BrokerError::Closed))
        }

        async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), BrokerError> {
            self.acknowledged.lock().await.extend_from_slice(ack_ids);
            Ok(())
        }
    }

    fn api_error(status: StatusCode) -> BrokerError {
        BrokerError::Client(ClientError::Api {
            status,
            body: String::new(),
        })
    }

    fn delivery(id: &str, payload: &'static str) -> Delivery {
        Delivery {
            ack_id: format!("ack-{id}"),
            message: Ok(Message::new(id, payload)),
        }
    }

    async fn wait_for<F, Fut>(mut condition: F)
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = bool>,
    {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !condition().await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("condition not met in time");
    }

    #[tokio::test]
    async fn test_verify_accepts_existing_subscription() {
        let ingestor = Ingestor::new(InMemoryBroker::new(), EventBuffer::new());
        assert!(ingestor.verify().await.is_ok());
    }

    #[tokio::test]
    async fn test_verify_rejects_missing_subscription() {
        let ingestor = Ingestor::new(ScriptedSubscription::missing(), EventBuffer::new());
        assert!(matches!(
            ingestor.verify().await,
            Err(IngestError::SubscriptionNotFound(name)) if name.ends_with("/scripted")
        ));
    }

    #[tokio::test]
    async fn test_process_appends_and_returns_ack_id() {
        let buffer = EventBuffer::new();
        let ingestor = Ingestor::new(InMemoryBroker::new(), buffer.clone());

        let ack_id = ingestor.process(delivery("9", "nine")).await.unwrap();

        assert_eq!(ack_id, "ack-9");
        assert_eq!(buffer.snapshot().await, vec![Message::new("9", "nine")]);
    }

    #[tokio::test]
    async fn test_run_buffers_and_acknowledges_published_messages() {
        let broker = InMemoryBroker::new();
        for payload in ["first", "second", "third"] {
            broker.publish(Bytes::from(payload)).await.unwrap();
        }

        let buffer = EventBuffer::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(
            Ingestor::new(broker.clone(), buffer.clone())
                .with_max_messages(2)
                .run(shutdown_rx),
        );

        wait_for(|| {
            let broker = broker.clone();
            async move { broker.acknowledged().await.len() == 3 }
        })
        .await;

        let payloads: Vec<String> = buffer
            .snapshot()
            .await
            .iter()
            .map(|m| m.payload_lossy().into_owned())
            .collect();
        assert_eq!(payloads, vec!["first", "second", "third"]);
        assert_eq!(broker.acknowledged().await, vec!["ack-1", "ack-2", "ack-3"]);

        shutdown_tx.send(true).unwrap();
        assert!(handle.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_undecodable_delivery_is_acknowledged_but_not_buffered() {
        let bad = Delivery {
            ack_id: "ack-bad".to_string(),
            message: Err(BrokerError::Decode {
                message_id: "2".to_string(),
                source: DataDecodeError::InvalidBase64,
            }),
        };
        let subscription = Arc::new(ScriptedSubscription::new(vec![Ok(vec![
            delivery("1", "good"),
            bad,
            delivery("3", "also good"),
        ])]));

        let buffer = EventBuffer::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = Ingestor::new(subscription.clone(), buffer.clone())
            .run(shutdown_rx)
            .await;

        assert!(matches!(result, Err(IngestError::Closed(_))));
        assert_eq!(
            buffer.snapshot().await,
            vec![Message::new("1", "good"), Message::new("3", "also good")]
        );
        assert_eq!(
            *subscription.acknowledged.lock().await,
            vec!["ack-1", "ack-bad", "ack-3"]
        );
    }

    #[tokio::test]
    async fn test_unavailable_broker_is_retried() {
        let subscription = Arc::new(ScriptedSubscription::new(vec![
            Err(api_error(StatusCode::SERVICE_UNAVAILABLE)),
            Ok(Vec::new()),
            Ok(vec![delivery("1", "after retry")]),
        ]));

        let buffer = EventBuffer::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = Ingestor::new(subscription.clone(), buffer.clone())
            .run(shutdown_rx)
            .await;

        assert!(matches!(result, Err(IngestError::Closed(_))));
        assert_eq!(buffer.snapshot().await, vec![Message::new("1", "after retry")]);
        assert_eq!(*subscription.acknowledged.lock().await, vec!["ack-1"]);
    }

    #[tokio::test]
    async fn test_deleted_subscription_stops_ingestion() {
        let subscription = Arc::new(ScriptedSubscription::new(vec![
            Ok(vec![delivery("1", "before delete")]),
            Err(api_error(StatusCode::NOT_FOUND)),
            Ok(vec![delivery("2", "never pulled")]),
        ]));

        let buffer = EventBuffer::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Ingestor::new(subscription.clone(), buffer.clone()).run(shutdown_rx),
        )
        .await
        .unwrap();

        assert!(matches!(result, Err(IngestError::SubscriptionNotFound(_))));
        assert_eq!(buffer.snapshot().await, vec![Message::new("1", "before delete")]);
        assert_eq!(subscription.pulls.lock().await.len(), 1);
    }

    #[tokio::test]
    async fn test_permission_denied_stops_ingestion() {
        let subscription = Arc::new(ScriptedSubscription::new(vec![
            Err(api_error(StatusCode::FORBIDDEN)),
            Ok(vec![delivery("1", "never pulled")]),
        ]));

        let buffer = EventBuffer::new();
        let (_shutdown_tx, shutdown_rx) = watch::channel(false);
        let result = tokio::time::timeout(
            Duration::from_secs(5),
            Ingestor::new(subscription, buffer.clone()).run(shutdown_rx),
        )
        .await
        .unwrap();

        assert!(matches!(
            result,
            Err(IngestError::Rejected { source, .. }) if !source.is_transient()
        ));
        assert!(buffer.is_empty().await);
    }

    #[tokio::test]
    async fn test_shutdown_interrupts_pending_pull() {
        let broker = InMemoryBroker::new();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(Ingestor::new(broker, EventBuffer::new()).run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(20)).await;
        shutdown_tx.send(true).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
