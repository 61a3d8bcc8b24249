//! In-process broker with one topic and one subscription.
//!
//! Every published message is delivered once to the single subscription;
//! there is no ack deadline and no redelivery. Acknowledged ids are recorded
//! so callers can inspect what was acknowledged.

use super::{BrokerError, Delivery, Subscription, Topic};
use crate::buffer::Message;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};
use tracing::debug;

const NAME: &str = "in-memory";

#[derive(Debug, Clone, Default)]
pub struct InMemoryBroker {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    state: Mutex<State>,
    published: Notify,
}

#[derive(Debug, Default)]
struct State {
    queue: VecDeque<Message>,
    next_id: u64,
    acknowledged: Vec<String>,
    closed: bool,
}

impl InMemoryBroker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop the broker. Pending and future pulls fail with
    /// [`BrokerError::Closed`]; so do further publishes.
    pub async fn close(&self) {
        self.inner.state.lock().await.closed = true;
        self.inner.published.notify_waiters();
        self.inner.published.notify_one();
    }

    /// Ack ids acknowledged so far, in acknowledgement order.
    pub async fn acknowledged(&self) -> Vec<String> {
        self.inner.state.lock().await.acknowledged.clone()
    }

    /// Number of published messages not yet pulled.
    pub async fn pending(&self) -> usize {
        self.inner.state.lock().await.queue.len()
    }

    fn ack_id(message_id: &str) -> String {
        format!("ack-{message_id}")
    }
}

#[async_trait]
impl Topic for InMemoryBroker {
    fn name(&self) -> &str {
        NAME
    }

    async fn exists(&self) -> Result<bool, BrokerError> {
        Ok(true)
    }

    async fn publish(&self, payload: Bytes) -> Result<String, BrokerError> {
        let mut state = self.inner.state.lock().await;
        if state.closed {
            return Err(BrokerError::Closed);
        }
        state.next_id += 1;
        let id = state.next_id.to_string();
        state.queue.push_back(Message::new(id.clone(), payload));
        drop(state);

        self.inner.published.notify_one();
        debug!(message_id = %id, "Queued in-memory message");
        Ok(id)
    }
}

#[async_trait]
impl Subscription for InMemoryBroker {
    fn name(&self) -> &str {
        NAME
    }

    async fn exists(&self) -> Result<bool, BrokerError> {
        Ok(true)
    }

    async fn pull(&self, max_messages: u32) -> Result<Vec<Delivery>, BrokerError> {
        let max = usize::try_from(max_messages.max(1)).unwrap_or(usize::MAX);
        loop {
            let published = self.inner.published.notified();
            {
                let mut state = self.inner.state.lock().await;
                if state.closed {
                    return Err(BrokerError::Closed);
                }
                if !state.queue.is_empty() {
                    let take = max.min(state.queue.len());
                    let deliveries = state
                        .queue
                        .drain(..take)
                        .map(|message| Delivery {
                            ack_id: Self::ack_id(message.id()),
                            message: Ok(message),
                        })
                        .collect();
                    return Ok(deliveries);
                }
            }
            published.await;
        }
    }

    async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), BrokerError> {
        self.inner
            .state
            .lock()
            .await
            .acknowledged
            .extend_from_slice(ack_ids);
        Ok(())
    }
}
