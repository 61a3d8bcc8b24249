//! Broker traits over the REST clients.

use super::{BrokerError, Delivery, Subscription, Topic};
use crate::buffer::Message;
use async_trait::async_trait;
use bytes::Bytes;
use pubsub_sdk::client::{PublisherClient, SubscriberClient};
use pubsub_sdk::objects::ReceivedMessage;

#[async_trait]
impl Subscription for SubscriberClient {
    fn name(&self) -> &str {
        self.subscription().as_str()
    }

    async fn exists(&self) -> Result<bool, BrokerError> {
        Ok(SubscriberClient::exists(self).await?)
    }

    async fn pull(&self, max_messages: u32) -> Result<Vec<Delivery>, BrokerError> {
        let received = SubscriberClient::pull(self, max_messages).await?;
        Ok(received.into_iter().map(into_delivery).collect())
    }

    async fn acknowledge(&self, ack_ids: &[String]) -> Result<(), BrokerError> {
        Ok(SubscriberClient::acknowledge(self, ack_ids).await?)
    }
}

#[async_trait]
impl Topic for PublisherClient {
    fn name(&self) -> &str {
        self.topic().as_str()
    }

    async fn exists(&self) -> Result<bool, BrokerError> {
        Ok(PublisherClient::exists(self).await?)
    }

    async fn publish(&self, payload: Bytes) -> Result<String, BrokerError> {
        Ok(PublisherClient::publish(self, &payload).await?)
    }
}

/// Decode a wire message into a [`Delivery`].
fn into_delivery(received: ReceivedMessage) -> Delivery {
    let ReceivedMessage { ack_id, message } = received;
    let message_id = message.message_id.clone().unwrap_or_default();
    let message = match message.payload() {
        Ok(payload) => Ok(Message::new(message_id, payload)),
        Err(source) => Err(BrokerError::Decode { message_id, source }),
    };
    Delivery { ack_id, message }
}
